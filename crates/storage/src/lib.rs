use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::info;

use shared::domain::{RecordId, RecordSummary, UserId, UserSummary};

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created(UserSummary),
    EmailTaken,
}

#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: UserSummary,
    pub password_hash: String,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` opens a fresh database, so the
        // pool must pin a single connection for the schema to stay visible.
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Waits for checked-out connections to return and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("sqlite pool closed");
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE email = ? LIMIT 1")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up user by email")?;
        Ok(row.is_some())
    }

    pub async fn create_user(&self, user: NewUser<'_>) -> Result<CreateUserOutcome> {
        let inserted = sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, first_name, last_name, email, created_at",
        )
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(user.email.trim())
        .bind(user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok(CreateUserOutcome::Created(user_from_row(&row))),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(CreateUserOutcome::EmailTaken)
            }
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<StoredCredentials>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, email, created_at, password_hash
             FROM users WHERE email = ?",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .context("failed to load user credentials")?;

        Ok(row.map(|r| StoredCredentials {
            user: user_from_row(&r),
            password_hash: r.get::<String, _>(5),
        }))
    }

    pub async fn insert_record(&self, name: &str, description: &str) -> Result<RecordSummary> {
        let row = sqlx::query(
            "INSERT INTO records (name, description, created_at) VALUES (?, ?, ?)
             RETURNING id, name, description, created_at",
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("failed to insert record")?;
        Ok(record_from_row(&row))
    }

    pub async fn list_records(&self) -> Result<Vec<RecordSummary>> {
        let rows = sqlx::query("SELECT id, name, description, created_at FROM records ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to list records")?;
        Ok(rows.iter().map(record_from_row).collect())
    }
}

fn user_from_row(r: &SqliteRow) -> UserSummary {
    UserSummary {
        id: UserId(r.get::<i64, _>(0)),
        first_name: r.get::<String, _>(1),
        last_name: r.get::<String, _>(2),
        email: r.get::<String, _>(3),
        created_at: r.get::<DateTime<Utc>, _>(4),
    }
}

fn record_from_row(r: &SqliteRow) -> RecordSummary {
    RecordSummary {
        id: RecordId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        description: r.get::<String, _>(2),
        created_at: r.get::<DateTime<Utc>, _>(3),
    }
}

pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

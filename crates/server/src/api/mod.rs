use std::sync::Arc;

use shared::{
    domain::{ProductInfo, RecordSummary, UserSummary},
    error::{ApiError, ErrorCode},
    protocol::{CreateUserRequest, InsertRecordRequest, SignInRequest},
};
use storage::{CreateUserOutcome, NewUser, Storage};
use tracing::{error, info, warn};

use crate::product_info::{extract_asin, ProductCatalog};

pub const EMAIL_IN_USE: &str = "Email is already in use";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const INSERT_FAILED: &str = "Failed to insert data";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub catalog: Arc<dyn ProductCatalog>,
    pub password_hash_cost: u32,
}

pub async fn check_user(ctx: &ApiContext, email: &str) -> Result<bool, ApiError> {
    ctx.storage.email_exists(email).await.map_err(internal)
}

pub async fn create_user(
    ctx: &ApiContext,
    req: CreateUserRequest,
) -> Result<UserSummary, ApiError> {
    let first_name = req.first_name.trim();
    let last_name = req.last_name.trim();
    let email = req.email.trim();
    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || req.password.is_empty()
    {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "All fields are required",
        ));
    }

    if ctx.storage.email_exists(email).await.map_err(internal)? {
        return Err(ApiError::new(ErrorCode::Conflict, EMAIL_IN_USE));
    }

    let password_hash = hash_password(req.password, ctx.password_hash_cost).await?;
    let outcome = ctx
        .storage
        .create_user(NewUser {
            first_name,
            last_name,
            email,
            password_hash: &password_hash,
        })
        .await
        .map_err(internal)?;

    match outcome {
        CreateUserOutcome::Created(user) => {
            info!(user_id = user.id.0, "user created");
            Ok(user)
        }
        // Lost a race with a concurrent sign-up for the same address.
        CreateUserOutcome::EmailTaken => Err(ApiError::new(ErrorCode::Conflict, EMAIL_IN_USE)),
    }
}

pub async fn sign_in(ctx: &ApiContext, req: SignInRequest) -> Result<UserSummary, ApiError> {
    let unauthorized = || ApiError::new(ErrorCode::Unauthorized, INVALID_CREDENTIALS);

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(unauthorized());
    }

    let Some(stored) = ctx
        .storage
        .find_user_by_email(&req.email)
        .await
        .map_err(internal)?
    else {
        return Err(unauthorized());
    };

    let hash = stored.password_hash;
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(req.password, &hash))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(|e| internal(e.into()))?;

    if verified {
        Ok(stored.user)
    } else {
        Err(unauthorized())
    }
}

pub async fn insert_record(
    ctx: &ApiContext,
    req: InsertRecordRequest,
) -> Result<RecordSummary, ApiError> {
    if req.name.trim().is_empty() || req.description.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "Missing required fields",
        ));
    }
    ctx.storage
        .insert_record(req.name.trim(), req.description.trim())
        .await
        .map_err(|err| {
            error!(error = %err, "record insert failed");
            ApiError::new(ErrorCode::Internal, INSERT_FAILED)
        })
}

pub async fn list_records(ctx: &ApiContext) -> Result<Vec<RecordSummary>, ApiError> {
    ctx.storage.list_records().await.map_err(internal)
}

pub async fn product_info(ctx: &ApiContext, link: &str) -> Result<ProductInfo, ApiError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "Product link is required",
        ));
    }
    let asin = extract_asin(link)
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, "Invalid Amazon link"))?;

    ctx.catalog.lookup(asin).await.map_err(|error| {
        warn!(%asin, %error, "product lookup failed");
        ApiError::new(ErrorCode::Upstream, "Failed to fetch product data")
    })
}

async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(|e| internal(e.into()))
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "request failed");
    ApiError::new(ErrorCode::Internal, INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

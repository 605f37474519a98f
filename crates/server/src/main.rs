use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{ProductInfo, RecordSummary},
    error::{ApiError, ErrorCode},
    protocol::{
        check_user_route, create_user_route, sign_in_route, CheckUserRequest, CheckUserResponse,
        CreateUserRequest, CreateUserResponse, InsertRecordRequest, InsertRecordResponse,
        ProductInfoRequest, SignInRequest, SignInResponse,
    },
};
use storage::Storage;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod product_info;

use api::ApiContext;
use config::{load_settings, prepare_database_url};
use product_info::{CanopyCatalog, MissingProductCatalog, ProductCatalog};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type HttpError<T> = (StatusCode, Json<T>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let catalog: Arc<dyn ProductCatalog> = match settings.canopy_api_key.clone() {
        Some(key) => Arc::new(CanopyCatalog::new(settings.canopy_api_url.clone(), key)),
        None => {
            warn!("CANOPY_API_KEY is not set; product lookups will fail");
            Arc::new(MissingProductCatalog)
        }
    };

    let api = ApiContext {
        storage: storage.clone(),
        catalog,
        password_hash_cost: settings.password_hash_cost,
    };
    let app = build_router(Arc::new(AppState { api }), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.close().await;
    info!("server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(check_user_route(), post(http_check_user))
        .route(create_user_route(), post(http_create_user))
        .route(sign_in_route(), post(http_sign_in))
        .route("/api/insert-data", post(http_insert_record))
        .route("/api/get-data", get(http_list_records))
        .route("/api/product-info", post(http_product_info))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(error) => {
                error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Validation | ErrorCode::Conflict => StatusCode::BAD_REQUEST,
        ErrorCode::Upstream | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ApiError) -> HttpError<ApiError> {
    (status_for(err.code), Json(err))
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, HttpError<ApiError>> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, "storage unavailable")),
        )
    })?;
    Ok("ok")
}

async fn http_check_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckUserRequest>,
) -> Result<Json<CheckUserResponse>, HttpError<ApiError>> {
    let email_exists = api::check_user(&state.api, &req.email)
        .await
        .map_err(api_error)?;
    Ok(Json(CheckUserResponse { email_exists }))
}

async fn http_create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), HttpError<CreateUserResponse>> {
    match api::create_user(&state.api, req).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(CreateUserResponse::created(user)))),
        Err(err) => Err((
            status_for(err.code),
            Json(CreateUserResponse::rejected(err.message)),
        )),
    }
}

async fn http_sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, HttpError<SignInResponse>> {
    match api::sign_in(&state.api, req).await {
        Ok(user) => Ok(Json(SignInResponse {
            success: true,
            error: None,
            user: Some(user),
        })),
        Err(err) => Err((
            status_for(err.code),
            Json(SignInResponse {
                success: false,
                error: Some(err.message),
                user: None,
            }),
        )),
    }
}

async fn http_insert_record(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InsertRecordRequest>,
) -> Result<Json<InsertRecordResponse>, HttpError<ApiError>> {
    let data = api::insert_record(&state.api, req)
        .await
        .map_err(api_error)?;
    Ok(Json(InsertRecordResponse {
        success: true,
        data,
    }))
}

async fn http_list_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecordSummary>>, HttpError<ApiError>> {
    api::list_records(&state.api)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn http_product_info(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProductInfoRequest>,
) -> Result<Json<ProductInfo>, HttpError<ApiError>> {
    api::product_info(&state.api, &req.link)
        .await
        .map(Json)
        .map_err(api_error)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

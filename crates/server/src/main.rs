use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use curation::CurationOptions;
use media::LocalMediaStore;
use server_api::{
    authorize_admin, create_item, delete_item, list_admin_items, list_gallery, list_headers,
    update_item, ApiContext, IdentityConfig, ItemSubmission, SubmittedImage,
};
use shared::{
    domain::{GalleryItem, ItemId},
    error::{ApiError, ErrorCode},
    protocol::{
        admin_items_route, gallery_headers_route, gallery_route, DeleteItemQuery, GalleryQuery,
        HeadersResponse, ItemDeletedResponse, ItemSavedResponse, FIELD_DESCRIPTION, FIELD_HEADER,
        FIELD_IMAGE, FIELD_MAIN_INDEX,
    },
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url};

const ADMIN_ITEM_PATH: &str = "/admin/items/:item_id";
const MEDIA_PATH: &str = "/media";
const ADMIN_TOKEN_TTL_SECONDS: i64 = 12 * 3600;

struct AppState {
    api: ApiContext,
    media_root: PathBuf,
    max_upload_bytes: usize,
}

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let media_root = PathBuf::from(&settings.media_root);
    tokio::fs::create_dir_all(&media_root)
        .await
        .with_context(|| format!("failed to create media root '{}'", media_root.display()))?;
    let media = LocalMediaStore::new(&media_root, &settings.media_public_url)
        .with_context(|| format!("invalid media_public_url '{}'", settings.media_public_url))?;

    let api = ApiContext {
        storage,
        media: Arc::new(media),
        identity: IdentityConfig {
            secret: settings.admin_token_secret,
            issuer: settings.admin_token_issuer,
            ttl_seconds: ADMIN_TOKEN_TTL_SECONDS,
        },
        curation: CurationOptions {
            cleanup_media: settings.media_cleanup,
        },
    };
    let app = build_router(Arc::new(AppState {
        api,
        media_root,
        max_upload_bytes: settings.max_upload_bytes,
    }));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "gallery server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(&state.media_root);
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/healthz", get(healthz))
        .route(gallery_route(), get(http_list_gallery))
        .route(gallery_headers_route(), get(http_list_headers))
        .route(
            admin_items_route(),
            get(http_list_admin_items).post(http_create_item),
        )
        .route(
            ADMIN_ITEM_PATH,
            put(http_update_item).delete(http_delete_item),
        )
        .nest_service(MEDIA_PATH, media)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_list_gallery(
    State(state): State<Arc<AppState>>,
    Query(q): Query<GalleryQuery>,
) -> Result<Json<Vec<GalleryItem>>, HttpError> {
    let items = list_gallery(&state.api, q.header.as_deref())
        .await
        .map_err(failure)?;
    Ok(Json(items))
}

async fn http_list_headers() -> Json<HeadersResponse> {
    Json(list_headers())
}

async fn http_list_admin_items(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<GalleryItem>>, HttpError> {
    let principal = authorize(&state, &headers)?;
    let items = list_admin_items(&state.api, principal)
        .await
        .map_err(failure)?;
    Ok(Json(items))
}

async fn http_create_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ItemSavedResponse>), HttpError> {
    let principal = authorize(&state, &headers)?;
    let submission = read_submission(multipart).await?;
    let item = create_item(&state.api, principal, submission)
        .await
        .map_err(failure)?;
    Ok((StatusCode::CREATED, Json(ItemSavedResponse { item })))
}

async fn http_update_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ItemSavedResponse>, HttpError> {
    let principal = authorize(&state, &headers)?;
    let submission = read_submission(multipart).await?;
    let item = update_item(&state.api, principal, ItemId(item_id), submission)
        .await
        .map_err(failure)?;
    Ok(Json(ItemSavedResponse { item }))
}

async fn http_delete_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
    Query(q): Query<DeleteItemQuery>,
    headers: HeaderMap,
) -> Result<Json<ItemDeletedResponse>, HttpError> {
    let principal = authorize(&state, &headers)?;
    let removed = delete_item(&state.api, principal, ItemId(item_id), q.confirm)
        .await
        .map_err(failure)?;
    Ok(Json(ItemDeletedResponse {
        item_id: removed.id,
    }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<curation::AdminPrincipal, HttpError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    authorize_admin(&state.api, authorization).map_err(failure)
}

/// Image parts keep their multipart order; that order is the staging order.
async fn read_submission(mut multipart: Multipart) -> Result<ItemSubmission, HttpError> {
    let mut submission = ItemSubmission::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_HEADER => {
                submission.header = Some(field.text().await.map_err(multipart_failure)?);
            }
            FIELD_DESCRIPTION => {
                submission.description = field.text().await.map_err(multipart_failure)?;
            }
            FIELD_MAIN_INDEX => {
                let raw = field.text().await.map_err(multipart_failure)?;
                let index = raw.trim().parse::<usize>().map_err(|_| {
                    failure(
                        ApiError::new(
                            ErrorCode::Validation,
                            format!("main_index '{raw}' is not a number"),
                        )
                        .with_field(FIELD_MAIN_INDEX),
                    )
                })?;
                submission.main_index = Some(index);
            }
            FIELD_IMAGE => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|file_name| !file_name.trim().is_empty())
                    .ok_or_else(|| {
                        failure(
                            ApiError::new(ErrorCode::Validation, "image part without a file name")
                                .with_field("images"),
                        )
                    })?;
                let bytes = field.bytes().await.map_err(multipart_failure)?;
                submission.images.push(SubmittedImage {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!(field = %other, "ignoring unknown multipart field"),
        }
    }
    Ok(submission)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Upload => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: ApiError) -> HttpError {
    (status_for(err.code), Json(err))
}

fn multipart_failure(err: MultipartError) -> HttpError {
    (
        err.status(),
        Json(ApiError::new(ErrorCode::Validation, err.body_text())),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

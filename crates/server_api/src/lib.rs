use std::{str::FromStr, sync::Arc};

use curation::{
    AdminPrincipal, CurationController, CurationError, CurationOptions, GalleryStore, StoreError,
};
use media::{MediaStore, UploadError};
use shared::{
    domain::{GalleryItem, ItemId, ServiceHeader},
    error::{ApiError, ErrorCode},
    protocol::{HeadersResponse, FIELD_HEADER, FIELD_MAIN_INDEX},
};
use storage::Storage;
use tracing::warn;

pub mod identity;

pub use identity::{mint_admin_token, verify_admin, AuthError, IdentityConfig};

type Controller = CurationController<Storage, Arc<dyn MediaStore>>;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub media: Arc<dyn MediaStore>,
    pub identity: IdentityConfig,
    pub curation: CurationOptions,
}

#[derive(Debug, Clone)]
pub struct SubmittedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One admin form post, as decoded from the multipart body.
#[derive(Debug, Clone, Default)]
pub struct ItemSubmission {
    pub header: Option<String>,
    pub description: String,
    /// Index into `images` of the image flagged main.
    pub main_index: Option<usize>,
    pub images: Vec<SubmittedImage>,
}

pub async fn list_gallery(
    ctx: &ApiContext,
    header: Option<&str>,
) -> Result<Vec<GalleryItem>, ApiError> {
    let header = header
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(parse_header)
        .transpose()?;
    ctx.storage
        .list_items(header)
        .await
        .map_err(store_error)
}

pub fn list_headers() -> HeadersResponse {
    HeadersResponse {
        headers: ServiceHeader::ALL.to_vec(),
    }
}

pub fn authorize_admin(
    ctx: &ApiContext,
    authorization: Option<&str>,
) -> Result<AdminPrincipal, ApiError> {
    verify_admin(&ctx.identity, authorization).map_err(|err| match err {
        AuthError::NotAdmin(_) => ApiError::new(ErrorCode::Forbidden, err.to_string()),
        AuthError::Missing | AuthError::Invalid(_) => {
            ApiError::new(ErrorCode::Unauthorized, err.to_string())
        }
    })
}

pub async fn list_admin_items(
    ctx: &ApiContext,
    principal: AdminPrincipal,
) -> Result<Vec<GalleryItem>, ApiError> {
    let mut controller = controller(ctx, principal);
    let items = controller.refresh().await.map_err(curation_error)?;
    Ok(items.to_vec())
}

pub async fn create_item(
    ctx: &ApiContext,
    principal: AdminPrincipal,
    submission: ItemSubmission,
) -> Result<GalleryItem, ApiError> {
    let mut controller = controller(ctx, principal);
    controller.begin_new().map_err(curation_error)?;
    author(&mut controller, submission)?;
    controller.submit().await.map_err(curation_error)
}

pub async fn update_item(
    ctx: &ApiContext,
    principal: AdminPrincipal,
    item_id: ItemId,
    submission: ItemSubmission,
) -> Result<GalleryItem, ApiError> {
    let item = ctx
        .storage
        .get_item(item_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| store_error(StoreError::NotFound(item_id)))?;

    let mut controller = controller(ctx, principal);
    controller.begin_edit(&item).map_err(curation_error)?;
    author(&mut controller, submission)?;
    controller.submit().await.map_err(curation_error)
}

/// Deletes only when `confirmed`; otherwise nothing is touched.
pub async fn delete_item(
    ctx: &ApiContext,
    principal: AdminPrincipal,
    item_id: ItemId,
    confirmed: bool,
) -> Result<GalleryItem, ApiError> {
    let mut controller = controller(ctx, principal);
    controller.request_delete(item_id).map_err(curation_error)?;
    if !confirmed {
        controller.cancel().map_err(curation_error)?;
        return Err(curation_error(CurationError::ConfirmationRequired(item_id)));
    }
    controller.confirm_delete().await.map_err(curation_error)
}

fn controller(ctx: &ApiContext, principal: AdminPrincipal) -> Controller {
    CurationController::with_options(
        ctx.storage.clone(),
        ctx.media.clone(),
        principal,
        ctx.curation,
    )
}

fn author(controller: &mut Controller, submission: ItemSubmission) -> Result<(), ApiError> {
    if let Some(label) = submission.header.as_deref().map(str::trim) {
        if !label.is_empty() {
            controller
                .set_header(parse_header(label)?)
                .map_err(curation_error)?;
        }
    }
    controller
        .set_description(submission.description)
        .map_err(curation_error)?;

    let staged = submission.images.len();
    for image in submission.images {
        controller
            .stage_image(image.file_name, image.bytes)
            .map_err(curation_error)?;
    }

    if let Some(index) = submission.main_index {
        if index >= staged {
            return Err(ApiError::new(
                ErrorCode::Validation,
                format!("main image index {index} is out of range"),
            )
            .with_field(FIELD_MAIN_INDEX));
        }
        controller.toggle_main(index).map_err(curation_error)?;
    }
    Ok(())
}

fn parse_header(label: &str) -> Result<ServiceHeader, ApiError> {
    ServiceHeader::from_str(label)
        .map_err(|err| ApiError::new(ErrorCode::Validation, err.to_string()).with_field(FIELD_HEADER))
}

pub fn curation_error(err: CurationError) -> ApiError {
    match err {
        CurationError::Validation(err) => {
            ApiError::new(ErrorCode::Validation, err.message).with_field(err.field.as_str())
        }
        CurationError::Upload(err) => upload_error(err),
        CurationError::Store(err) => store_error(err),
        CurationError::ConfirmationRequired(item_id) => ApiError::new(
            ErrorCode::Validation,
            format!("deleting gallery item {item_id} requires confirm=true"),
        ),
        CurationError::InvalidTransition { .. } => {
            ApiError::new(ErrorCode::Internal, err.to_string())
        }
    }
}

fn upload_error(err: UploadError) -> ApiError {
    ApiError::new(ErrorCode::Upload, err.to_string())
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
        StoreError::MalformedRow { .. } | StoreError::Backend(_) => {
            warn!(error = %err, "gallery store failure");
            internal(err)
        }
    }
}

fn internal(err: impl std::fmt::Display) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

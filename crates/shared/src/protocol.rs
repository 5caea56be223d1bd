use serde::{Deserialize, Serialize};

use crate::domain::{GalleryItem, ItemId, ServiceHeader};

pub const FIELD_HEADER: &str = "header";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_MAIN_INDEX: &str = "main_index";
pub const FIELD_IMAGE: &str = "image";

pub fn gallery_route() -> &'static str {
    "/gallery"
}

pub fn gallery_headers_route() -> &'static str {
    "/gallery/headers"
}

pub fn admin_items_route() -> &'static str {
    "/admin/items"
}

pub fn admin_item_route(item_id: ItemId) -> String {
    format!("/admin/items/{}", item_id.0)
}

/// Public listing query. The header stays a raw label here so that an
/// unknown label is reported as a validation error rather than a
/// query-decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadersResponse {
    pub headers: Vec<ServiceHeader>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSavedResponse {
    pub item: GalleryItem,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteItemQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDeletedResponse {
    pub item_id: ItemId,
}

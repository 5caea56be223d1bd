use async_trait::async_trait;
use shared::domain::{GalleryImage, GalleryItem, ItemFields, ItemId, ServiceHeader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("gallery item {0} not found")]
    NotFound(ItemId),
    #[error("malformed {table} row {id}: {reason}")]
    MalformedRow {
        table: &'static str,
        id: i64,
        reason: String,
    },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result of a committed edit.
#[derive(Debug, Clone)]
pub struct EditCommit {
    pub item: GalleryItem,
    /// Media URLs the item referenced before the edit and no longer does.
    pub superseded_urls: Vec<String>,
}

/// Persistent store of gallery items and their secondary images.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn create_item(
        &self,
        header: ServiceHeader,
        description: &str,
        main_image_url: &str,
    ) -> Result<GalleryItem, StoreError>;

    async fn update_item(
        &self,
        item_id: ItemId,
        fields: &ItemFields,
    ) -> Result<GalleryItem, StoreError>;

    /// Removes the item and every secondary image row it owns, returning
    /// what was removed.
    async fn delete_item(&self, item_id: ItemId) -> Result<GalleryItem, StoreError>;

    async fn get_item(&self, item_id: ItemId) -> Result<Option<GalleryItem>, StoreError>;

    /// Newest first, optionally restricted to one header.
    async fn list_items(
        &self,
        header: Option<ServiceHeader>,
    ) -> Result<Vec<GalleryItem>, StoreError>;

    /// Full replace: existing rows are deleted, then `image_urls` are
    /// inserted with `display_order` = position (1-based).
    async fn replace_images(
        &self,
        item_id: ItemId,
        image_urls: &[String],
    ) -> Result<Vec<GalleryImage>, StoreError>;

    /// Creates the item and its secondary images atomically.
    async fn commit_new_item(
        &self,
        fields: &ItemFields,
        secondary_urls: &[String],
    ) -> Result<GalleryItem, StoreError>;

    /// Updates the item and fully replaces its secondary images atomically.
    async fn commit_item_edit(
        &self,
        item_id: ItemId,
        fields: &ItemFields,
        secondary_urls: &[String],
    ) -> Result<EditCommit, StoreError>;
}

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{GalleryItem, ItemId, ServiceHeader};
use tracing::warn;

use crate::{carousel::CarouselState, lightbox::Lightbox};

/// Where the public gallery listing comes from.
#[async_trait]
pub trait GallerySource: Send + Sync {
    async fn fetch_gallery(&self, header: Option<ServiceHeader>) -> Result<Vec<GalleryItem>>;
}

/// Public gallery page state: the listing, its filter, one carousel
/// position per item and the lightbox.
#[derive(Debug, Default)]
pub struct GalleryView {
    items: Vec<GalleryItem>,
    filter: Option<ServiceHeader>,
    carousel: CarouselState,
    lightbox: Lightbox,
    last_error: Option<String>,
}

impl GalleryView {
    pub fn new(filter: Option<ServiceHeader>) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn filter(&self) -> Option<ServiceHeader> {
        self.filter
    }

    /// Takes effect on the next refresh.
    pub fn set_filter(&mut self, filter: Option<ServiceHeader>) {
        self.filter = filter;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replaces the listing and resets every carousel. A failed fetch keeps
    /// the previous listing on screen.
    pub async fn refresh<S>(&mut self, source: &S) -> Result<&[GalleryItem]>
    where
        S: GallerySource + ?Sized,
    {
        match source.fetch_gallery(self.filter).await {
            Ok(items) => {
                self.items = items;
                self.carousel.reset();
                self.last_error = None;
                Ok(&self.items)
            }
            Err(error) => {
                warn!(%error, filter = ?self.filter, "gallery fetch failed; showing previous listing");
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    pub fn carousel(&self) -> &CarouselState {
        &self.carousel
    }

    pub fn carousel_next(&mut self, item_id: ItemId) -> Option<usize> {
        let len = self.item(item_id)?.sequence_len();
        Some(self.carousel.next(item_id, len))
    }

    pub fn carousel_previous(&mut self, item_id: ItemId) -> Option<usize> {
        let len = self.item(item_id)?.sequence_len();
        Some(self.carousel.previous(item_id, len))
    }

    /// Image currently shown by the item's carousel.
    pub fn current_image(&self, item_id: ItemId) -> Option<String> {
        let item = self.item(item_id)?;
        item.image_sequence()
            .into_iter()
            .nth(self.carousel.index(item_id))
    }

    /// Opens the item's full sequence at `start_index`, the position of the
    /// image that was clicked. Carousel state is neither read nor written.
    pub fn open_lightbox(&mut self, item_id: ItemId, start_index: usize) -> bool {
        let Some(item) = self.item(item_id) else {
            return false;
        };
        self.lightbox.open(item.image_sequence(), start_index)
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn lightbox_mut(&mut self) -> &mut Lightbox {
        &mut self.lightbox
    }

    fn item(&self, item_id: ItemId) -> Option<&GalleryItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;

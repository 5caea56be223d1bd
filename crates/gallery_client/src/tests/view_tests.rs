use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use chrono::Utc;
use shared::domain::{GalleryImage, ImageId};

use super::*;

fn item(id: i64, header: ServiceHeader, secondary: usize) -> GalleryItem {
    let now = Utc::now();
    GalleryItem {
        id: ItemId(id),
        header,
        description: format!("item {id}"),
        main_image_url: format!("https://cdn/{id}/main.jpg"),
        images: (1..=secondary)
            .map(|order| GalleryImage {
                id: ImageId(id * 100 + order as i64),
                gallery_item_id: ItemId(id),
                image_url: format!("https://cdn/{id}/{order}.jpg"),
                display_order: order as i64,
            })
            .collect(),
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct StubSource {
    items: Vec<GalleryItem>,
    failing: AtomicBool,
    requested: Mutex<Vec<Option<ServiceHeader>>>,
}

#[async_trait]
impl GallerySource for StubSource {
    async fn fetch_gallery(&self, header: Option<ServiceHeader>) -> Result<Vec<GalleryItem>> {
        self.requested.lock().expect("lock").push(header);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("gallery unavailable");
        }
        Ok(self
            .items
            .iter()
            .filter(|item| header.map_or(true, |header| item.header == header))
            .cloned()
            .collect())
    }
}

fn source() -> StubSource {
    StubSource {
        items: vec![
            item(1, ServiceHeader::Hairstyle, 3),
            item(2, ServiceHeader::WeddingMakeup, 0),
        ],
        ..StubSource::default()
    }
}

#[tokio::test]
async fn refresh_applies_filter() {
    let source = source();
    let mut view = GalleryView::new(Some(ServiceHeader::Hairstyle));

    let items = view.refresh(&source).await.expect("refresh");

    assert_eq!(items.len(), 1);
    assert_eq!(
        source.requested.lock().expect("lock").as_slice(),
        &[Some(ServiceHeader::Hairstyle)]
    );
}

#[tokio::test]
async fn four_image_item_cycles_back_to_start() {
    let source = source();
    let mut view = GalleryView::new(None);
    view.refresh(&source).await.expect("refresh");

    let positions: Vec<Option<usize>> = (0..4).map(|_| view.carousel_next(ItemId(1))).collect();

    assert_eq!(positions, vec![Some(1), Some(2), Some(3), Some(0)]);
    assert_eq!(
        view.current_image(ItemId(1)).as_deref(),
        Some("https://cdn/1/main.jpg")
    );
}

#[tokio::test]
async fn refresh_resets_carousels() {
    let source = source();
    let mut view = GalleryView::new(None);
    view.refresh(&source).await.expect("refresh");
    view.carousel_next(ItemId(1));

    view.refresh(&source).await.expect("refresh again");

    assert_eq!(view.carousel().index(ItemId(1)), 0);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_listing() {
    let source = source();
    let mut view = GalleryView::new(None);
    view.refresh(&source).await.expect("refresh");
    view.carousel_next(ItemId(1));

    source.failing.store(true, Ordering::SeqCst);
    assert!(view.refresh(&source).await.is_err());

    assert_eq!(view.items().len(), 2);
    assert_eq!(view.carousel().index(ItemId(1)), 1);
    assert!(view.last_error().is_some());
}

#[tokio::test]
async fn lightbox_start_ignores_carousel_position() {
    let source = source();
    let mut view = GalleryView::new(None);
    view.refresh(&source).await.expect("refresh");

    assert!(view.open_lightbox(ItemId(1), 0));
    assert_eq!(view.lightbox().current_index(), 0);
    view.lightbox_mut().close();

    view.carousel_next(ItemId(1));
    assert!(view.open_lightbox(ItemId(1), 0));
    assert_eq!(view.lightbox().current_index(), 0);
    assert_eq!(view.lightbox().current_image(), Some("https://cdn/1/main.jpg"));
}

#[tokio::test]
async fn lightbox_navigation_leaves_carousel_alone() {
    let source = source();
    let mut view = GalleryView::new(None);
    view.refresh(&source).await.expect("refresh");
    view.carousel_next(ItemId(1));

    assert!(view.open_lightbox(ItemId(1), 3));
    assert_eq!(view.lightbox().images().len(), 4);
    assert_eq!(view.lightbox().current_index(), 3);

    view.lightbox_mut().next();
    view.lightbox_mut().next();
    assert_eq!(view.lightbox().current_index(), 1);
    assert_eq!(view.carousel().index(ItemId(1)), 1);
}

#[tokio::test]
async fn unknown_items_are_ignored() {
    let source = source();
    let mut view = GalleryView::new(None);
    view.refresh(&source).await.expect("refresh");

    assert_eq!(view.carousel_next(ItemId(42)), None);
    assert!(!view.open_lightbox(ItemId(42), 0));
    assert!(!view.lightbox().is_open());
}

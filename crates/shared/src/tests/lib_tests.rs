use chrono::Utc;

use crate::{
    domain::{GalleryImage, GalleryItem, ImageId, ItemId, ServiceHeader},
    error::{ApiError, ApiException, ErrorCode},
};

fn item_with_images(images: Vec<GalleryImage>) -> GalleryItem {
    let now = Utc::now();
    GalleryItem {
        id: ItemId(1),
        header: ServiceHeader::WeddingMakeup,
        description: "Bridal look".into(),
        main_image_url: "https://cdn.test/main.jpg".into(),
        images,
        created_at: now,
        updated_at: now,
    }
}

fn image(id: i64, url: &str, display_order: i64) -> GalleryImage {
    GalleryImage {
        id: ImageId(id),
        gallery_item_id: ItemId(1),
        image_url: url.into(),
        display_order,
    }
}

#[test]
fn header_labels_parse_exactly() {
    for header in ServiceHeader::ALL {
        assert_eq!(header.label().parse::<ServiceHeader>(), Ok(header));
    }
    assert!("hairstyle".parse::<ServiceHeader>().is_err());
    assert!("Hair".parse::<ServiceHeader>().is_err());
}

#[test]
fn header_serializes_as_label() {
    let json = serde_json::to_string(&ServiceHeader::SareePrePleating).expect("json");
    assert_eq!(json, "\"Saree Pre-Pleating\"");
    let parsed: ServiceHeader = serde_json::from_str("\"Baby Shower Makeup\"").expect("parse");
    assert_eq!(parsed, ServiceHeader::BabyShowerMakeup);
}

#[test]
fn image_sequence_puts_main_first_then_display_order() {
    let item = item_with_images(vec![
        image(7, "https://cdn.test/c.jpg", 5),
        image(3, "https://cdn.test/a.jpg", 1),
        image(9, "https://cdn.test/b.jpg", 2),
    ]);

    assert_eq!(
        item.image_sequence(),
        vec![
            "https://cdn.test/main.jpg",
            "https://cdn.test/a.jpg",
            "https://cdn.test/b.jpg",
            "https://cdn.test/c.jpg",
        ]
    );
    assert_eq!(item.sequence_len(), 4);
}

#[test]
fn item_without_secondary_images_has_single_entry_sequence() {
    let item = item_with_images(Vec::new());
    assert_eq!(item.image_sequence(), vec!["https://cdn.test/main.jpg"]);
}

#[test]
fn api_error_omits_absent_field() {
    let plain = serde_json::to_value(ApiError::new(ErrorCode::NotFound, "gone")).expect("json");
    assert!(plain.get("field").is_none());
    assert_eq!(plain["code"], "not_found");

    let with_field = serde_json::to_value(
        ApiError::new(ErrorCode::Validation, "description is required").with_field("description"),
    )
    .expect("json");
    assert_eq!(with_field["field"], "description");
}

#[test]
fn api_exception_keeps_validation_field() {
    let wire = ApiError::new(ErrorCode::Validation, "description is required")
        .with_field("description");

    let exception = ApiException::from(wire);
    assert_eq!(exception.field.as_deref(), Some("description"));

    let back = ApiError::from(exception);
    assert_eq!(back.code, ErrorCode::Validation);
    assert_eq!(back.field.as_deref(), Some("description"));
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ItemId);
id_newtype!(ImageId);

/// Service categories a gallery item can be filed under.
///
/// The display label is also the wire and storage representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceHeader {
    #[serde(rename = "Wedding Makeup")]
    WeddingMakeup,
    #[serde(rename = "Reception Makeup")]
    ReceptionMakeup,
    #[serde(rename = "Baby Shower Makeup")]
    BabyShowerMakeup,
    #[serde(rename = "Engagement Makeup")]
    EngagementMakeup,
    #[serde(rename = "Guest Makeup")]
    GuestMakeup,
    #[serde(rename = "Saree Draping")]
    SareeDraping,
    #[serde(rename = "Saree Pre-Pleating")]
    SareePrePleating,
    #[serde(rename = "Hairstyle")]
    Hairstyle,
    #[serde(rename = "Certificates")]
    Certificates,
}

impl ServiceHeader {
    pub const ALL: [ServiceHeader; 9] = [
        ServiceHeader::WeddingMakeup,
        ServiceHeader::ReceptionMakeup,
        ServiceHeader::BabyShowerMakeup,
        ServiceHeader::EngagementMakeup,
        ServiceHeader::GuestMakeup,
        ServiceHeader::SareeDraping,
        ServiceHeader::SareePrePleating,
        ServiceHeader::Hairstyle,
        ServiceHeader::Certificates,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceHeader::WeddingMakeup => "Wedding Makeup",
            ServiceHeader::ReceptionMakeup => "Reception Makeup",
            ServiceHeader::BabyShowerMakeup => "Baby Shower Makeup",
            ServiceHeader::EngagementMakeup => "Engagement Makeup",
            ServiceHeader::GuestMakeup => "Guest Makeup",
            ServiceHeader::SareeDraping => "Saree Draping",
            ServiceHeader::SareePrePleating => "Saree Pre-Pleating",
            ServiceHeader::Hairstyle => "Hairstyle",
            ServiceHeader::Certificates => "Certificates",
        }
    }
}

impl fmt::Display for ServiceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service header '{0}'")]
pub struct UnknownHeader(pub String);

impl FromStr for ServiceHeader {
    type Err = UnknownHeader;

    /// Exact label match only; no case folding or partial matches.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceHeader::ALL
            .into_iter()
            .find(|header| header.label() == s)
            .ok_or_else(|| UnknownHeader(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: ImageId,
    pub gallery_item_id: ItemId,
    pub image_url: String,
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: ItemId,
    pub header: ServiceHeader,
    pub description: String,
    pub main_image_url: String,
    /// Secondary images, sorted by `display_order` ascending.
    #[serde(default)]
    pub images: Vec<GalleryImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GalleryItem {
    /// Main image first, then the secondary images in display order.
    pub fn image_sequence(&self) -> Vec<String> {
        let mut secondary: Vec<&GalleryImage> = self.images.iter().collect();
        secondary.sort_by_key(|image| image.display_order);

        let mut sequence = Vec::with_capacity(secondary.len() + 1);
        sequence.push(self.main_image_url.clone());
        sequence.extend(secondary.into_iter().map(|image| image.image_url.clone()));
        sequence
    }

    pub fn sequence_len(&self) -> usize {
        self.images.len() + 1
    }
}

/// Editable fields of an item; the image set is handled separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub header: ServiceHeader,
    pub description: String,
    pub main_image_url: String,
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{GalleryItem, ItemId, ServiceHeader},
    error::{ApiError, ApiException},
    protocol::{
        admin_item_route, admin_items_route, gallery_headers_route, gallery_route,
        HeadersResponse, ItemDeletedResponse, ItemSavedResponse, FIELD_DESCRIPTION, FIELD_HEADER,
        FIELD_IMAGE, FIELD_MAIN_INDEX,
    },
};
use tracing::info;

pub mod carousel;
pub mod lightbox;
pub mod view;

pub use carousel::CarouselState;
pub use lightbox::Lightbox;
pub use view::{GallerySource, GalleryView};

#[derive(Debug, Clone)]
pub struct FormImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Admin form contents. Images are sent in staging order.
#[derive(Debug, Clone)]
pub struct ItemForm {
    pub header: ServiceHeader,
    pub description: String,
    pub main_index: Option<usize>,
    pub images: Vec<FormImage>,
}

impl ItemForm {
    fn into_multipart(self) -> Form {
        let mut form = Form::new()
            .text(FIELD_HEADER, self.header.label())
            .text(FIELD_DESCRIPTION, self.description);
        if let Some(index) = self.main_index {
            form = form.text(FIELD_MAIN_INDEX, index.to_string());
        }
        for image in self.images {
            form = form.part(FIELD_IMAGE, Part::bytes(image.bytes).file_name(image.file_name));
        }
        form
    }
}

/// HTTP client for the gallery server.
#[derive(Clone)]
pub struct GalleryClient {
    http: Client,
    server_url: String,
    admin_token: Option<String>,
}

impl GalleryClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    pub async fn list_gallery(&self, header: Option<ServiceHeader>) -> Result<Vec<GalleryItem>> {
        let mut request = self
            .http
            .get(format!("{}{}", self.server_url, gallery_route()));
        if let Some(header) = header {
            request = request.query(&[("header", header.label())]);
        }
        read_json(request.send().await?).await
    }

    pub async fn list_headers(&self) -> Result<Vec<ServiceHeader>> {
        let response: HeadersResponse = read_json(
            self.http
                .get(format!("{}{}", self.server_url, gallery_headers_route()))
                .send()
                .await?,
        )
        .await?;
        Ok(response.headers)
    }

    pub async fn list_admin_items(&self) -> Result<Vec<GalleryItem>> {
        let request = self
            .http
            .get(format!("{}{}", self.server_url, admin_items_route()));
        read_json(self.authorized(request)?.send().await?).await
    }

    pub async fn create_item(&self, form: ItemForm) -> Result<GalleryItem> {
        let request = self
            .http
            .post(format!("{}{}", self.server_url, admin_items_route()))
            .multipart(form.into_multipart());
        let saved: ItemSavedResponse = read_json(self.authorized(request)?.send().await?).await?;
        info!(item_id = %saved.item.id, "gallery item created");
        Ok(saved.item)
    }

    pub async fn update_item(&self, item_id: ItemId, form: ItemForm) -> Result<GalleryItem> {
        let request = self
            .http
            .put(format!("{}{}", self.server_url, admin_item_route(item_id)))
            .multipart(form.into_multipart());
        let saved: ItemSavedResponse = read_json(self.authorized(request)?.send().await?).await?;
        Ok(saved.item)
    }

    /// Sends the confirmed delete. Asking the user is the caller's job.
    pub async fn delete_item(&self, item_id: ItemId) -> Result<ItemId> {
        let request = self
            .http
            .delete(format!("{}{}", self.server_url, admin_item_route(item_id)))
            .query(&[("confirm", "true")]);
        let deleted: ItemDeletedResponse =
            read_json(self.authorized(request)?.send().await?).await?;
        Ok(deleted.item_id)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .admin_token
            .as_deref()
            .context("admin token is required for this request")?;
        Ok(request.bearer_auth(token))
    }
}

#[async_trait]
impl GallerySource for GalleryClient {
    async fn fetch_gallery(&self, header: Option<ServiceHeader>) -> Result<Vec<GalleryItem>> {
        self.list_gallery(header).await
    }
}

/// Server errors carry an `ApiError` body; surface it instead of a bare
/// status line when present.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.bytes().await?;
    match serde_json::from_slice::<ApiError>(&body) {
        Ok(error) => Err(ApiException::from(error))
            .with_context(|| format!("gallery server returned {status}")),
        Err(_) => anyhow::bail!(
            "gallery server returned {status}: {}",
            String::from_utf8_lossy(&body)
        ),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

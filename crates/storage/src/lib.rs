use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use curation::{EditCommit, GalleryStore, StoreError};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, SqliteConnection,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{GalleryImage, GalleryItem, ImageId, ItemFields, ItemId, ServiceHeader};

const ITEM_COLUMNS: &str =
    "i.id, i.header, i.description, i.image_url, i.created_at, i.updated_at";
const IMAGE_COLUMNS: &str = "g.id, g.gallery_item_id, g.image_url, g.display_order";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn malformed(table: &'static str, id: i64, reason: impl Into<String>) -> StoreError {
    StoreError::MalformedRow {
        table,
        id,
        reason: reason.into(),
    }
}

fn decode_timestamp(
    row: &SqliteRow,
    column: &str,
    table: &'static str,
    id: i64,
) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = row
        .try_get(column)
        .map_err(|err| malformed(table, id, format!("{column}: {err}")))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| malformed(table, id, format!("{column} '{raw}': {err}")))
}

/// Decodes the item columns of `row`. Secondary images are attached by the
/// caller.
fn decode_item_row(row: &SqliteRow) -> Result<GalleryItem, StoreError> {
    const TABLE: &str = "gallery_items";
    let id: i64 = row
        .try_get(0)
        .context("gallery item row without id")?;

    let header: String = row
        .try_get(1)
        .map_err(|err| malformed(TABLE, id, format!("header: {err}")))?;
    let header = ServiceHeader::from_str(&header).map_err(|err| malformed(TABLE, id, err.to_string()))?;

    let description: String = row
        .try_get(2)
        .map_err(|err| malformed(TABLE, id, format!("description: {err}")))?;
    if description.trim().is_empty() {
        return Err(malformed(TABLE, id, "empty description"));
    }

    let main_image_url: String = row
        .try_get(3)
        .map_err(|err| malformed(TABLE, id, format!("image_url: {err}")))?;
    if main_image_url.is_empty() {
        return Err(malformed(TABLE, id, "empty image_url"));
    }

    Ok(GalleryItem {
        id: ItemId(id),
        header,
        description,
        main_image_url,
        images: Vec::new(),
        created_at: decode_timestamp(row, "created_at", TABLE, id)?,
        updated_at: decode_timestamp(row, "updated_at", TABLE, id)?,
    })
}

/// Decodes image columns starting at `offset`. `None` for the NULL side of a
/// LEFT JOIN.
fn decode_image_row(row: &SqliteRow, offset: usize) -> Result<Option<GalleryImage>, StoreError> {
    const TABLE: &str = "gallery_images";
    let id: Option<i64> = row
        .try_get(offset)
        .context("gallery image row without id")?;
    let Some(id) = id else {
        return Ok(None);
    };

    let gallery_item_id: i64 = row
        .try_get(offset + 1)
        .map_err(|err| malformed(TABLE, id, format!("gallery_item_id: {err}")))?;
    let image_url: String = row
        .try_get(offset + 2)
        .map_err(|err| malformed(TABLE, id, format!("image_url: {err}")))?;
    if image_url.is_empty() {
        return Err(malformed(TABLE, id, "empty image_url"));
    }
    let display_order: i64 = row
        .try_get(offset + 3)
        .map_err(|err| malformed(TABLE, id, format!("display_order: {err}")))?;
    if display_order < 1 {
        return Err(malformed(
            TABLE,
            id,
            format!("display_order {display_order} is not positive"),
        ));
    }

    Ok(Some(GalleryImage {
        id: ImageId(id),
        gallery_item_id: ItemId(gallery_item_id),
        image_url,
        display_order,
    }))
}

/// Folds joined rows (ordered by item, then display order) into items.
fn collect_items(rows: &[SqliteRow]) -> Result<Vec<GalleryItem>, StoreError> {
    let mut items: Vec<GalleryItem> = Vec::new();
    for row in rows {
        let item_id: i64 = row.try_get(0).context("gallery item row without id")?;
        let same_item = items.last().is_some_and(|item| item.id.0 == item_id);
        if !same_item {
            items.push(decode_item_row(row)?);
        }
        if let (Some(image), Some(item)) = (decode_image_row(row, 6)?, items.last_mut()) {
            item.images.push(image);
        }
    }
    Ok(items)
}

async fn load_item(
    conn: &mut SqliteConnection,
    item_id: ItemId,
) -> Result<Option<GalleryItem>, StoreError> {
    let rows = sqlx::query(&format!(
        "SELECT {ITEM_COLUMNS}, {IMAGE_COLUMNS}
         FROM gallery_items i
         LEFT JOIN gallery_images g ON g.gallery_item_id = i.id
         WHERE i.id = ?
         ORDER BY g.display_order ASC"
    ))
    .bind(item_id.0)
    .fetch_all(&mut *conn)
    .await
    .context("failed to load gallery item")?;

    Ok(collect_items(&rows)?.into_iter().next())
}

async fn insert_item(
    conn: &mut SqliteConnection,
    fields: &ItemFields,
    now: DateTime<Utc>,
) -> Result<ItemId, StoreError> {
    let stamp = encode_timestamp(now);
    let row = sqlx::query(
        "INSERT INTO gallery_items (header, description, image_url, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(fields.header.label())
    .bind(&fields.description)
    .bind(&fields.main_image_url)
    .bind(&stamp)
    .bind(&stamp)
    .fetch_one(&mut *conn)
    .await
    .context("failed to insert gallery item")?;
    Ok(ItemId(row.get::<i64, _>(0)))
}

async fn write_fields(
    conn: &mut SqliteConnection,
    item_id: ItemId,
    fields: &ItemFields,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE gallery_items
         SET header = ?, description = ?, image_url = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(fields.header.label())
    .bind(&fields.description)
    .bind(&fields.main_image_url)
    .bind(encode_timestamp(Utc::now()))
    .bind(item_id.0)
    .execute(&mut *conn)
    .await
    .context("failed to update gallery item")?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(item_id));
    }
    Ok(())
}

/// Full replace: every existing image row of the item is dropped first.
async fn write_images(
    conn: &mut SqliteConnection,
    item_id: ItemId,
    image_urls: &[String],
) -> Result<Vec<GalleryImage>, StoreError> {
    sqlx::query("DELETE FROM gallery_images WHERE gallery_item_id = ?")
        .bind(item_id.0)
        .execute(&mut *conn)
        .await
        .context("failed to clear gallery images")?;

    let mut images = Vec::with_capacity(image_urls.len());
    for (position, image_url) in image_urls.iter().enumerate() {
        let display_order = position as i64 + 1;
        let row = sqlx::query(
            "INSERT INTO gallery_images (gallery_item_id, image_url, display_order)
             VALUES (?, ?, ?)
             RETURNING id",
        )
        .bind(item_id.0)
        .bind(image_url)
        .bind(display_order)
        .fetch_one(&mut *conn)
        .await
        .context("failed to insert gallery image")?;

        images.push(GalleryImage {
            id: ImageId(row.get::<i64, _>(0)),
            gallery_item_id: item_id,
            image_url: image_url.clone(),
            display_order,
        });
    }
    Ok(images)
}

async fn item_exists(conn: &mut SqliteConnection, item_id: ItemId) -> Result<bool, StoreError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM gallery_items WHERE id = ?")
        .bind(item_id.0)
        .fetch_optional(&mut *conn)
        .await
        .context("failed to look up gallery item")?;
    Ok(found.is_some())
}

async fn reload(conn: &mut SqliteConnection, item_id: ItemId) -> Result<GalleryItem, StoreError> {
    load_item(conn, item_id)
        .await?
        .ok_or(StoreError::NotFound(item_id))
}

#[async_trait]
impl GalleryStore for Storage {
    async fn create_item(
        &self,
        header: ServiceHeader,
        description: &str,
        main_image_url: &str,
    ) -> Result<GalleryItem, StoreError> {
        let fields = ItemFields {
            header,
            description: description.to_string(),
            main_image_url: main_image_url.to_string(),
        };
        let mut conn = self.pool.acquire().await.context("sqlite acquire failed")?;
        let item_id = insert_item(&mut conn, &fields, Utc::now()).await?;
        reload(&mut conn, item_id).await
    }

    async fn update_item(
        &self,
        item_id: ItemId,
        fields: &ItemFields,
    ) -> Result<GalleryItem, StoreError> {
        let mut conn = self.pool.acquire().await.context("sqlite acquire failed")?;
        write_fields(&mut conn, item_id, fields).await?;
        reload(&mut conn, item_id).await
    }

    async fn delete_item(&self, item_id: ItemId) -> Result<GalleryItem, StoreError> {
        let mut tx = self.pool.begin().await.context("sqlite begin failed")?;
        let Some(item) = load_item(&mut tx, item_id).await? else {
            return Err(StoreError::NotFound(item_id));
        };

        sqlx::query("DELETE FROM gallery_items WHERE id = ?")
            .bind(item_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to delete gallery item")?;
        tx.commit().await.context("sqlite commit failed")?;

        debug!(%item_id, images = item.images.len(), "deleted gallery item");
        Ok(item)
    }

    async fn get_item(&self, item_id: ItemId) -> Result<Option<GalleryItem>, StoreError> {
        let mut conn = self.pool.acquire().await.context("sqlite acquire failed")?;
        load_item(&mut conn, item_id).await
    }

    async fn list_items(
        &self,
        header: Option<ServiceHeader>,
    ) -> Result<Vec<GalleryItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS}, {IMAGE_COLUMNS}
             FROM gallery_items i
             LEFT JOIN gallery_images g ON g.gallery_item_id = i.id
             WHERE ?1 IS NULL OR i.header = ?1
             ORDER BY i.created_at DESC, i.id DESC, g.display_order ASC"
        ))
        .bind(header.map(ServiceHeader::label))
        .fetch_all(&self.pool)
        .await
        .context("failed to list gallery items")?;

        collect_items(&rows)
    }

    async fn replace_images(
        &self,
        item_id: ItemId,
        image_urls: &[String],
    ) -> Result<Vec<GalleryImage>, StoreError> {
        let mut tx = self.pool.begin().await.context("sqlite begin failed")?;
        if !item_exists(&mut tx, item_id).await? {
            return Err(StoreError::NotFound(item_id));
        }
        let images = write_images(&mut tx, item_id, image_urls).await?;
        tx.commit().await.context("sqlite commit failed")?;
        Ok(images)
    }

    async fn commit_new_item(
        &self,
        fields: &ItemFields,
        secondary_urls: &[String],
    ) -> Result<GalleryItem, StoreError> {
        let mut tx = self.pool.begin().await.context("sqlite begin failed")?;
        let item_id = insert_item(&mut tx, fields, Utc::now()).await?;
        write_images(&mut tx, item_id, secondary_urls).await?;
        let item = reload(&mut tx, item_id).await?;
        tx.commit().await.context("sqlite commit failed")?;
        Ok(item)
    }

    async fn commit_item_edit(
        &self,
        item_id: ItemId,
        fields: &ItemFields,
        secondary_urls: &[String],
    ) -> Result<EditCommit, StoreError> {
        let mut tx = self.pool.begin().await.context("sqlite begin failed")?;
        let Some(before) = load_item(&mut tx, item_id).await? else {
            return Err(StoreError::NotFound(item_id));
        };

        write_fields(&mut tx, item_id, fields).await?;
        write_images(&mut tx, item_id, secondary_urls).await?;
        let item = reload(&mut tx, item_id).await?;
        tx.commit().await.context("sqlite commit failed")?;

        let kept = item.image_sequence();
        let superseded_urls = before
            .image_sequence()
            .into_iter()
            .filter(|url| !kept.contains(url))
            .collect();
        Ok(EditCommit {
            item,
            superseded_urls,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

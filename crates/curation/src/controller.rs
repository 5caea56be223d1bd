use media::{MediaStore, UploadError};
use shared::domain::{GalleryItem, ItemFields, ItemId, ServiceHeader};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    pipeline::{PipelineFailure, UploadPipeline},
    staging::StagingArea,
    store::{GalleryStore, StoreError},
    validation::{validate_draft, FormField, ValidationError},
};

/// Identity of the admin driving a controller, as vouched for by the
/// identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub subject: String,
}

impl AdminPrincipal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("deleting gallery item {0} requires confirmation")]
    ConfirmationRequired(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringMode {
    New,
    Edit {
        item_id: ItemId,
        main_image_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct Draft {
    pub mode: AuthoringMode,
    pub header: Option<ServiceHeader>,
    pub description: String,
    pub staging: StagingArea,
}

#[derive(Debug, Clone)]
pub enum CurationState {
    Idle,
    Authoring(Draft),
    Submitting(AuthoringMode),
    ConfirmingDelete(ItemId),
}

impl CurationState {
    pub fn name(&self) -> &'static str {
        match self {
            CurationState::Idle => "idle",
            CurationState::Authoring(_) => "authoring",
            CurationState::Submitting(_) => "submitting",
            CurationState::ConfirmingDelete(_) => "confirming delete",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CurationOptions {
    /// Best-effort removal of media that no committed row references.
    pub cleanup_media: bool,
}

impl Default for CurationOptions {
    fn default() -> Self {
        Self {
            cleanup_media: true,
        }
    }
}

/// Drives the admin create/edit/delete workflows.
///
/// `Idle -> Authoring -> Submitting -> Idle`, `Authoring -> Idle` on cancel,
/// and `Idle -> ConfirmingDelete -> Idle` for deletes. Uploads and store
/// writes of one submission are awaited strictly one after another.
pub struct CurationController<S, M> {
    store: S,
    media: M,
    principal: AdminPrincipal,
    options: CurationOptions,
    state: CurationState,
    items: Vec<GalleryItem>,
    last_error: Option<String>,
}

impl<S, M> CurationController<S, M>
where
    S: GalleryStore,
    M: MediaStore,
{
    pub fn new(store: S, media: M, principal: AdminPrincipal) -> Self {
        Self::with_options(store, media, principal, CurationOptions::default())
    }

    pub fn with_options(
        store: S,
        media: M,
        principal: AdminPrincipal,
        options: CurationOptions,
    ) -> Self {
        Self {
            store,
            media,
            principal,
            options,
            state: CurationState::Idle,
            items: Vec::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> &CurationState {
        &self.state
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            CurationState::Authoring(draft) => Some(draft),
            _ => None,
        }
    }

    /// Admin listing as of the last successful refresh.
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reloads the admin listing. On failure the previous list is kept.
    pub async fn refresh(&mut self) -> Result<&[GalleryItem], CurationError> {
        match self.store.list_items(None).await {
            Ok(items) => {
                self.items = items;
                Ok(&self.items)
            }
            Err(error) => {
                warn!(%error, "gallery refresh failed; keeping previous listing");
                self.last_error = Some(error.to_string());
                Err(error.into())
            }
        }
    }

    pub fn begin_new(&mut self) -> Result<(), CurationError> {
        self.expect_idle("start a new item")?;
        self.state = CurationState::Authoring(Draft {
            mode: AuthoringMode::New,
            header: None,
            description: String::new(),
            staging: StagingArea::default(),
        });
        Ok(())
    }

    /// Preloads header and description. Existing images are never staged:
    /// the session starts with an empty staging area.
    pub fn begin_edit(&mut self, item: &GalleryItem) -> Result<(), CurationError> {
        self.expect_idle("edit an item")?;
        self.state = CurationState::Authoring(Draft {
            mode: AuthoringMode::Edit {
                item_id: item.id,
                main_image_url: item.main_image_url.clone(),
            },
            header: Some(item.header),
            description: item.description.clone(),
            staging: StagingArea::default(),
        });
        Ok(())
    }

    pub fn set_header(&mut self, header: ServiceHeader) -> Result<(), CurationError> {
        self.draft_mut("set the header")?.header = Some(header);
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), CurationError> {
        self.draft_mut("set the description")?.description = description.into();
        Ok(())
    }

    pub fn stage_image(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<usize, CurationError> {
        Ok(self
            .draft_mut("stage an image")?
            .staging
            .stage(file_name, bytes)?)
    }

    pub fn unstage_image(&mut self, index: usize) -> Result<(), CurationError> {
        self.draft_mut("unstage an image")?.staging.unstage(index)?;
        Ok(())
    }

    pub fn toggle_main(&mut self, index: usize) -> Result<bool, CurationError> {
        Ok(self.draft_mut("flag the main image")?.staging.toggle_main(index)?)
    }

    /// Leaves authoring or delete confirmation, discarding staged state.
    pub fn cancel(&mut self) -> Result<(), CurationError> {
        match self.state {
            CurationState::Authoring(_) | CurationState::ConfirmingDelete(_) => {
                self.state = CurationState::Idle;
                Ok(())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    /// Validates, uploads and commits the draft.
    ///
    /// Validation failures keep the draft open and touch nothing. Any later
    /// failure returns the controller to `Idle`; since every upload finishes
    /// before the single store commit, a failed upload leaves the store as
    /// it was.
    pub async fn submit(&mut self) -> Result<GalleryItem, CurationError> {
        let draft = match std::mem::replace(&mut self.state, CurationState::Idle) {
            CurationState::Authoring(draft) => draft,
            other => {
                self.state = other;
                return Err(self.invalid("submit"));
            }
        };

        let fields = match validate_draft(&draft) {
            Ok(fields) => fields,
            Err(error) => {
                self.state = CurationState::Authoring(draft);
                return Err(error.into());
            }
        };

        self.state = CurationState::Submitting(draft.mode.clone());
        let outcome = self
            .run_submission(draft.mode, fields.header, fields.description, draft.staging)
            .await;
        self.state = CurationState::Idle;

        match outcome {
            Ok(item) => {
                self.last_error = None;
                if let Err(error) = self.refresh().await {
                    debug!(%error, item_id = %item.id, "item saved; listing left stale");
                }
                Ok(item)
            }
            Err(error) => {
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    async fn run_submission(
        &self,
        mode: AuthoringMode,
        header: ServiceHeader,
        description: String,
        staging: StagingArea,
    ) -> Result<GalleryItem, CurationError> {
        let pipeline = UploadPipeline::plan(staging);
        let uploaded = match pipeline.run(&self.media).await {
            Ok(uploaded) => uploaded,
            Err(PipelineFailure { error, uploaded }) => {
                self.discard_media(&uploaded, "aborted submission").await;
                return Err(error.into());
            }
        };

        let main_image_url = match (&mode, &uploaded.main_url) {
            (_, Some(url)) => url.clone(),
            (AuthoringMode::Edit { main_image_url, .. }, None) => main_image_url.clone(),
            (AuthoringMode::New, None) => {
                return Err(ValidationError::new(FormField::Images, "select at least one image").into())
            }
        };
        let fields = ItemFields {
            header,
            description,
            main_image_url,
        };
        let secondary_urls = uploaded.secondary_urls();

        let committed = match &mode {
            AuthoringMode::New => self
                .store
                .commit_new_item(&fields, &secondary_urls)
                .await
                .map(|item| (item, Vec::new())),
            AuthoringMode::Edit { item_id, .. } => self
                .store
                .commit_item_edit(*item_id, &fields, &secondary_urls)
                .await
                .map(|commit| (commit.item, commit.superseded_urls)),
        };

        match committed {
            Ok((item, superseded)) => {
                info!(
                    admin = %self.principal.subject,
                    item_id = %item.id,
                    header = %item.header,
                    secondary_images = item.images.len(),
                    edited = matches!(mode, AuthoringMode::Edit { .. }),
                    "gallery item saved"
                );
                self.discard_media(&superseded, "superseded by edit").await;
                Ok(item)
            }
            Err(error) => {
                self.discard_media(&uploaded.all_urls(), "store commit failed")
                    .await;
                Err(error.into())
            }
        }
    }

    pub fn request_delete(&mut self, item_id: ItemId) -> Result<(), CurationError> {
        self.expect_idle("delete an item")?;
        self.state = CurationState::ConfirmingDelete(item_id);
        Ok(())
    }

    /// Deletes the item awaiting confirmation. Its media is removed
    /// best-effort after the rows are gone.
    pub async fn confirm_delete(&mut self) -> Result<GalleryItem, CurationError> {
        let CurationState::ConfirmingDelete(item_id) = self.state else {
            return Err(self.invalid("confirm a delete"));
        };
        self.state = CurationState::Idle;

        let removed = match self.store.delete_item(item_id).await {
            Ok(removed) => removed,
            Err(error) => {
                self.last_error = Some(error.to_string());
                return Err(error.into());
            }
        };
        info!(admin = %self.principal.subject, %item_id, "gallery item deleted");

        self.discard_media(&removed.image_sequence(), "item deleted")
            .await;
        self.last_error = None;
        if let Err(error) = self.refresh().await {
            debug!(%error, %item_id, "item deleted; listing left stale");
        }
        Ok(removed)
    }

    async fn discard_media(&self, urls: &[String], reason: &'static str) {
        if !self.options.cleanup_media {
            return;
        }
        for url in urls {
            if let Err(error) = self.media.remove(url).await {
                warn!(%url, %error, reason, "failed to remove media object");
            }
        }
    }

    fn expect_idle(&self, action: &'static str) -> Result<(), CurationError> {
        match self.state {
            CurationState::Idle => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn draft_mut(&mut self, action: &'static str) -> Result<&mut Draft, CurationError> {
        let state = self.state.name();
        match &mut self.state {
            CurationState::Authoring(draft) => Ok(draft),
            _ => Err(CurationError::InvalidTransition { action, state }),
        }
    }

    fn invalid(&self, action: &'static str) -> CurationError {
        CurationError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

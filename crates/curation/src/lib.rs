//! Admin curation workflow for gallery items: staging, validation, the
//! ordered upload pipeline and the store seam it commits through.

mod controller;
mod pipeline;
mod staging;
mod store;
mod validation;

pub use controller::{
    AdminPrincipal, AuthoringMode, CurationController, CurationError, CurationOptions,
    CurationState, Draft,
};
pub use pipeline::{ImageRole, PipelineFailure, UploadPipeline, UploadTask, UploadedImage, UploadedSet};
pub use staging::{StagedImage, StagingArea};
pub use store::{EditCommit, GalleryStore, StoreError};
pub use validation::{FormField, ValidationError};

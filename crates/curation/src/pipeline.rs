use media::{random_object_name, MediaStore, UploadError};
use tracing::debug;

use crate::staging::StagingArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Main,
    Secondary { display_order: i64 },
}

#[derive(Debug, Clone)]
pub struct UploadTask {
    pub role: ImageRole,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub role: ImageRole,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct UploadedSet {
    pub main_url: Option<String>,
    /// In display order.
    pub secondary: Vec<UploadedImage>,
}

impl UploadedSet {
    pub fn secondary_urls(&self) -> Vec<String> {
        self.secondary.iter().map(|image| image.url.clone()).collect()
    }

    pub fn all_urls(&self) -> Vec<String> {
        self.main_url
            .iter()
            .cloned()
            .chain(self.secondary_urls())
            .collect()
    }
}

#[derive(Debug)]
pub struct PipelineFailure {
    pub error: UploadError,
    /// URLs uploaded before the failing task.
    pub uploaded: Vec<String>,
}

/// Ordered upload tasks: the main image first, then the remaining staged
/// images in staging order with `display_order` 1, 2, ...
///
/// Tasks run one at a time so that display order always follows staging
/// order, never completion order.
#[derive(Debug, Clone, Default)]
pub struct UploadPipeline {
    tasks: Vec<UploadTask>,
}

impl UploadPipeline {
    pub fn plan(staging: StagingArea) -> Self {
        let Some(main_index) = staging.main_index() else {
            return Self::default();
        };

        let mut main = None;
        let mut secondary = Vec::with_capacity(staging.len() - 1);
        for (index, image) in staging.into_images().into_iter().enumerate() {
            if index == main_index {
                main = Some(UploadTask {
                    role: ImageRole::Main,
                    file_name: image.file_name,
                    bytes: image.bytes,
                });
            } else {
                let display_order = secondary.len() as i64 + 1;
                secondary.push(UploadTask {
                    role: ImageRole::Secondary { display_order },
                    file_name: image.file_name,
                    bytes: image.bytes,
                });
            }
        }

        Self {
            tasks: main.into_iter().chain(secondary).collect(),
        }
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stops at the first failure.
    pub async fn run<M>(self, media: &M) -> Result<UploadedSet, PipelineFailure>
    where
        M: MediaStore + ?Sized,
    {
        let mut uploaded = UploadedSet::default();
        for task in self.tasks {
            let object_name = random_object_name(&task.file_name);
            let url = match media.upload(&object_name, &task.bytes).await {
                Ok(url) => url,
                Err(error) => {
                    return Err(PipelineFailure {
                        error,
                        uploaded: uploaded.all_urls(),
                    })
                }
            };
            debug!(file_name = %task.file_name, %object_name, role = ?task.role, "uploaded staged image");

            match task.role {
                ImageRole::Main => uploaded.main_url = Some(url),
                ImageRole::Secondary { .. } => uploaded.secondary.push(UploadedImage {
                    role: task.role,
                    url,
                }),
            }
        }
        Ok(uploaded)
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;

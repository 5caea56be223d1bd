use crate::validation::{FormField, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub is_main: bool,
}

/// Images picked for the current authoring session, in staging order.
///
/// At most one image carries the main flag at any time.
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    images: Vec<StagedImage>,
}

impl StagingArea {
    pub fn stage(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<usize, ValidationError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(ValidationError::new(
                FormField::Images,
                format!("'{file_name}' is empty"),
            ));
        }
        if !is_image_file_name(&file_name) {
            return Err(ValidationError::new(
                FormField::Images,
                format!("'{file_name}' is not an image"),
            ));
        }

        self.images.push(StagedImage {
            file_name,
            bytes,
            is_main: false,
        });
        Ok(self.images.len() - 1)
    }

    pub fn unstage(&mut self, index: usize) -> Result<StagedImage, ValidationError> {
        if index >= self.images.len() {
            return Err(out_of_range(index));
        }
        Ok(self.images.remove(index))
    }

    /// Flips the main flag of `index` and clears it everywhere else.
    /// Returns the new flag value.
    pub fn toggle_main(&mut self, index: usize) -> Result<bool, ValidationError> {
        let Some(target) = self.images.get(index) else {
            return Err(out_of_range(index));
        };
        let flagged = !target.is_main;
        for (position, image) in self.images.iter_mut().enumerate() {
            image.is_main = position == index && flagged;
        }
        Ok(flagged)
    }

    pub fn flagged_main(&self) -> Option<usize> {
        self.images.iter().position(|image| image.is_main)
    }

    /// The flagged image, or the first one when nothing is flagged.
    pub fn main_index(&self) -> Option<usize> {
        if self.images.is_empty() {
            return None;
        }
        Some(self.flagged_main().unwrap_or(0))
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn into_images(self) -> Vec<StagedImage> {
        self.images
    }
}

fn out_of_range(index: usize) -> ValidationError {
    ValidationError::new(FormField::Images, format!("no staged image at index {index}"))
}

fn is_image_file_name(file_name: &str) -> bool {
    mime_guess::from_path(file_name)
        .first()
        .is_some_and(|mime| mime.type_().as_str() == "image")
}

#[cfg(test)]
#[path = "tests/staging_tests.rs"]
mod tests;

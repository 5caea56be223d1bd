/// Full-size viewer. Closing keeps the images and position so the viewer
/// can be resumed where it was left.
#[derive(Debug, Clone, Default)]
pub struct Lightbox {
    images: Vec<String>,
    current_index: usize,
    is_open: bool,
}

impl Lightbox {
    /// Does nothing for an empty image list. The start index is clamped.
    pub fn open(&mut self, images: Vec<String>, start_index: usize) -> bool {
        if images.is_empty() {
            return false;
        }
        self.current_index = start_index.min(images.len() - 1);
        self.images = images;
        self.is_open = true;
        true
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn resume(&mut self) -> bool {
        if self.images.is_empty() {
            return false;
        }
        self.is_open = true;
        true
    }

    pub fn next(&mut self) -> Option<&str> {
        if !self.is_open {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.images.len();
        self.current_image()
    }

    pub fn previous(&mut self) -> Option<&str> {
        if !self.is_open {
            return None;
        }
        let len = self.images.len();
        self.current_index = (self.current_index + len - 1) % len;
        self.current_image()
    }

    pub fn current_image(&self) -> Option<&str> {
        self.images.get(self.current_index).map(String::as_str)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

#[cfg(test)]
#[path = "tests/lightbox_tests.rs"]
mod tests;

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid media object path '{0}'")]
    InvalidPath(String),
    #[error("media store rejected '{path}': {reason}")]
    Rejected { path: String, reason: String },
    #[error("media store i/o failure for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Binary object store that hands back publicly resolvable URLs.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, UploadError>;

    /// Returns `false` when the URL does not belong to this store or the
    /// object is already gone.
    async fn remove(&self, public_url: &str) -> Result<bool, UploadError>;
}

#[async_trait]
impl<T> MediaStore for Arc<T>
where
    T: MediaStore + ?Sized,
{
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, UploadError> {
        (**self).upload(path, bytes).await
    }

    async fn remove(&self, public_url: &str) -> Result<bool, UploadError> {
        (**self).remove(public_url).await
    }
}

/// Random object name that keeps the original file extension, e.g.
/// `bride.JPG` becomes `3f0c...e1.jpg`. No uniqueness check is made.
pub fn random_object_name(original_file_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match file_extension(original_file_name) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    }
}

pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn validate_object_path(path: &str) -> Result<(), UploadError> {
    let invalid = path.is_empty()
        || path.starts_with('.')
        || path.contains('/')
        || path.contains('\\')
        || path.contains("..");
    if invalid {
        return Err(UploadError::InvalidPath(path.to_string()));
    }
    Ok(())
}

fn normalized_base(public_base: &str) -> Result<Url, url::ParseError> {
    let mut base = public_base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
}

/// Files under a local directory, published below `public_base`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base: Url,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            root: root.into(),
            public_base: normalized_base(public_base)?,
        })
    }

    pub fn public_url(&self, path: &str) -> Result<String, UploadError> {
        validate_object_path(path)?;
        self.public_base
            .join(path)
            .map(String::from)
            .map_err(|e| UploadError::Rejected {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    fn owned_object_name<'a>(&self, public_url: &'a str) -> Option<&'a str> {
        let name = public_url.strip_prefix(self.public_base.as_str())?;
        validate_object_path(name).ok()?;
        Some(name)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let public_url = self.public_url(path)?;
        if bytes.is_empty() {
            return Err(UploadError::Rejected {
                path: path.to_string(),
                reason: "empty file".into(),
            });
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| UploadError::Io {
                path: self.root.display().to_string(),
                source,
            })?;
        tokio::fs::write(self.root.join(path), bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.to_string(),
                source,
            })?;

        debug!(%path, size_bytes = bytes.len(), "stored media object");
        Ok(public_url)
    }

    async fn remove(&self, public_url: &str) -> Result<bool, UploadError> {
        let Some(name) = self.owned_object_name(public_url) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(UploadError::Io {
                path: name.to_string(),
                source,
            }),
        }
    }
}

/// In-process store. Can be told to reject a given upload attempt.
pub struct MemoryMediaStore {
    public_base: String,
    fail_on_attempt: Option<usize>,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    attempts: usize,
    objects: HashMap<String, Vec<u8>>,
    upload_log: Vec<String>,
}

impl MemoryMediaStore {
    pub fn new(public_base: impl Into<String>) -> Self {
        let mut public_base = public_base.into();
        if !public_base.ends_with('/') {
            public_base.push('/');
        }
        Self {
            public_base,
            fail_on_attempt: None,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Rejects the upload attempt with the given zero-based index.
    pub fn failing_on_attempt(mut self, attempt: usize) -> Self {
        self.fail_on_attempt = Some(attempt);
        self
    }

    pub async fn upload_attempts(&self) -> usize {
        self.state.lock().await.attempts
    }

    /// Paths of successful uploads, in completion order.
    pub async fn upload_log(&self) -> Vec<String> {
        self.state.lock().await.upload_log.clone()
    }

    pub async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    pub async fn contains(&self, public_url: &str) -> bool {
        self.state.lock().await.objects.contains_key(public_url)
    }

    pub async fn object_bytes(&self, public_url: &str) -> Option<Vec<u8>> {
        self.state.lock().await.objects.get(public_url).cloned()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, UploadError> {
        validate_object_path(path)?;
        let mut state = self.state.lock().await;
        let attempt = state.attempts;
        state.attempts += 1;
        if self.fail_on_attempt == Some(attempt) {
            return Err(UploadError::Rejected {
                path: path.to_string(),
                reason: format!("injected failure on attempt {attempt}"),
            });
        }

        let public_url = format!("{}{path}", self.public_base);
        state.objects.insert(public_url.clone(), bytes.to_vec());
        state.upload_log.push(path.to_string());
        Ok(public_url)
    }

    async fn remove(&self, public_url: &str) -> Result<bool, UploadError> {
        Ok(self.state.lock().await.objects.remove(public_url).is_some())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

//! File storage for uploaded profile pictures and generated QR images.
//!
//! Blobs live under a single media root, namespaced by kind
//! (`profile_pictures/`, `qrCodes/`) and keyed by filename. Writes are
//! append-or-replace by key; stored paths are relative so the public
//! base URL can change without rewriting rows.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Namespace for uploaded resident photos.
pub const PROFILE_PICTURES: &str = "profile_pictures";
/// Namespace for generated QR images.
pub const QR_CODES: &str = "qrCodes";

const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported file extension (allowed: jpg, jpeg, png)")]
    UnsupportedExtension,
    #[error("file name must be a bare name without path components")]
    InvalidFileName,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Disk-backed media store with a configurable public base URL.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Filesystem root, served read-only under the public base URL.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject anything that is not a jpg/jpeg/png filename.
    pub fn validate_image_extension(file_name: &str) -> Result<(), MediaError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension {
            Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(MediaError::UnsupportedExtension),
        }
    }

    /// Reject keys that could resolve outside their namespace
    /// directory. Callers derive names from trusted ids or from
    /// [`sanitize_file_name`]; this is the last line of defense.
    fn validate_file_name(file_name: &str) -> Result<(), MediaError> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(MediaError::InvalidFileName);
        }
        Ok(())
    }

    /// Reduce a client-supplied upload name to a bare file name,
    /// stripping any path components.
    pub fn sanitize_file_name(file_name: &str) -> Result<String, MediaError> {
        let bare = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(MediaError::InvalidFileName)?;
        Self::validate_file_name(bare)?;
        Ok(bare.to_string())
    }

    /// Write a blob under `{namespace}/{file_name}`, replacing any
    /// previous blob with the same key. Returns the stored relative
    /// path.
    pub async fn save(
        &self,
        namespace: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        Self::validate_file_name(file_name)?;
        let relative = format!("{namespace}/{file_name}");
        let full_path = self.root.join(namespace).join(file_name);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), relative);
        Ok(relative)
    }

    /// Fully-qualified URL for a stored relative path.
    pub fn url(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}

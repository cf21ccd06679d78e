use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Extensions accepted for receipt uploads, lowercase.
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff", "pdf"];

/// Sub-directory of the upload root that holds receipts.
const RECEIPTS_DIR: &str = "receipts";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No receipt file was uploaded")]
    Empty,
    #[error("Unsupported file type '{0}'")]
    UnsupportedType(String),
    #[error("failed to store receipt: {0}")]
    Io(#[from] std::io::Error),
}

/// A receipt written to disk.
#[derive(Debug, Clone)]
pub struct StoredReceipt {
    pub path: PathBuf,
    /// Public URL under `/uploads`.
    pub url: String,
}

pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

pub fn is_allowed(file_name: &str) -> bool {
    extension_of(file_name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Writes the upload under `<upload_dir>/receipts/<uuid>.<ext>`. The client's
/// file name only contributes its extension.
pub async fn save_receipt(upload_dir: &Path, file_name: &str, data: &[u8]) -> Result<StoredReceipt, UploadError> {
    if data.is_empty() {
        return Err(UploadError::Empty);
    }
    let extension = extension_of(file_name).unwrap_or_default();
    if !is_allowed(file_name) {
        return Err(UploadError::UnsupportedType(extension));
    }

    let receipts_dir = upload_dir.join(RECEIPTS_DIR);
    fs::create_dir_all(&receipts_dir).await?;

    let new_file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = receipts_dir.join(&new_file_name);
    fs::write(&path, data).await?;

    Ok(StoredReceipt {
        path,
        url: format!("/uploads/{}/{}", RECEIPTS_DIR, new_file_name),
    })
}

/// Deletes a freshly stored receipt when dropped, unless [`ReceiptGuard::keep`]
/// was called. Covers handler futures that are cancelled mid-request.
#[derive(Debug)]
pub struct ReceiptGuard {
    path: Option<PathBuf>,
}

impl ReceiptGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The file now belongs to a stored expense.
    pub fn keep(mut self) {
        self.path = None;
    }
}

impl Drop for ReceiptGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => log::info!("Discarded unsaved receipt {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Could not remove receipt {}: {}", path.display(), e),
            }
        }
    }
}

/// Maps a stored `/uploads/...` URL back to its file on disk.
pub fn path_for_url(upload_dir: &Path, url: &str) -> Option<PathBuf> {
    let relative = url.strip_prefix("/uploads/")?;
    if relative.split('/').any(|part| part.is_empty() || part == "..") {
        return None;
    }
    Some(upload_dir.join(relative))
}

/// Best effort; a missing file is not an error.
pub async fn remove_receipt(upload_dir: &Path, url: &str) {
    if let Some(path) = path_for_url(upload_dir, url) {
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Could not remove receipt {}: {}", path.display(), e);
            }
        }
    }
}

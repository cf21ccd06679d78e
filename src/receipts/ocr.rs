use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;

use crate::config::OcrSettings;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine is not available")]
    Unavailable,
    #[error("unsupported receipt format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to run OCR engine: {0}")]
    Launch(#[from] std::io::Error),
    #[error("OCR engine exited with status {code}: {stderr}")]
    Recognition { code: i32, stderr: String },
}

/// Turns a receipt image into raw text.
///
/// Whether an engine is usable is decided once at startup; the handlers get
/// whichever engine was chosen and never query the system themselves.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String, OcrError>;

    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }
}

/// Tesseract driven through its command line: `tesseract <image> stdout -l <lang>`.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Runs `<binary> --version` and returns the engine only if that works.
    pub async fn detect(binary: impl Into<PathBuf>, language: impl Into<String>) -> Option<Self> {
        let engine = Self::new(binary, language);
        match Command::new(&engine.binary).arg("--version").output().await {
            Ok(output) if output.status.success() => {
                // Older releases print the banner on stderr.
                let banner = if output.stdout.is_empty() {
                    output.stderr
                } else {
                    output.stdout
                };
                let version = String::from_utf8_lossy(&banner)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                log::info!("OCR engine found: {} ({})", engine.binary.display(), version);
                Some(engine)
            }
            Ok(output) => {
                log::warn!(
                    "OCR engine {} exited with {} on --version",
                    engine.binary.display(),
                    output.status
                );
                None
            }
            Err(e) => {
                log::warn!("OCR engine {} could not be started: {}", engine.binary.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &Path) -> Result<String, OcrError> {
        let extension = image
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if extension == "pdf" {
            return Err(OcrError::UnsupportedFormat(extension));
        }

        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(OcrError::Recognition {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Used when OCR is switched off or no engine could be found.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOcr;

#[async_trait]
impl OcrEngine for DisabledOcr {
    async fn recognize(&self, _image: &Path) -> Result<String, OcrError> {
        Err(OcrError::Unavailable)
    }

    fn name(&self) -> &str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Picks the OCR engine for the lifetime of the process.
pub async fn engine_from_settings(settings: &OcrSettings) -> Arc<dyn OcrEngine> {
    if !settings.enabled {
        log::info!("OCR disabled by configuration, receipts will need manual entry");
        return Arc::new(DisabledOcr);
    }

    match TesseractCli::detect(&settings.tesseract_path, &settings.language).await {
        Some(engine) => Arc::new(engine),
        None => {
            log::warn!("No OCR engine available, receipts will need manual entry");
            Arc::new(DisabledOcr)
        }
    }
}

//! Annotation export as a JSON sidecar
//!
//! Annotations are written next to the PDF as `<file>.pdf-signer.json`; the
//! PDF itself is never modified.

use crate::annotation::Annotation;
use crate::store::AnnotationStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current sidecar format version
pub const SIDECAR_VERSION: u32 = 1;

/// Error types for export operations
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed sidecar: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported sidecar version {0}")]
    UnsupportedVersion(u32),
}

/// Exported annotations for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSidecar {
    pub version: u32,
    /// File name of the annotated document
    pub document: String,
    pub page_count: u32,
    /// Seconds since the Unix epoch
    pub exported_at: u64,
    pub annotations: Vec<Annotation>,
}

impl AnnotationSidecar {
    /// Snapshot the store in creation order
    pub fn from_store(
        document: impl Into<String>,
        page_count: u32,
        store: &AnnotationStore,
    ) -> Self {
        Self {
            version: SIDECAR_VERSION,
            document: document.into(),
            page_count,
            exported_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
            annotations: store.iter().cloned().collect(),
        }
    }

    /// Annotations on `page_number`, in export order
    pub fn page_annotations(&self, page_number: u32) -> Vec<&Annotation> {
        self.annotations.iter().filter(|a| a.page_number() == page_number).collect()
    }
}

/// Get the sidecar path for a given PDF path
///
/// # Example
/// ```
/// use std::path::Path;
/// use pdf_signer_core::export::sidecar_path;
///
/// let path = sidecar_path(Path::new("/docs/contract.pdf"));
/// assert_eq!(path, Path::new("/docs/contract.pdf.pdf-signer.json"));
/// ```
pub fn sidecar_path(pdf_path: &Path) -> PathBuf {
    let mut path = pdf_path.as_os_str().to_owned();
    path.push(".pdf-signer.json");
    PathBuf::from(path)
}

/// Write the sidecar as pretty JSON, replacing any existing file atomically
pub fn save_sidecar(sidecar: &AnnotationSidecar, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(sidecar)?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;

    log::info!("exported {} annotation(s) to {}", sidecar.annotations.len(), path.display());
    Ok(())
}

/// Read a sidecar, or `None` when the file does not exist
pub fn load_sidecar(path: &Path) -> Result<Option<AnnotationSidecar>, ExportError> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let sidecar: AnnotationSidecar = serde_json::from_str(&json)?;
    if sidecar.version > SIDECAR_VERSION {
        return Err(ExportError::UnsupportedVersion(sidecar.version));
    }

    Ok(Some(sidecar))
}

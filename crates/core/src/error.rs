//! Error types for the annotation engine

use crate::annotation::AnnotationId;
use std::fmt;

/// Why a document failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadFailureKind {
    PasswordProtected,
    Corrupt,
    Network,
    WorkerMissing,
    Unknown,
}

impl LoadFailureKind {
    /// Classify a raw engine error message
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("password") || lower.contains("encrypt") {
            LoadFailureKind::PasswordProtected
        } else if lower.contains("worker") {
            LoadFailureKind::WorkerMissing
        } else if lower.contains("corrupt") || lower.contains("invalid") {
            LoadFailureKind::Corrupt
        } else if lower.contains("404") || lower.contains("network") {
            LoadFailureKind::Network
        } else {
            LoadFailureKind::Unknown
        }
    }

    /// User-facing explanation
    pub fn message(self) -> &'static str {
        match self {
            LoadFailureKind::PasswordProtected => {
                "This PDF is password protected. Please remove the password and try again."
            }
            LoadFailureKind::Corrupt => "The PDF file appears to be corrupted or invalid.",
            LoadFailureKind::Network => "The PDF file could not be found.",
            LoadFailureKind::WorkerMissing => "The PDF renderer failed to start. Please try again.",
            LoadFailureKind::Unknown => "The PDF could not be loaded.",
        }
    }
}

impl fmt::Display for LoadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A classified document load failure with the engine's original message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: LoadFailureKind,
    pub detail: String,
}

impl LoadFailure {
    pub fn from_message(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self { kind: LoadFailureKind::classify(&detail), detail }
    }
}

impl From<&pdf_engine::PdfEngineError> for LoadFailure {
    fn from(error: &pdf_engine::PdfEngineError) -> Self {
        match error {
            pdf_engine::PdfEngineError::Encrypted => Self {
                kind: LoadFailureKind::PasswordProtected,
                detail: error.to_string(),
            },
            pdf_engine::PdfEngineError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self { kind: LoadFailureKind::Network, detail: error.to_string() }
            }
            pdf_engine::PdfEngineError::Parse(_) => {
                Self { kind: LoadFailureKind::Corrupt, detail: error.to_string() }
            }
            other => Self::from_message(other.to_string()),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.detail)
    }
}

/// Errors surfaced by the annotation session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnnotatorError {
    #[error("please upload a PDF file (got {mime})")]
    InvalidFileType { mime: String },
    #[error("{0}")]
    DocumentLoad(LoadFailure),
    #[error("please draw your signature first")]
    EmptySignature,
    #[error("signature could not be encoded: {0}")]
    SignatureEncoding(String),
    #[error("no document is open")]
    NoDocument,
    #[error("annotation {0} no longer exists")]
    StaleUpdateTarget(AnnotationId),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;

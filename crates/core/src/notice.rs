//! User-facing notices
//!
//! Every error, warning, or confirmation the session wants the user to see
//! goes through one FIFO queue. Presentation is left to the front end.

use crate::error::AnnotatorError;
use std::collections::VecDeque;
use std::fmt;

/// Severity levels with different presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The requested operation failed
    Error,
    /// The operation was refused but the session is fine
    Warning,
    /// Informational
    Info,
}

impl Severity {
    /// Get the display title for this severity level
    pub fn title(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Notice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity, title: title.into(), message: message.into() }
    }

    /// A document finished loading
    pub fn document_loaded(name: &str) -> Self {
        Self::new(Severity::Info, "Document uploaded", format!("{name} has been loaded."))
    }

    pub fn comment_saved() -> Self {
        Self::new(Severity::Info, "Comment saved", "Your comment has been added to the document.")
    }

    pub fn annotation_removed() -> Self {
        Self::new(Severity::Info, "Annotation removed", "The annotation has been deleted.")
    }

    /// Notice describing a session error
    pub fn from_error(error: &AnnotatorError) -> Self {
        match error {
            AnnotatorError::InvalidFileType { .. } => {
                Self::new(Severity::Error, "Invalid file type", "Please upload a PDF file.")
            }
            AnnotatorError::DocumentLoad(failure) => {
                Self::new(Severity::Error, "Error loading PDF", failure.kind.message())
            }
            AnnotatorError::EmptySignature => Self::new(
                Severity::Warning,
                "No signature",
                "Please draw your signature first.",
            ),
            AnnotatorError::SignatureEncoding(_) => {
                Self::new(Severity::Error, Severity::Error.title(), error.to_string())
            }
            AnnotatorError::NoDocument => {
                Self::new(Severity::Warning, "No document", "Open a PDF before annotating.")
            }
            AnnotatorError::StaleUpdateTarget(_) => {
                Self::new(Severity::Info, Severity::Info.title(), error.to_string())
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// FIFO of pending notices
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    pending: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn push(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Error => log::error!("{notice}"),
            Severity::Warning => log::warn!("{notice}"),
            Severity::Info => log::info!("{notice}"),
        }
        self.pending.push_back(notice);
    }

    pub fn report(&mut self, error: &AnnotatorError) {
        self.push(Notice::from_error(error));
    }

    /// Take every pending notice, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    pub fn peek(&self) -> Option<&Notice> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

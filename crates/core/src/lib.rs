//! PDF Signer Core Library
//!
//! Annotation model, placement, and overlay rendering for the PDF signer.

pub mod annotation;
pub mod comment;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod navigator;
pub mod notice;
pub mod placement;
pub mod render;
pub mod session;
pub mod signature;
pub mod store;
pub mod tool;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationTool, Color,
    NewAnnotation, PageCoordinate, SignatureImage,
};
pub use comment::CommentEditor;
pub use config::{AnnotatorConfig, ConfigError, SignaturePadConfig};
pub use error::{AnnotatorError, LoadFailure, LoadFailureKind};
pub use export::{load_sidecar, save_sidecar, sidecar_path, AnnotationSidecar, ExportError};
pub use geometry::{ScreenPoint, ScreenRect};
pub use navigator::Navigator;
pub use notice::{Notice, Severity};
pub use placement::{place_annotation, PageView, PlacementTarget, PointerInput};
pub use render::{hit_test, render_overlays, HitTarget, Overlay, OverlayHit, OverlayPrimitive};
pub use session::{
    ActionEffect, AnnotatorSession, DocumentSource, DocumentState, LoadTicket, PageLayout,
    SessionAction, PDF_MIME,
};
pub use signature::{SignaturePad, SignatureSource};
pub use store::AnnotationStore;
pub use tool::ToolState;

//! Document session
//!
//! Owns everything tied to one open document: the annotation store, tool
//! selection, signature pad, comment editor, and navigator. User input arrives
//! as [`SessionAction`]s applied through [`AnnotatorSession::apply`]; errors
//! go to the notice queue.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationTool, Color};
use crate::comment::CommentEditor;
use crate::config::AnnotatorConfig;
use crate::error::{AnnotatorError, LoadFailure, Result};
use crate::export::AnnotationSidecar;
use crate::geometry::{ScreenPoint, ScreenRect};
use crate::navigator::Navigator;
use crate::notice::{Notice, NoticeQueue};
use crate::placement::{place_annotation, PageView, PlacementTarget, PointerInput};
use crate::render::{hit_test, render_overlays, HitTarget, Overlay};
use crate::signature::SignaturePad;
use crate::store::AnnotationStore;
use crate::tool::ToolState;
use pdf_engine::PdfEngineError;
use serde::{Deserialize, Serialize};

/// The only accepted document MIME type
pub const PDF_MIME: &str = "application/pdf";

/// A document the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub name: String,
    pub mime: String,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self { name: name.into(), mime: mime.into() }
    }
}

/// Identifies one in-flight document load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Where the session is in the document lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    Empty,
    Loading { name: String },
    Ready { name: String, page_count: u32 },
    Failed { name: String, failure: LoadFailure },
}

/// Screen placement of the current page
///
/// `page_width`/`page_height` are unscaled document units; the on-screen rect
/// grows with the zoom scale from a fixed origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub origin: ScreenPoint,
    pub page_width: f32,
    pub page_height: f32,
}

impl PageLayout {
    pub fn rect(&self, scale: f32) -> ScreenRect {
        ScreenRect::new(
            self.origin.x,
            self.origin.y,
            self.page_width * scale,
            self.page_height * scale,
        )
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        let size = pdf_engine::DEFAULT_PAGE_SIZE;
        Self {
            origin: ScreenPoint::new(0.0, 0.0),
            page_width: size.width_pt,
            page_height: size.height_pt,
        }
    }
}

/// User input understood by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    /// Arm a tool, or disarm it when already active
    SelectTool { tool: AnnotationTool },
    SetColor { color: Color },
    /// Press on the page; may delete, toggle a comment, or place an annotation
    PointerDown(PointerInput),
    BeginStroke(ScreenPoint),
    ExtendStroke(ScreenPoint),
    EndStroke,
    ClearSignature,
    DeleteAnnotation { id: AnnotationId },
    ToggleComment { id: AnnotationId },
    EditComment { text: String },
    SaveComment,
    CancelComment,
    SetPage { page: u32 },
    NextPage,
    PreviousPage,
    SetScale { scale: f32 },
    ZoomIn,
    ZoomOut,
    SetPageLayout(PageLayout),
}

/// What an action did to the annotation collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    None,
    Created(AnnotationId),
    Updated(AnnotationId),
    Deleted(AnnotationId),
}

pub struct AnnotatorSession {
    config: AnnotatorConfig,
    state: DocumentState,
    generation: u64,
    layout: PageLayout,
    store: AnnotationStore,
    tools: ToolState,
    signature_pad: SignaturePad,
    comment_editor: CommentEditor,
    navigator: Navigator,
    notices: NoticeQueue,
}

impl AnnotatorSession {
    pub fn new(config: AnnotatorConfig) -> Self {
        Self {
            tools: ToolState::new(config.default_color),
            signature_pad: SignaturePad::new(&config.signature_pad),
            navigator: Navigator::new(&config),
            state: DocumentState::Empty,
            generation: 0,
            layout: PageLayout::default(),
            store: AnnotationStore::new(),
            comment_editor: CommentEditor::new(),
            notices: NoticeQueue::default(),
            config,
        }
    }

    /// Start loading a document
    ///
    /// Anything other than a PDF is rejected and leaves the session as it
    /// was. On success the previous document's annotations are discarded and
    /// the returned ticket must be handed to [`Self::complete_load`].
    pub fn open_document(&mut self, source: DocumentSource) -> Result<LoadTicket> {
        if !is_pdf_mime(&source.mime) {
            let error = AnnotatorError::InvalidFileType { mime: source.mime };
            self.notices.report(&error);
            return Err(error);
        }

        self.reset_document();
        self.generation += 1;
        log::info!("loading {} (generation {})", source.name, self.generation);
        self.state = DocumentState::Loading { name: source.name };

        Ok(LoadTicket { generation: self.generation })
    }

    /// Finish a load started by [`Self::open_document`]
    ///
    /// Returns `false` when the ticket is stale (a newer load started or the
    /// document was closed); the outcome is then ignored entirely.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        outcome: std::result::Result<u32, PdfEngineError>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding load completion for generation {} (current {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        let DocumentState::Loading { name } = &self.state else {
            log::debug!("load completion arrived with no load in flight");
            return false;
        };
        let name = name.clone();

        let failure = match outcome {
            Ok(0) => LoadFailure::from_message("document has no pages"),
            Ok(page_count) => {
                self.navigator.set_total_pages(page_count);
                log::info!("loaded {name} with {page_count} page(s)");
                self.notices.push(Notice::document_loaded(&name));
                self.state = DocumentState::Ready { name, page_count };
                return true;
            }
            Err(error) => LoadFailure::from(&error),
        };

        self.notices.report(&AnnotatorError::DocumentLoad(failure.clone()));
        self.state = DocumentState::Failed { name, failure };
        true
    }

    /// Drop the document and everything attached to it
    pub fn close_document(&mut self) {
        self.reset_document();
        self.generation += 1;
        self.state = DocumentState::Empty;
        log::info!("document closed");
    }

    /// Replace the annotations with previously exported ones
    ///
    /// Records on page 0 or past the last page are dropped. Returns how many
    /// were kept.
    pub fn restore_annotations(&mut self, annotations: Vec<Annotation>) -> Result<usize> {
        let page_count = self.page_count().ok_or(AnnotatorError::NoDocument)?;
        let (kept, dropped): (Vec<_>, Vec<_>) = annotations
            .into_iter()
            .partition(|a| (1..=page_count).contains(&a.page_number()));
        if !dropped.is_empty() {
            log::warn!("dropping {} annotation(s) outside pages 1..={page_count}", dropped.len());
        }
        self.comment_editor.cancel();
        Ok(self.store.restore(kept))
    }

    /// Apply one user action
    pub fn apply(&mut self, action: SessionAction) -> ActionEffect {
        match action {
            SessionAction::SelectTool { tool } => self.tools.select(tool),
            SessionAction::SetColor { color } => self.tools.set_color(color),
            SessionAction::PointerDown(input) => return self.pointer_down(input),
            SessionAction::BeginStroke(point) => self.signature_pad.begin_stroke(point),
            SessionAction::ExtendStroke(point) => self.signature_pad.extend_stroke(point),
            SessionAction::EndStroke => self.signature_pad.end_stroke(),
            SessionAction::ClearSignature => self.signature_pad.clear(),
            SessionAction::DeleteAnnotation { id } => return self.delete(id),
            SessionAction::ToggleComment { id } => self.toggle_comment(id),
            SessionAction::EditComment { text } => self.comment_editor.set_draft(text),
            SessionAction::SaveComment => {
                if let Some(id) = self.comment_editor.save(&mut self.store) {
                    self.notices.push(Notice::comment_saved());
                    return ActionEffect::Updated(id);
                }
            }
            SessionAction::CancelComment => self.comment_editor.cancel(),
            SessionAction::SetPage { page } => self.navigator.set_current_page(page),
            SessionAction::NextPage => self.navigator.next_page(),
            SessionAction::PreviousPage => self.navigator.previous_page(),
            SessionAction::SetScale { scale } => self.navigator.set_scale(scale),
            SessionAction::ZoomIn => self.navigator.zoom_in(),
            SessionAction::ZoomOut => self.navigator.zoom_out(),
            SessionAction::SetPageLayout(layout) => self.layout = layout,
        }
        ActionEffect::None
    }

    /// Overlays for the current page at the current scale
    pub fn overlays(&self) -> Vec<Overlay> {
        render_overlays(
            &self.store.list_for_page(self.navigator.current_page()),
            self.navigator.scale(),
            &self.config,
            self.comment_editor.open_id(),
        )
    }

    /// Snapshot the annotations for export
    pub fn export_sidecar(&self) -> Result<AnnotationSidecar> {
        let DocumentState::Ready { name, page_count } = &self.state else {
            return Err(AnnotatorError::NoDocument);
        };
        Ok(AnnotationSidecar::from_store(name.clone(), *page_count, &self.store))
    }

    /// Take every pending notice, oldest first
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn page_count(&self) -> Option<u32> {
        match self.state {
            DocumentState::Ready { page_count, .. } => Some(page_count),
            _ => None,
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn signature_pad(&self) -> &SignaturePad {
        &self.signature_pad
    }

    pub fn comment_editor(&self) -> &CommentEditor {
        &self.comment_editor
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    fn pointer_down(&mut self, input: PointerInput) -> ActionEffect {
        if self.page_count().is_none() {
            self.notices.report(&AnnotatorError::NoDocument);
            return ActionEffect::None;
        }

        let scale = self.navigator.scale();
        let rect = self.layout.rect(scale);

        let local = ScreenPoint::new(input.screen.x - rect.left, input.screen.y - rect.top);
        let hit = hit_test(&self.overlays(), local);
        if let Some(hit) = hit {
            match hit.target {
                HitTarget::DeleteHandle => return self.delete(hit.annotation_id),
                HitTarget::CommentMarker => {
                    self.toggle_comment(hit.annotation_id);
                    return ActionEffect::None;
                }
                HitTarget::Body => {}
            }
        }

        let view = PageView { page_number: self.navigator.current_page(), rect, scale };
        let target = PlacementTarget {
            store: &mut self.store,
            tools: &mut self.tools,
            signature_pad: &self.signature_pad,
        };

        match place_annotation(input, &view, target, &self.config) {
            Ok(Some(id)) => ActionEffect::Created(id),
            Ok(None) => ActionEffect::None,
            Err(error) => {
                self.notices.report(&error);
                ActionEffect::None
            }
        }
    }

    fn delete(&mut self, id: AnnotationId) -> ActionEffect {
        if self.store.delete(id).is_none() {
            log::debug!("{}", AnnotatorError::StaleUpdateTarget(id));
            return ActionEffect::None;
        }
        if self.comment_editor.open_id() == Some(id) {
            self.comment_editor.cancel();
        }
        self.notices.push(Notice::annotation_removed());
        ActionEffect::Deleted(id)
    }

    fn toggle_comment(&mut self, id: AnnotationId) {
        match self.store.get(id).map(|annotation| annotation.kind()) {
            Some(AnnotationKind::Comment { content, .. }) => {
                self.comment_editor.toggle(id, content);
            }
            Some(_) => log::debug!("annotation {id} is not a comment"),
            None => log::debug!("{}", AnnotatorError::StaleUpdateTarget(id)),
        }
    }

    fn reset_document(&mut self) {
        self.store.clear();
        self.tools.reset();
        self.signature_pad.clear();
        self.comment_editor.cancel();
        self.navigator.reset();
    }
}

fn is_pdf_mime(mime: &str) -> bool {
    mime.split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(PDF_MIME))
}

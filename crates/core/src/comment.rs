//! Inline comment editor
//!
//! At most one comment is being edited across the whole view. The draft text
//! lives here until it is saved into the store.

use crate::annotation::{AnnotationId, AnnotationPatch};
use crate::store::AnnotationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenComment {
    id: AnnotationId,
    draft: String,
}

/// Editor state bound to zero or one comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentEditor {
    open: Option<OpenComment>,
}

impl CommentEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the editor to `id`, seeding the draft with its current content
    ///
    /// Replaces any previous binding; unsaved text for the previous comment is
    /// discarded.
    pub fn open(&mut self, id: AnnotationId, current: &str) {
        self.open = Some(OpenComment { id, draft: current.to_owned() });
    }

    /// Marker click: open for `id`, or close when already open for it
    pub fn toggle(&mut self, id: AnnotationId, current: &str) {
        if self.open_id() == Some(id) {
            self.cancel();
        } else {
            self.open(id, current);
        }
    }

    /// Replace the draft text; ignored when the editor is closed
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(open) = self.open.as_mut() {
            open.draft = text.into();
        }
    }

    /// Commit the draft to the store and close
    ///
    /// Returns the ID that was written, or `None` when the editor was closed
    /// or the comment no longer exists.
    pub fn save(&mut self, store: &mut AnnotationStore) -> Option<AnnotationId> {
        let OpenComment { id, draft } = self.open.take()?;
        store.update(id, AnnotationPatch::Content(draft)).then_some(id)
    }

    /// Close without writing
    pub fn cancel(&mut self) {
        self.open = None;
    }

    pub fn open_id(&self) -> Option<AnnotationId> {
        self.open.as_ref().map(|open| open.id)
    }

    pub fn draft(&self) -> Option<&str> {
        self.open.as_ref().map(|open| open.draft.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

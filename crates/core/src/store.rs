//! In-memory annotation store for one loaded document

use crate::annotation::{Annotation, AnnotationId, AnnotationPatch, NewAnnotation};
use std::collections::HashMap;

/// Ordered collection of annotations
///
/// Records are kept in creation order across the whole document, with a
/// per-page index for rendering.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    /// All annotations indexed by ID
    annotations: HashMap<AnnotationId, Annotation>,

    /// Creation order across the document
    order: Vec<AnnotationId>,

    /// Creation order per page
    by_page: HashMap<u32, Vec<AnnotationId>>,
}

impl AnnotationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with a fresh ID and append it
    pub fn create(&mut self, fields: NewAnnotation) -> &Annotation {
        let annotation = Annotation::new(fields);
        let id = annotation.id();
        self.insert(annotation);
        log::debug!("created annotation {id}");
        &self.annotations[&id]
    }

    /// Merge a patch into the record with `id`
    ///
    /// Returns `false` when no record has that ID or when the patch does not
    /// apply to the record's kind. Neither case is an error.
    pub fn update(&mut self, id: AnnotationId, patch: AnnotationPatch) -> bool {
        let Some(annotation) = self.annotations.get_mut(&id) else {
            log::debug!("ignoring update for unknown annotation {id}");
            return false;
        };

        let applied = annotation.apply_patch(patch);
        if !applied {
            log::debug!("patch does not apply to {} annotation {id}", annotation.tool());
        }
        applied
    }

    /// Remove the record with `id`, if present
    pub fn delete(&mut self, id: AnnotationId) -> Option<Annotation> {
        let annotation = self.annotations.remove(&id)?;
        self.order.retain(|&other| other != id);

        let page = annotation.page_number();
        if let Some(page_annotations) = self.by_page.get_mut(&page) {
            page_annotations.retain(|&other| other != id);
            if page_annotations.is_empty() {
                self.by_page.remove(&page);
            }
        }

        log::debug!("deleted annotation {id}");
        Some(annotation)
    }

    /// Annotations on `page_number` in creation order
    pub fn list_for_page(&self, page_number: u32) -> Vec<&Annotation> {
        self.by_page
            .get(&page_number)
            .map(|ids| ids.iter().filter_map(|id| self.annotations.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get an annotation by ID
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Iterate all annotations in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.order.iter().filter_map(|id| self.annotations.get(id))
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Remove every annotation
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.order.clear();
        self.by_page.clear();
    }

    /// Replace the contents with previously exported records
    ///
    /// Records repeating an ID already restored are dropped. Returns the number
    /// of records kept.
    pub fn restore(&mut self, annotations: Vec<Annotation>) -> usize {
        self.clear();
        for annotation in annotations {
            if self.annotations.contains_key(&annotation.id()) {
                log::warn!("dropping duplicate annotation {}", annotation.id());
                continue;
            }
            self.insert(annotation);
        }
        self.len()
    }

    fn insert(&mut self, annotation: Annotation) {
        let id = annotation.id();
        self.by_page.entry(annotation.page_number()).or_default().push(id);
        self.order.push(id);
        self.annotations.insert(id, annotation);
    }
}

//! Page and zoom state for the open document

use crate::config::AnnotatorConfig;

/// Current page, page count, and zoom scale
///
/// `current_page` stays within `[1, total_pages]` and `scale` within the
/// configured bounds after every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigator {
    current_page: u32,
    total_pages: u32,
    scale: f32,
    min_scale: f32,
    max_scale: f32,
    zoom_step: f32,
}

impl Navigator {
    pub fn new(config: &AnnotatorConfig) -> Self {
        let (min_scale, max_scale) = config.scale_bounds();
        let zoom_step = if config.zoom_step.is_finite() && config.zoom_step > 0.0 {
            config.zoom_step
        } else {
            AnnotatorConfig::default().zoom_step
        };
        Self {
            current_page: 1,
            total_pages: 0,
            scale: config.clamp_scale(1.0),
            min_scale,
            max_scale,
            zoom_step,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Zoom as a whole percentage, e.g. `130` for a scale of 1.3
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Record the page count of a freshly loaded document and go to page 1
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
        self.current_page = 1;
    }

    /// Back to page 1 of nothing at 100% zoom
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.total_pages = 0;
        self.scale = self.clamp_scale(1.0);
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page.max(1).min(self.total_pages.max(1));
    }

    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages {
            self.current_page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = self.clamp_scale(scale);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(round_step(self.scale + self.zoom_step));
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(round_step(self.scale - self.zoom_step));
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_nan() {
            return self.min_scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }
}

// Keeps repeated zoom steps on the 0.01 grid instead of accumulating drift.
fn round_step(scale: f32) -> f32 {
    (scale * 100.0).round() / 100.0
}

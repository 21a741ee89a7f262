//! Active tool and stroke color selection

use crate::annotation::{AnnotationTool, Color};

/// Which tool (if any) is armed and which color region tools draw with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolState {
    active: Option<AnnotationTool>,
    color: Color,
}

impl ToolState {
    pub fn new(color: Color) -> Self {
        Self { active: None, color }
    }

    pub fn active(&self) -> Option<AnnotationTool> {
        self.active
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Arm `tool`, or disarm it when it is already the active tool
    pub fn select(&mut self, tool: AnnotationTool) {
        self.active = if self.active == Some(tool) { None } else { Some(tool) };
    }

    /// Disarm whatever tool is active
    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_active_tool_deactivates_it() {
        let mut tools = ToolState::new(Color::YELLOW);
        tools.select(AnnotationTool::Highlight);
        assert_eq!(tools.active(), Some(AnnotationTool::Highlight));

        tools.select(AnnotationTool::Highlight);
        assert_eq!(tools.active(), None);
    }

    #[test]
    fn test_selecting_other_tool_switches() {
        let mut tools = ToolState::new(Color::YELLOW);
        tools.select(AnnotationTool::Comment);
        tools.select(AnnotationTool::Signature);
        assert_eq!(tools.active(), Some(AnnotationTool::Signature));
    }

    #[test]
    fn test_color_survives_tool_changes() {
        let mut tools = ToolState::new(Color::YELLOW);
        tools.set_color(Color::PURPLE);
        tools.select(AnnotationTool::Underline);
        tools.reset();
        assert_eq!(tools.color(), Color::PURPLE);
        assert_eq!(tools.active(), None);
    }
}

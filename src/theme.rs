//! Centralized theme and styling constants for the editor canvas
//!
//! Single source of truth for colors used by the canvas renderer.

use egui::Color32;

use crate::nodes::NodeKind;

/// Color palette for the editor
pub struct Colors {
    // Canvas
    pub background: Color32,
    pub grid: Color32,

    // Wires
    pub connection: Color32,
    pub drag_line: Color32,

    // Nodes
    pub node_body: Color32,
    pub node_label: Color32,
    pub header_input: Color32,
    pub header_math: Color32,
    pub header_output: Color32,

    // Sockets
    pub socket: Color32,
    pub hover_highlight: Color32,
}

impl Colors {
    /// Get the default color palette
    pub fn default() -> Self {
        Self {
            background: Color32::from_rgba_unmultiplied(15, 15, 20, 242),
            grid: Color32::from_rgb(34, 34, 34),

            connection: Color32::from_rgb(136, 136, 136),
            drag_line: Color32::WHITE,

            node_body: Color32::from_rgb(51, 51, 51),
            node_label: Color32::WHITE,
            header_input: Color32::from_rgb(74, 144, 226),
            header_math: Color32::from_rgb(245, 166, 35),
            header_output: Color32::from_rgb(126, 211, 33),

            socket: Color32::from_rgb(102, 102, 102),
            hover_highlight: Color32::from_rgb(120, 170, 255),
        }
    }

    /// Header band color for a node kind
    pub fn header(&self, kind: &NodeKind) -> Color32 {
        match kind {
            NodeKind::Input => self.header_input,
            NodeKind::Math(_) => self.header_math,
            NodeKind::Output => self.header_output,
        }
    }
}

/// Complete theme containing all styling constants
pub struct Theme {
    pub colors: Colors,
}

impl Theme {
    /// Get the default theme
    pub fn default() -> Self {
        Self {
            colors: Colors::default(),
        }
    }
}

/// Global theme instance
static GLOBAL_THEME: std::sync::LazyLock<Theme> = std::sync::LazyLock::new(|| Theme::default());

/// Get the global theme
pub fn theme() -> &'static Theme {
    &GLOBAL_THEME
}

pub fn colors() -> &'static Colors {
    &theme().colors
}

//! CPU rendering for the 2D canvas node editor
//!
//! Everything is drawn in canvas coordinates offset by the painter's origin,
//! so the layout matches hit-testing exactly.

use egui::epaint::{CubicBezierShape, StrokeKind};
use egui::{Align2, FontId, Pos2, Rect, Shape, Stroke, Vec2};

use super::hit_test::{Hit, SocketHit};
use crate::constants;
use crate::nodes::{Node, NodeGraph, NodeKind, PortType};
use crate::theme;

/// Draws the graph, wires and the in-progress connection drag
pub struct CanvasRenderer {
    grid_spacing: f32,
}

impl CanvasRenderer {
    pub fn new(grid_spacing: f32) -> Self {
        Self { grid_spacing }
    }

    /// Render one frame of the canvas into `rect`
    pub fn render(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        graph: &NodeGraph,
        hovered: Option<Hit>,
        drag_line: Option<(Pos2, Pos2)>,
    ) {
        let origin = rect.min.to_vec2();
        let colors = theme::colors();

        painter.rect_filled(rect, 0.0, colors.background);
        for (a, b) in grid_lines(rect.size(), self.grid_spacing) {
            painter.line_segment([a + origin, b + origin], Stroke::new(1.0, colors.grid));
        }

        for connection in graph.connections() {
            let from = graph.socket_anchor(connection.from_node, PortType::Output, connection.from_port);
            let to = graph.socket_anchor(connection.to_node, PortType::Input, connection.to_port);
            if let (Some(from), Some(to)) = (from, to) {
                painter.add(Shape::CubicBezier(CubicBezierShape::from_points_stroke(
                    connection_curve(from + origin, to + origin),
                    false,
                    egui::Color32::TRANSPARENT,
                    Stroke::new(constants::canvas::WIRE_WIDTH, colors.connection),
                )));
            }
        }

        // Straight preview line from the origin socket to the pointer, under the nodes
        if let Some((from, to)) = drag_line {
            painter.line_segment(
                [from + origin, to + origin],
                Stroke::new(constants::canvas::WIRE_WIDTH, colors.drag_line),
            );
        }

        for node in graph.nodes() {
            let hover = hovered.filter(|h| h.node() == node.id);
            Self::render_node(painter, node, origin, hover);
        }
    }

    fn render_node(painter: &egui::Painter, node: &Node, origin: Vec2, hover: Option<Hit>) {
        let colors = theme::colors();
        let body = node.get_rect().translate(origin);

        painter.rect_filled(body, 4.0, colors.node_body);
        let header = Rect::from_min_size(body.min, Vec2::new(body.width(), constants::node::HEADER_HEIGHT));
        painter.rect_filled(header, 4.0, colors.header(&node.kind));

        painter.text(
            header.left_center() + Vec2::new(6.0, 0.0),
            Align2::LEFT_CENTER,
            &node.title,
            FontId::proportional(12.0),
            colors.node_label,
        );

        if node.kind == NodeKind::Input {
            painter.text(
                body.center_bottom() - Vec2::new(0.0, 12.0),
                Align2::CENTER_CENTER,
                format_value(node.value),
                FontId::monospace(11.0),
                colors.node_label,
            );
        }

        for role in [PortType::Input, PortType::Output] {
            for port in 0..node.socket_count(role) {
                let Some(anchor) = node.socket_anchor(role, port) else {
                    continue;
                };
                let center = anchor + origin;
                painter.circle_filled(center, constants::socket::DRAW_RADIUS, colors.socket);

                let this = Hit::Socket(SocketHit { node: node.id, role, port });
                if hover == Some(this) {
                    painter.circle_stroke(
                        center,
                        constants::socket::DRAW_RADIUS + 2.0,
                        Stroke::new(1.5, colors.hover_highlight),
                    );
                }
            }
        }

        if hover == Some(Hit::Body(node.id)) {
            painter.rect_stroke(
                body,
                4.0,
                Stroke::new(1.0, colors.hover_highlight),
                StrokeKind::Outside,
            );
        }
    }
}

impl Default for CanvasRenderer {
    fn default() -> Self {
        Self::new(constants::canvas::GRID_SPACING)
    }
}

/// Cubic curve between two anchors with horizontal tangents
pub fn connection_curve(from: Pos2, to: Pos2) -> [Pos2; 4] {
    let offset = Vec2::new(constants::canvas::CURVE_CONTROL_OFFSET, 0.0);
    [from, from + offset, to - offset, to]
}

/// Grid segments covering a canvas of `size`, vertical lines first
pub fn grid_lines(size: Vec2, spacing: f32) -> Vec<(Pos2, Pos2)> {
    if spacing <= 0.0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut x = 0.0;
    while x <= size.x {
        lines.push((Pos2::new(x, 0.0), Pos2::new(x, size.y)));
        x += spacing;
    }
    let mut y = 0.0;
    while y <= size.y {
        lines.push((Pos2::new(0.0, y), Pos2::new(size.x, y)));
        y += spacing;
    }
    lines
}

/// Value label shown on INPUT nodes
pub fn format_value(value: f32) -> String {
    format!("{:.2}", value)
}

//! Node types and core node functionality

use std::collections::HashMap;

use egui::{Pos2, Rect, Vec2};

use super::math::MathOp;
use super::port::{InputSocket, OutputSocket, PortId, PortType};
use crate::constants;

/// Unique identifier for a node
pub type NodeId = usize;

/// What a node does when the graph is evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Source node fed by an external binding or a constant parameter
    Input,
    /// Operator over its upstream inputs
    Math(MathOp),
    /// Sink whose value is exported under its binding key
    Output,
}

impl NodeKind {
    /// Short tag used in logs and the node header
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Input => "INPUT",
            NodeKind::Math(_) => "MATH",
            NodeKind::Output => "OUTPUT",
        }
    }
}

/// Core node structure representing a visual node in the graph
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Display label, free to change without affecting bindings
    pub title: String,
    pub kind: NodeKind,
    /// External binding key (audio band or parameter name)
    pub binding: Option<String>,
    pub position: Pos2,
    pub size: Vec2,
    pub inputs: Vec<InputSocket>,
    pub outputs: Vec<OutputSocket>,
    /// Output of the most recent evaluation
    pub value: f32,
    pub params: HashMap<String, f32>,
}

impl Node {
    /// Creates a new node without sockets
    pub fn new(id: NodeId, title: impl Into<String>, kind: NodeKind, position: Pos2) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            binding: None,
            position,
            size: Vec2::new(constants::node::WIDTH, constants::node::HEIGHT),
            inputs: vec![],
            outputs: vec![],
            value: 0.0,
            params: HashMap::new(),
        }
    }

    /// Adds an input socket on the left edge, below the existing ones
    pub fn add_input(&mut self, name: impl Into<String>) -> &mut Self {
        let offset = Vec2::new(0.0, Self::socket_y(self.inputs.len()));
        self.inputs.push(InputSocket::new(name, offset));
        self
    }

    /// Adds an output socket on the right edge, below the existing ones
    pub fn add_output(&mut self, name: impl Into<String>) -> &mut Self {
        let offset = Vec2::new(self.size.x, Self::socket_y(self.outputs.len()));
        self.outputs.push(OutputSocket::new(name, offset));
        self
    }

    fn socket_y(index: usize) -> f32 {
        constants::node::SOCKET_START_Y + index as f32 * constants::node::SOCKET_SPACING
    }

    /// Sets the external binding key
    pub fn with_binding(mut self, key: impl Into<String>) -> Self {
        self.binding = Some(key.into());
        self
    }

    /// Sets a named parameter
    pub fn with_param(mut self, key: impl Into<String>, value: f32) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Changes the display label only
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn param(&self, key: &str) -> Option<f32> {
        self.params.get(key).copied()
    }

    /// Returns the bounding rectangle of the node
    pub fn get_rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    /// Strict interior test, edges excluded
    pub fn body_contains(&self, point: Pos2) -> bool {
        point.x > self.position.x
            && point.x < self.position.x + self.size.x
            && point.y > self.position.y
            && point.y < self.position.y + self.size.y
    }

    /// Number of sockets with the given role
    pub fn socket_count(&self, role: PortType) -> usize {
        match role {
            PortType::Input => self.inputs.len(),
            PortType::Output => self.outputs.len(),
        }
    }

    /// World-space anchor of a socket, recomputed from the current position
    pub fn socket_anchor(&self, role: PortType, port: PortId) -> Option<Pos2> {
        let offset = match role {
            PortType::Input => self.inputs.get(port)?.offset,
            PortType::Output => self.outputs.get(port)?.offset,
        };
        Some(self.position + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn math_node() -> Node {
        let mut node = Node::new(3, "Multiply", NodeKind::Math(MathOp::Multiply), Pos2::new(300.0, 150.0));
        node.add_input("A").add_input("B").add_output("Out");
        node
    }

    #[test]
    fn test_socket_layout() {
        let node = math_node();
        assert_eq!(node.inputs[0].offset, Vec2::new(0.0, 30.0));
        assert_eq!(node.inputs[1].offset, Vec2::new(0.0, 50.0));
        assert_eq!(node.outputs[0].offset, Vec2::new(120.0, 30.0));
    }

    #[test]
    fn test_socket_anchor_follows_position() {
        let mut node = math_node();
        assert_eq!(node.socket_anchor(PortType::Input, 1), Some(Pos2::new(300.0, 200.0)));
        node.position += Vec2::new(50.0, -20.0);
        assert_eq!(node.socket_anchor(PortType::Input, 1), Some(Pos2::new(350.0, 180.0)));
        assert_eq!(node.socket_anchor(PortType::Output, 0), Some(Pos2::new(470.0, 160.0)));
        assert_eq!(node.socket_anchor(PortType::Output, 1), None);
    }

    #[test]
    fn test_body_contains_is_strict() {
        let node = math_node();
        assert!(node.body_contains(Pos2::new(310.0, 160.0)));
        assert!(!node.body_contains(Pos2::new(300.0, 160.0)));
        assert!(!node.body_contains(Pos2::new(420.0, 160.0)));
        assert!(!node.body_contains(Pos2::new(310.0, 230.0)));
    }

    #[test]
    fn test_rename_keeps_binding() {
        let mut node = Node::new(1, "uDepthStrength", NodeKind::Output, Pos2::ZERO)
            .with_binding("uDepthStrength");
        node.set_title("Depth");
        assert_eq!(node.title, "Depth");
        assert_eq!(node.binding.as_deref(), Some("uDepthStrength"));
    }
}

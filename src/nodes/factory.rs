//! Node factory: per-kind metadata and the editor's default topology

use egui::Pos2;
use log::info;

use super::graph::NodeGraph;
use super::math::MathOp;
use super::node::{Node, NodeKind};
use crate::constants::eval::CONSTANT_PARAM;

/// Socket names shared by every node of one kind
#[derive(Debug, Clone, Copy)]
pub struct NodeMetadata {
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
}

/// Builds nodes with the socket layout of their kind
pub struct NodeFactory;

impl NodeFactory {
    /// Socket layout for a node kind
    pub fn metadata(kind: &NodeKind) -> NodeMetadata {
        match kind {
            NodeKind::Input => NodeMetadata {
                inputs: &[],
                outputs: &["Val"],
            },
            NodeKind::Math(_) => NodeMetadata {
                inputs: &["A", "B"],
                outputs: &["Out"],
            },
            NodeKind::Output => NodeMetadata {
                inputs: &["Val"],
                outputs: &[],
            },
        }
    }

    /// Create a node instance at the given position
    pub fn create(title: impl Into<String>, kind: NodeKind, position: Pos2) -> Node {
        let meta = Self::metadata(&kind);
        let mut node = Node::new(0, title, kind, position);
        for &name in meta.inputs {
            node.add_input(name);
        }
        for &name in meta.outputs {
            node.add_output(name);
        }
        node
    }

    /// Input node bound to `key`, which is also its title
    pub fn input(key: &str, position: Pos2) -> Node {
        Self::create(key, NodeKind::Input, position).with_binding(key)
    }

    /// Unbound input node emitting a constant
    pub fn constant(title: &str, value: f32, position: Pos2) -> Node {
        Self::create(title, NodeKind::Input, position).with_param(CONSTANT_PARAM, value)
    }

    /// Math node titled with its operator tag
    pub fn math(op: MathOp, position: Pos2) -> Node {
        let title = op.tag().to_string();
        Self::create(title, NodeKind::Math(op), position)
    }

    /// Output node exporting under `key`, which is also its title
    pub fn output(key: &str, position: Pos2) -> Node {
        Self::create(key, NodeKind::Output, position).with_binding(key)
    }

    /// The graph the editor starts with: `Audio Low * Value -> uDepthStrength`
    pub fn default_graph() -> NodeGraph {
        let mut graph = NodeGraph::new();
        let audio_low = graph.add_node(Self::input("Audio Low", Pos2::new(50.0, 100.0)));
        let multiply = graph.add_node(Self::math(MathOp::Multiply, Pos2::new(300.0, 150.0)));
        let value = graph.add_node(Self::constant("Value", 2.0, Pos2::new(50.0, 250.0)));
        let depth = graph.add_node(Self::output("uDepthStrength", Pos2::new(600.0, 150.0)));

        let wiring = [
            (audio_low, 0, multiply, 0),
            (value, 0, multiply, 1),
            (multiply, 0, depth, 0),
        ];
        for (from, from_port, to, to_port) in wiring {
            if let Err(e) = graph.connect(from, from_port, to, to_port) {
                log::error!("Default graph wiring failed: {}", e);
            }
        }
        info!(
            "Built default graph with {} nodes and {} connections",
            graph.len(),
            graph.connections().len()
        );
        graph
    }
}

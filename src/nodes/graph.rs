//! Node graph data structures and operations
//!
//! Nodes are stored in a `Vec` and that order is the evaluation order. A
//! connection is recorded twice: as `connected_to` on the input socket and as
//! an entry in the source output socket's `connections`. Every mutation here
//! keeps both records in step.

use egui::{Pos2, Vec2};
use log::debug;
use thiserror::Error;

use super::node::{Node, NodeId};
use super::port::{PortId, PortType, SocketRef};
use crate::constants;

/// Errors raised by graph mutations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("node {node} has no {role:?} socket {port}")]
    SocketOutOfRange {
        node: NodeId,
        role: PortType,
        port: PortId,
    },
    #[error("cannot connect node {0} to itself")]
    SelfConnection(NodeId),
    #[error("connection {from:?} -> {to:?} is recorded on one side only")]
    Asymmetric { from: SocketRef, to: SocketRef },
}

/// A directed link from an output socket to an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_port: PortId,
    pub to_node: NodeId,
    pub to_port: PortId,
}

impl Connection {
    /// Creates a new connection
    pub fn new(from_node: NodeId, from_port: PortId, to_node: NodeId, to_port: PortId) -> Self {
        Self {
            from_node,
            from_port,
            to_node,
            to_port,
        }
    }

    pub fn source(&self) -> SocketRef {
        SocketRef::new(self.from_node, self.from_port)
    }

    pub fn target(&self) -> SocketRef {
        SocketRef::new(self.to_node, self.to_port)
    }
}

/// A graph containing nodes and their connections
#[derive(Debug, Clone)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    next_node_id: NodeId,
}

impl NodeGraph {
    /// Creates a new empty node graph
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            next_node_id: constants::node::FIRST_ID,
        }
    }

    /// Adds a node at the end of the evaluation order and returns its ID
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.next_node_id;
        node.id = id;
        self.nodes.push(node);
        self.next_node_id += 1;
        id
    }

    /// Nodes in evaluation order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Position of a node in the evaluation order
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub(crate) fn node_at(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub(crate) fn node_at_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    /// Finds a node by its display title (first match in evaluation order)
    pub fn find_by_title(&self, title: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.title == title).map(|n| n.id)
    }

    /// Moves a node to `index` in the evaluation order, clamped to the end
    pub fn set_evaluation_index(&mut self, id: NodeId, index: usize) -> Result<(), GraphError> {
        let from = self.index_of(id).ok_or(GraphError::NodeNotFound(id))?;
        let node = self.nodes.remove(from);
        let to = index.min(self.nodes.len());
        self.nodes.insert(to, node);
        Ok(())
    }

    /// Connects `from_node.outputs[from_port]` to `to_node.inputs[to_port]`.
    ///
    /// An input holds at most one upstream: an existing connection is replaced
    /// and its record on the old source is removed. Returns the replaced
    /// upstream, if any.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<Option<SocketRef>, GraphError> {
        if from_node == to_node {
            return Err(GraphError::SelfConnection(from_node));
        }
        self.check_socket(from_node, PortType::Output, from_port)?;
        self.check_socket(to_node, PortType::Input, to_port)?;

        let replaced = self.disconnect_input(to_node, to_port)?;

        let target = SocketRef::new(to_node, to_port);
        let source = SocketRef::new(from_node, from_port);
        if let Some(node) = self.node_mut(to_node) {
            node.inputs[to_port].connected_to = Some(source);
        }
        if let Some(node) = self.node_mut(from_node) {
            node.outputs[from_port].connections.push(target);
        }

        debug!(
            "Connected {}:{} -> {}:{}{}",
            from_node,
            from_port,
            to_node,
            to_port,
            replaced
                .map(|r| format!(" (replaced {}:{})", r.node, r.port))
                .unwrap_or_default()
        );
        Ok(replaced)
    }

    /// Helper to connect with a `Connection` value
    pub fn add_connection(&mut self, connection: Connection) -> Result<Option<SocketRef>, GraphError> {
        self.connect(
            connection.from_node,
            connection.from_port,
            connection.to_node,
            connection.to_port,
        )
    }

    /// Removes the upstream connection of an input socket from both endpoints
    pub fn disconnect_input(&mut self, node: NodeId, port: PortId) -> Result<Option<SocketRef>, GraphError> {
        self.check_socket(node, PortType::Input, port)?;
        let target = SocketRef::new(node, port);
        let previous = self
            .node_mut(node)
            .and_then(|n| n.inputs[port].connected_to.take());

        if let Some(source) = previous {
            if let Some(output) = self
                .node_mut(source.node)
                .and_then(|n| n.outputs.get_mut(source.port))
            {
                output.connections.retain(|c| *c != target);
            }
        }
        Ok(previous)
    }

    fn check_socket(&self, node: NodeId, role: PortType, port: PortId) -> Result<(), GraphError> {
        let n = self.node(node).ok_or(GraphError::NodeNotFound(node))?;
        if port >= n.socket_count(role) {
            return Err(GraphError::SocketOutOfRange { node, role, port });
        }
        Ok(())
    }

    /// Sets a node's position, unconstrained
    pub fn move_node(&mut self, id: NodeId, position: Pos2) -> Result<(), GraphError> {
        let node = self.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        node.position = position;
        Ok(())
    }

    /// Offsets a node's position by `delta`
    pub fn translate_node(&mut self, id: NodeId, delta: Vec2) -> Result<(), GraphError> {
        let node = self.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        node.position += delta;
        Ok(())
    }

    /// World-space socket anchor
    pub fn socket_anchor(&self, node: NodeId, role: PortType, port: PortId) -> Option<Pos2> {
        self.node(node)?.socket_anchor(role, port)
    }

    /// All connections, read from the input side in evaluation order
    pub fn connections(&self) -> Vec<Connection> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.inputs.iter().enumerate().filter_map(move |(port, input)| {
                    input
                        .connected_to
                        .map(|src| Connection::new(src.node, src.port, node.id, port))
                })
            })
            .collect()
    }

    /// Upstream of an input socket
    pub fn upstream_of(&self, node: NodeId, port: PortId) -> Option<SocketRef> {
        self.node(node)?.inputs.get(port)?.connected_to
    }

    /// Verifies that every connection is recorded on both endpoints
    pub fn check_consistency(&self) -> Result<(), GraphError> {
        for node in &self.nodes {
            for (port, input) in node.inputs.iter().enumerate() {
                let Some(source) = input.connected_to else {
                    continue;
                };
                let target = SocketRef::new(node.id, port);
                let recorded = self
                    .node(source.node)
                    .and_then(|n| n.outputs.get(source.port))
                    .is_some_and(|out| out.feeds(target));
                if !recorded {
                    return Err(GraphError::Asymmetric { from: source, to: target });
                }
            }
            for (port, output) in node.outputs.iter().enumerate() {
                let source = SocketRef::new(node.id, port);
                for &target in &output.connections {
                    let recorded = self
                        .node(target.node)
                        .and_then(|n| n.inputs.get(target.port))
                        .is_some_and(|inp| inp.connected_to == Some(source));
                    if !recorded {
                        return Err(GraphError::Asymmetric { from: source, to: target });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

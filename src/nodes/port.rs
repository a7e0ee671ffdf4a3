//! Socket types and functionality for node connections

use egui::Vec2;

use super::node::NodeId;

/// Index of a socket within its node's input or output list
pub type PortId = usize;

/// Role of a socket (input or output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    Input,
    Output,
}

impl PortType {
    /// The role a connection drag from this socket must land on
    pub fn opposite(self) -> Self {
        match self {
            PortType::Input => PortType::Output,
            PortType::Output => PortType::Input,
        }
    }
}

/// Reference to one socket of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketRef {
    pub node: NodeId,
    pub port: PortId,
}

impl SocketRef {
    pub fn new(node: NodeId, port: PortId) -> Self {
        Self { node, port }
    }
}

/// Input socket: accepts at most one upstream connection
#[derive(Debug, Clone)]
pub struct InputSocket {
    pub name: String,
    /// Offset of the anchor from the node origin
    pub offset: Vec2,
    /// Upstream output socket, if connected
    pub connected_to: Option<SocketRef>,
}

impl InputSocket {
    /// Creates an unconnected input socket
    pub fn new(name: impl Into<String>, offset: Vec2) -> Self {
        Self {
            name: name.into(),
            offset,
            connected_to: None,
        }
    }
}

/// Output socket: feeds zero or more downstream inputs
#[derive(Debug, Clone)]
pub struct OutputSocket {
    pub name: String,
    /// Offset of the anchor from the node origin
    pub offset: Vec2,
    /// Downstream input sockets fed by this output
    pub connections: Vec<SocketRef>,
}

impl OutputSocket {
    /// Creates an output socket with no downstream connections
    pub fn new(name: impl Into<String>, offset: Vec2) -> Self {
        Self {
            name: name.into(),
            offset,
            connections: Vec::new(),
        }
    }

    /// Whether this output feeds the given input socket
    pub fn feeds(&self, target: SocketRef) -> bool {
        self.connections.contains(&target)
    }
}

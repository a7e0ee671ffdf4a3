//! Node interaction handling (dragging, connections)
//!
//! Pointer events drive a three-state machine. Only `Idle` accepts a
//! pointer-down; every pointer-up returns to `Idle`.

use egui::{Pos2, Vec2};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::hit_test::{self, Hit, SocketHit};
use crate::constants;
use crate::nodes::{Connection, NodeGraph, NodeId, PortId, PortType};

/// Pointer input in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
}

/// How a released connection drag picks its target sockets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseScan {
    /// Connect every opposite-role socket within the connect radius, in scan
    /// order. For an input origin each match replaces the previous one, so
    /// the last socket scanned wins.
    #[default]
    Exhaustive,
    /// Connect only the first socket found
    FirstMatch,
}

/// Current pointer-driven mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    DraggingNode {
        node: NodeId,
        /// Pointer position minus node origin at grab time
        offset: Vec2,
    },
    Connecting {
        origin: SocketHit,
    },
}

/// Manages pointer interaction with the graph
#[derive(Debug, Clone)]
pub struct InteractionManager {
    state: InteractionState,
    pointer: Pos2,
    hovered: Option<Hit>,
    detect_radius: f32,
    connect_radius: f32,
    release_scan: ReleaseScan,
}

impl InteractionManager {
    /// Creates a new interaction manager
    pub fn new(detect_radius: f32, connect_radius: f32, release_scan: ReleaseScan) -> Self {
        Self {
            state: InteractionState::Idle,
            pointer: Pos2::ZERO,
            hovered: None,
            detect_radius,
            connect_radius,
            release_scan,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn pointer(&self) -> Pos2 {
        self.pointer
    }

    /// Socket or node under the pointer, for highlighting
    pub fn hovered(&self) -> Option<Hit> {
        self.hovered
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    /// Origin socket of an in-progress connection drag
    pub fn connecting_from(&self) -> Option<SocketHit> {
        match self.state {
            InteractionState::Connecting { origin } => Some(origin),
            _ => None,
        }
    }

    /// Origin anchor and pointer while connecting
    pub fn drag_line(&self, graph: &NodeGraph) -> Option<(Pos2, Pos2)> {
        let origin = self.connecting_from()?;
        let anchor = graph.socket_anchor(origin.node, origin.role, origin.port)?;
        Some((anchor, self.pointer))
    }

    /// Dispatches one pointer event. Returns connections made on release.
    pub fn handle(&mut self, event: PointerEvent, graph: &mut NodeGraph) -> Vec<Connection> {
        match event {
            PointerEvent::Down(pos) => {
                self.pointer_down(pos, graph);
                Vec::new()
            }
            PointerEvent::Move(pos) => {
                self.pointer_move(pos, graph);
                Vec::new()
            }
            PointerEvent::Up(pos) => self.pointer_up(pos, graph),
        }
    }

    /// Starts a connection drag on a socket, or a node drag on a body
    pub fn pointer_down(&mut self, pos: Pos2, graph: &NodeGraph) {
        self.pointer = pos;
        if !self.is_idle() {
            return;
        }
        match hit_test::hit_test(graph, pos, self.detect_radius) {
            Some(Hit::Socket(origin)) => {
                trace!("Connecting from {:?}", origin);
                self.state = InteractionState::Connecting { origin };
            }
            Some(Hit::Body(node)) => {
                if let Some(n) = graph.node(node) {
                    trace!("Dragging node {}", node);
                    self.state = InteractionState::DraggingNode {
                        node,
                        offset: pos - n.position,
                    };
                }
            }
            None => {}
        }
    }

    /// Moves the dragged node, or just tracks the pointer for the drag line
    pub fn pointer_move(&mut self, pos: Pos2, graph: &mut NodeGraph) {
        self.pointer = pos;
        if let InteractionState::DraggingNode { node, offset } = self.state {
            if let Err(e) = graph.move_node(node, pos - offset) {
                warn!("Dropping drag: {}", e);
                self.state = InteractionState::Idle;
            }
        }
        self.hovered = hit_test::hit_test(graph, pos, self.detect_radius);
    }

    /// Ends any drag. A connection drag connects to opposite-role sockets
    /// within the connect radius, per the release scan policy.
    pub fn pointer_up(&mut self, pos: Pos2, graph: &mut NodeGraph) -> Vec<Connection> {
        self.pointer = pos;
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let InteractionState::Connecting { origin } = state else {
            return Vec::new();
        };

        let role = origin.role.opposite();
        let exclude = Some(origin.node);
        let candidates: Vec<SocketHit> = match self.release_scan {
            ReleaseScan::Exhaustive => {
                hit_test::sockets_within(graph, pos, role, self.connect_radius, exclude)
            }
            ReleaseScan::FirstMatch => {
                hit_test::find_socket(graph, pos, role, self.connect_radius, exclude)
                    .into_iter()
                    .collect()
            }
        };

        let mut made = Vec::new();
        for target in candidates {
            let connection = orient(origin, target);
            match graph.add_connection(connection) {
                Ok(_) => made.push(connection),
                Err(e) => warn!("Connection rejected: {}", e),
            }
        }
        if made.is_empty() {
            trace!("Connection drag from {:?} released on nothing", origin);
        } else {
            debug!("Release made {} connection(s)", made.len());
        }
        made
    }

    /// Abandons any drag without touching the graph
    pub fn cancel(&mut self) {
        self.state = InteractionState::Idle;
    }
}

impl Default for InteractionManager {
    fn default() -> Self {
        Self::new(
            constants::socket::DETECT_RADIUS,
            constants::socket::CONNECT_RADIUS,
            ReleaseScan::default(),
        )
    }
}

/// Builds an output-to-input connection from a drag origin and its target
fn orient(origin: SocketHit, target: SocketHit) -> Connection {
    let (from, to): ((NodeId, PortId), (NodeId, PortId)) = match origin.role {
        PortType::Output => ((origin.node, origin.port), (target.node, target.port)),
        PortType::Input => ((target.node, target.port), (origin.node, origin.port)),
    };
    Connection::new(from.0, from.1, to.0, to.1)
}

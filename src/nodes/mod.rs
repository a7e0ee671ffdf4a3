//! Node system - graph model, node kinds and evaluation

pub mod execution_engine;
pub mod factory;
pub mod graph;
pub mod input;
pub mod math;
pub mod node;
pub mod output;
pub mod port;

// Re-export core types
pub use execution_engine::{EvalError, EvaluationOrder, Evaluator, ExecutionStats};
pub use factory::NodeFactory;
pub use graph::{Connection, GraphError, NodeGraph};
pub use math::MathOp;
pub use node::{Node, NodeId, NodeKind};
pub use output::{Exports, OutputValue};
pub use port::{InputSocket, OutputSocket, PortId, PortType, SocketRef};

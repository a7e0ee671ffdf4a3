//! Pulsegraph core library
//!
//! A node-graph editor whose graph is re-evaluated every frame to drive
//! visual parameters from live audio bands.

pub mod bridge;
pub mod config;
pub mod constants;
pub mod editor;
pub mod nodes;
pub mod theme;

// Re-export commonly used types
pub use bridge::{AudioFeed, AudioSender, AudioSnapshot, Bridge, ParameterRegistry, ParameterStore};
pub use config::{ConfigError, EditorConfig};
pub use editor::NodeEditor;
pub use nodes::{Evaluator, NodeFactory, NodeGraph};

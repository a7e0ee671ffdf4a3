//! Output node values exported after each evaluation pass

use super::node::NodeId;

/// Value an OUTPUT node resolved this frame
#[derive(Debug, Clone, PartialEq)]
pub struct OutputValue {
    pub node: NodeId,
    /// Binding key the value is exported under
    pub key: String,
    pub value: f32,
}

/// All output values of one evaluation pass, in evaluation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exports {
    values: Vec<OutputValue>,
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId, key: impl Into<String>, value: f32) {
        self.values.push(OutputValue {
            node,
            key: key.into(),
            value,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last value exported under `key` this pass
    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.iter().rev().find(|v| v.key == key).map(|v| v.value)
    }
}

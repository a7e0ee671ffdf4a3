//! Input node evaluation
//!
//! An input node reads its binding key from the external snapshot when the key
//! is known there; otherwise it emits its `val` parameter.

use super::node::Node;
use crate::bridge::ExternalInputs;
use crate::constants::eval::{CONSTANT_PARAM, DEFAULT_CONSTANT};

/// Where an input node's value came from on the last evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputSource {
    External(f32),
    Constant(f32),
}

impl InputSource {
    pub fn value(self) -> f32 {
        match self {
            InputSource::External(v) | InputSource::Constant(v) => v,
        }
    }
}

/// Resolves the value of an input node against the current external snapshot
pub fn evaluate(node: &Node, external: &impl ExternalInputs) -> InputSource {
    if let Some(value) = node.binding.as_deref().and_then(|key| external.lookup(key)) {
        return InputSource::External(value);
    }
    InputSource::Constant(node.param(CONSTANT_PARAM).unwrap_or(DEFAULT_CONSTANT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AudioSnapshot;
    use crate::nodes::NodeKind;
    use egui::Pos2;

    fn snapshot() -> AudioSnapshot {
        AudioSnapshot { low: 0.4, mid: 0.5, high: 0.6 }
    }

    #[test]
    fn test_audio_binding() {
        let node = Node::new(1, "Bass", NodeKind::Input, Pos2::ZERO).with_binding("Audio Low");
        assert_eq!(evaluate(&node, &snapshot()), InputSource::External(0.4));
        let node = node.with_binding("Audio High");
        assert_eq!(evaluate(&node, &snapshot()), InputSource::External(0.6));
    }

    #[test]
    fn test_constant_and_default() {
        let node = Node::new(1, "Value", NodeKind::Input, Pos2::ZERO).with_param("val", 2.0);
        assert_eq!(evaluate(&node, &snapshot()), InputSource::Constant(2.0));

        let unset = Node::new(2, "Value", NodeKind::Input, Pos2::ZERO);
        assert_eq!(evaluate(&unset, &snapshot()).value(), 0.5);

        let zero = Node::new(3, "Value", NodeKind::Input, Pos2::ZERO).with_param("val", 0.0);
        assert_eq!(evaluate(&zero, &snapshot()).value(), 0.0);
    }

    #[test]
    fn test_unknown_binding_falls_back_to_constant() {
        let node = Node::new(1, "Audio Ultra", NodeKind::Input, Pos2::ZERO)
            .with_binding("Audio Ultra")
            .with_param("val", 0.25);
        assert_eq!(evaluate(&node, &snapshot()), InputSource::Constant(0.25));
    }

    #[test]
    fn test_title_is_not_a_binding() {
        let node = Node::new(1, "Audio Low", NodeKind::Input, Pos2::ZERO);
        assert_eq!(evaluate(&node, &snapshot()), InputSource::Constant(0.5));
    }
}

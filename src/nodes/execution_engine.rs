//! Node graph evaluation
//!
//! Pull evaluation: each node reads the *current* `value` of its upstream
//! nodes instead of recursing into them. Every node is visited exactly once
//! per pass, so cycles cannot loop forever.
//!
//! With `EvaluationOrder::Storage` nodes run in the graph's storage order.
//! A node whose upstream sits later in that order reads the upstream's value
//! from the previous pass: a one-pass lag per backward edge, which settles
//! on the next pass. This lag is part of the contract. `Topological` orders
//! nodes by their connections first, and falls back to storage order for any
//! pass where the graph has a cycle.

use std::collections::VecDeque;

use log::{trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::graph::NodeGraph;
use super::input;
use super::node::{Node, NodeId, NodeKind};
use super::output::Exports;
use super::port::PortId;
use crate::bridge::ExternalInputs;

/// Errors found while ordering a graph for evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("graph contains a cycle through nodes {nodes:?}")]
    InvalidGraph { nodes: Vec<NodeId> },
}

/// Order in which nodes are visited during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationOrder {
    /// Storage order, one-pass lag on backward edges
    #[default]
    Storage,
    /// Dependency order; storage order when a cycle is present
    Topological,
}

/// Counters kept across passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStats {
    pub passes: u64,
    pub nodes_evaluated: u64,
    /// Passes that fell back to storage order because of a cycle
    pub cycle_fallbacks: u64,
    /// References to missing nodes seen during the last pass
    pub unresolved_last_pass: usize,
}

/// Per-frame graph evaluator
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    order: EvaluationOrder,
    stats: ExecutionStats,
    cycle_reported: bool,
}

impl Evaluator {
    pub fn new(order: EvaluationOrder) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    pub fn order(&self) -> EvaluationOrder {
        self.order
    }

    pub fn set_order(&mut self, order: EvaluationOrder) {
        self.order = order;
        self.cycle_reported = false;
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Runs one pass: updates every node's `value` and returns the values of
    /// bound output nodes. Never fails; unresolvable inputs read as 0.
    pub fn evaluate(&mut self, graph: &mut NodeGraph, external: &impl ExternalInputs) -> Exports {
        let order = self.visit_order(graph);
        let mut exports = Exports::new();
        let mut unresolved = 0;

        for &index in &order {
            let node = graph.node_at(index);
            let value = match &node.kind {
                NodeKind::Input => input::evaluate(node, external).value(),
                NodeKind::Math(op) => {
                    let a = resolve_input(graph, node, 0, &mut unresolved);
                    let b = resolve_input(graph, node, 1, &mut unresolved);
                    op.apply(a, b)
                }
                NodeKind::Output => {
                    let value = resolve_input(graph, node, 0, &mut unresolved);
                    if let Some(key) = &node.binding {
                        exports.push(node.id, key.as_str(), value);
                    }
                    value
                }
            };
            graph.node_at_mut(index).value = value;
        }

        self.stats.passes += 1;
        self.stats.nodes_evaluated += order.len() as u64;
        self.stats.unresolved_last_pass = unresolved;
        if unresolved > 0 {
            trace!("{} unresolved input references this pass", unresolved);
        }
        exports
    }

    fn visit_order(&mut self, graph: &NodeGraph) -> Vec<usize> {
        let storage = || -> Vec<usize> { (0..graph.len()).collect() };
        match self.order {
            EvaluationOrder::Storage => storage(),
            EvaluationOrder::Topological => match topological_order(graph) {
                Ok(order) => {
                    self.cycle_reported = false;
                    order
                }
                Err(e) => {
                    if !self.cycle_reported {
                        warn!("{}; evaluating in storage order", e);
                        self.cycle_reported = true;
                    }
                    self.stats.cycle_fallbacks += 1;
                    storage()
                }
            },
        }
    }
}

/// Current value of the node feeding `node.inputs[port]`; 0 when unconnected
/// or when the referenced node is gone.
fn resolve_input(graph: &NodeGraph, node: &Node, port: PortId, unresolved: &mut usize) -> f32 {
    let Some(source) = node.inputs.get(port).and_then(|s| s.connected_to) else {
        return 0.0;
    };
    match graph.node(source.node) {
        Some(upstream) => upstream.value,
        None => {
            *unresolved += 1;
            0.0
        }
    }
}

/// Storage indices ordered so every node follows its upstream nodes. Ties keep
/// storage order.
pub fn topological_order(graph: &NodeGraph) -> Result<Vec<usize>, EvalError> {
    let nodes = graph.nodes();
    let mut indegree = vec![0usize; nodes.len()];
    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (index, node) in nodes.iter().enumerate() {
        for input in &node.inputs {
            let Some(source) = input.connected_to else {
                continue;
            };
            if let Some(from) = graph.index_of(source.node) {
                downstream[from].push(index);
                indegree[index] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &next in &downstream[index] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != nodes.len() {
        let nodes = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0)
            .map(|(i, _)| graph.node_at(i).id)
            .collect();
        return Err(EvalError::InvalidGraph { nodes });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{AudioSnapshot, ParameterRegistry, ParameterStore, Bridge};
    use crate::nodes::factory::NodeFactory;
    use crate::nodes::math::MathOp;
    use egui::Pos2;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    /// A (constant 2) and K (constant 3) feed B (multiply), B feeds C (output)
    fn chain() -> (NodeGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(NodeFactory::constant("A", 2.0, Pos2::ZERO));
        let k = graph.add_node(NodeFactory::constant("K", 3.0, Pos2::ZERO));
        let b = graph.add_node(NodeFactory::math(MathOp::Multiply, Pos2::ZERO));
        let c = graph.add_node(NodeFactory::output("uLFO", Pos2::ZERO));
        graph.connect(a, 0, b, 0).unwrap();
        graph.connect(k, 0, b, 1).unwrap();
        graph.connect(b, 0, c, 0).unwrap();
        (graph, a, k, b, c)
    }

    fn set_constant(graph: &mut NodeGraph, id: NodeId, value: f32) {
        graph.node_mut(id).unwrap().params.insert("val".into(), value);
    }

    /// Default topology with `Value` moved ahead of `Multiply`, so storage
    /// order is Audio Low, Value, Multiply, uDepthStrength
    fn scenario_graph() -> NodeGraph {
        let mut graph = NodeFactory::default_graph();
        let value = graph.find_by_title("Value").unwrap();
        graph.set_evaluation_index(value, 1).unwrap();
        graph
    }

    #[test]
    fn test_default_graph_scenario() {
        let mut graph = scenario_graph();
        let mut registry = ParameterRegistry::with_visual_defaults();
        let audio = AudioSnapshot { low: 0.4, mid: 0.0, high: 0.0 };

        let mut evaluator = Evaluator::default();
        let exports = evaluator.evaluate(&mut graph, &audio);
        Bridge::new(None).export(&exports, &mut registry);

        let multiply = graph.find_by_title("Multiply").unwrap();
        assert!(close(graph.node(multiply).unwrap().value, 0.8));
        assert!(close(exports.get("uDepthStrength").unwrap(), 0.8));
        assert!(close(registry.get("uDepthStrength").unwrap(), 0.8));
    }

    #[test]
    fn test_default_graph_lags_first_pass() {
        // Stored as Audio Low, Multiply, Value, uDepthStrength
        let mut graph = NodeFactory::default_graph();
        let audio = AudioSnapshot { low: 0.4, mid: 0.0, high: 0.0 };
        let multiply = graph.find_by_title("Multiply").unwrap();
        let mut evaluator = Evaluator::default();

        // Multiply reads Value before Value has run
        let first = evaluator.evaluate(&mut graph, &audio);
        assert_eq!(graph.node(multiply).unwrap().value, 0.0);
        assert_eq!(first.get("uDepthStrength"), Some(0.0));

        let second = evaluator.evaluate(&mut graph, &audio);
        assert!(close(graph.node(multiply).unwrap().value, 0.8));
        assert!(close(second.get("uDepthStrength").unwrap(), 0.8));
    }

    #[test]
    fn test_in_order_chain_has_no_lag() {
        let (mut graph, a, _k, _b, _c) = chain();
        let mut evaluator = Evaluator::default();
        let silence = AudioSnapshot::default();

        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(6.0));
        set_constant(&mut graph, a, 4.0);
        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(12.0));
    }

    #[test]
    fn test_backward_edge_lags_one_pass() {
        let (mut graph, a, _k, b, _c) = chain();
        // B now precedes A and K in storage order
        graph.set_evaluation_index(b, 0).unwrap();
        let mut evaluator = Evaluator::default();
        let silence = AudioSnapshot::default();

        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(0.0));
        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(6.0));

        set_constant(&mut graph, a, 4.0);
        // A's new value reaches C one pass later than in the in-order chain
        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(6.0));
        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(12.0));
    }

    #[test]
    fn test_topological_order_removes_lag() {
        let (mut graph, a, _k, b, _c) = chain();
        graph.set_evaluation_index(b, 0).unwrap();
        let mut evaluator = Evaluator::new(EvaluationOrder::Topological);
        let silence = AudioSnapshot::default();

        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(6.0));
        set_constant(&mut graph, a, 4.0);
        assert_eq!(evaluator.evaluate(&mut graph, &silence).get("uLFO"), Some(12.0));
        assert_eq!(evaluator.stats().cycle_fallbacks, 0);
    }

    #[test]
    fn test_steady_state_is_deterministic() {
        let (mut graph, _a, _k, b, _c) = chain();
        graph.set_evaluation_index(b, 0).unwrap();
        let mut evaluator = Evaluator::default();
        let audio = AudioSnapshot { low: 0.3, mid: 0.6, high: 0.9 };

        evaluator.evaluate(&mut graph, &audio);
        let first = evaluator.evaluate(&mut graph, &audio);
        let second = evaluator.evaluate(&mut graph, &audio);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cycle_terminates_and_lags() {
        let mut graph = NodeGraph::new();
        let x = graph.add_node(NodeFactory::math(MathOp::Add, Pos2::ZERO));
        let y = graph.add_node(NodeFactory::math(MathOp::Add, Pos2::ZERO));
        let one = graph.add_node(NodeFactory::constant("One", 1.0, Pos2::ZERO));
        graph.connect(y, 0, x, 0).unwrap();
        graph.connect(x, 0, y, 0).unwrap();
        graph.connect(one, 0, x, 1).unwrap();

        let mut evaluator = Evaluator::default();
        let silence = AudioSnapshot::default();
        evaluator.evaluate(&mut graph, &silence);
        // x read `one` before it was evaluated this pass
        assert_eq!(graph.node(x).unwrap().value, 0.0);
        assert_eq!(graph.node(y).unwrap().value, 0.0);
        evaluator.evaluate(&mut graph, &silence);
        assert_eq!(graph.node(x).unwrap().value, 1.0);
        assert_eq!(graph.node(y).unwrap().value, 1.0);
        evaluator.evaluate(&mut graph, &silence);
        assert_eq!(graph.node(x).unwrap().value, 2.0);
        assert_eq!(evaluator.stats().nodes_evaluated, 9);
    }

    #[test]
    fn test_topological_cycle_falls_back() {
        let mut graph = NodeGraph::new();
        let x = graph.add_node(NodeFactory::math(MathOp::Add, Pos2::ZERO));
        let y = graph.add_node(NodeFactory::math(MathOp::Add, Pos2::ZERO));
        graph.connect(y, 0, x, 0).unwrap();
        graph.connect(x, 0, y, 0).unwrap();

        assert_eq!(
            topological_order(&graph),
            Err(EvalError::InvalidGraph { nodes: vec![x, y] })
        );

        let mut evaluator = Evaluator::new(EvaluationOrder::Topological);
        evaluator.evaluate(&mut graph, &AudioSnapshot::default());
        evaluator.evaluate(&mut graph, &AudioSnapshot::default());
        assert_eq!(evaluator.stats().cycle_fallbacks, 2);
        assert_eq!(evaluator.stats().passes, 2);
    }

    #[test]
    fn test_unconnected_and_unresolved_inputs_read_zero() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(NodeFactory::constant("A", 5.0, Pos2::ZERO));
        let m = graph.add_node(NodeFactory::math(MathOp::Add, Pos2::ZERO));
        graph.connect(a, 0, m, 0).unwrap();
        // Dangling reference to a node that does not exist
        graph.node_mut(m).unwrap().inputs[1].connected_to =
            Some(crate::nodes::port::SocketRef::new(99, 0));

        let mut evaluator = Evaluator::default();
        evaluator.evaluate(&mut graph, &AudioSnapshot::default());
        assert_eq!(graph.node(m).unwrap().value, 5.0);
        assert_eq!(evaluator.stats().unresolved_last_pass, 1);
    }

    #[test]
    fn test_unrecognized_operator_evaluates_to_zero() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(NodeFactory::constant("A", 5.0, Pos2::ZERO));
        let m = graph.add_node(NodeFactory::math(MathOp::from_tag("Pow"), Pos2::ZERO));
        graph.connect(a, 0, m, 0).unwrap();
        graph.connect(a, 0, m, 1).unwrap();

        Evaluator::default().evaluate(&mut graph, &AudioSnapshot::default());
        assert_eq!(graph.node(m).unwrap().value, 0.0);
    }

    #[test]
    fn test_unbound_output_is_not_exported() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(NodeFactory::constant("A", 5.0, Pos2::ZERO));
        let mut out = NodeFactory::output("uMelt", Pos2::ZERO);
        out.binding = None;
        let o = graph.add_node(out);
        graph.connect(a, 0, o, 0).unwrap();

        let exports = Evaluator::default().evaluate(&mut graph, &AudioSnapshot::default());
        assert!(exports.is_empty());
        assert_eq!(graph.node(o).unwrap().value, 5.0);
    }
}

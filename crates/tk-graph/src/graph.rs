//! Core graph data structures.

use std::fmt;
use std::sync::Arc;

use tk_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::ops::Operator;
use crate::tensor::{TensorDesc, TensorInfo};

/// A produced tensor: output `output` of node `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueRef {
    pub node: NodeId,
    pub output: u32,
}

impl ValueRef {
    pub fn new(node: NodeId, output: u32) -> Self {
        Self { node, output }
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.output)
    }
}

/// An input slot: input `input` of node `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Consumer {
    pub node: NodeId,
    pub input: u32,
}

/// What a node does.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Graph input; one output, no inputs.
    Parameter,
    /// Graph output sink; one input, no outputs.
    Result,
    Op(Arc<dyn Operator>),
}

impl NodeKind {
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Parameter => "Parameter",
            NodeKind::Result => "Result",
            NodeKind::Op(op) => op.type_name(),
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, NodeKind::Parameter)
    }

    pub fn is_result(&self) -> bool {
        matches!(self, NodeKind::Result)
    }
}

/// A node in the computation graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Human-facing name; not used for port lookup.
    pub name: String,
    pub kind: NodeKind,
    pub inputs: Vec<ValueRef>,
    pub outputs: Vec<TensorInfo>,
}

/// Handle to a graph input (a declared parameter node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputPort {
    pub index: usize,
    pub node: NodeId,
}

impl InputPort {
    /// The tensor the parameter produces.
    pub fn value(&self) -> ValueRef {
        ValueRef::new(self.node, 0)
    }
}

/// Handle to a graph output (a declared result node and the value it sinks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputPort {
    pub index: usize,
    pub result: NodeId,
    pub source: ValueRef,
}

/// The graph: a validated, immutable arena of nodes.
///
/// The graph stores:
/// - All nodes in a vector indexed by their IDs, in topological order.
/// - The ordered graph inputs (parameters) and outputs (results).
/// - Compact adjacency: for each produced value, which input slots consume it.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) parameters: Vec<NodeId>,
    pub(crate) results: Vec<NodeId>,

    /// Node i's outputs occupy flat value slots value_offsets[i]..value_offsets[i+1].
    pub(crate) value_offsets: Vec<usize>,

    /// Flat value v's consumers are consumers[consumer_offsets[v]..consumer_offsets[v+1]].
    pub(crate) consumer_offsets: Vec<usize>,

    pub(crate) consumers: Vec<Consumer>,
}

impl Graph {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes, in topological order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    /// Declared parameter nodes, in input order.
    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    /// Declared result nodes, in output order.
    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    pub fn input_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn output_count(&self) -> usize {
        self.results.len()
    }

    pub fn inputs(&self) -> impl Iterator<Item = InputPort> + '_ {
        self.parameters
            .iter()
            .enumerate()
            .map(|(index, &node)| InputPort { index, node })
    }

    pub fn outputs(&self) -> impl Iterator<Item = OutputPort> + '_ {
        self.results
            .iter()
            .enumerate()
            .map(|(index, &result)| OutputPort {
                index,
                result,
                source: self.nodes[result.slot()].inputs[0],
            })
    }

    pub fn input_at(&self, index: usize) -> GraphResult<InputPort> {
        self.inputs().nth(index).ok_or(GraphError::PortIndexOob {
            what: "graph input",
            index,
            len: self.parameters.len(),
        })
    }

    pub fn output_at(&self, index: usize) -> GraphResult<OutputPort> {
        self.outputs().nth(index).ok_or(GraphError::PortIndexOob {
            what: "graph output",
            index,
            len: self.results.len(),
        })
    }

    /// Find the input whose tensor answers to `name`.
    pub fn input(&self, name: &str) -> GraphResult<InputPort> {
        self.inputs()
            .find(|port| self.input_tensor(port).has_name(name))
            .ok_or_else(|| GraphError::UnknownInput {
                graph: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Find the first output whose source tensor answers to `name`.
    pub fn output(&self, name: &str) -> GraphResult<OutputPort> {
        self.outputs()
            .find(|port| self.output_tensor(port).has_name(name))
            .ok_or_else(|| GraphError::UnknownOutput {
                graph: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Tensor produced by `value`, if it exists.
    pub fn tensor(&self, value: ValueRef) -> Option<&TensorInfo> {
        self.node(value.node)?.outputs.get(value.output as usize)
    }

    pub fn input_tensor(&self, port: &InputPort) -> &TensorInfo {
        &self.nodes[port.node.slot()].outputs[0]
    }

    pub fn output_tensor(&self, port: &OutputPort) -> &TensorInfo {
        let source = port.source;
        &self.nodes[source.node.slot()].outputs[source.output as usize]
    }

    pub fn input_desc(&self, port: &InputPort) -> &TensorDesc {
        &self.input_tensor(port).desc
    }

    pub fn output_desc(&self, port: &OutputPort) -> &TensorDesc {
        &self.output_tensor(port).desc
    }

    /// Name used in logs and errors: the tensor's any-name, else the node name.
    pub fn input_display_name(&self, port: &InputPort) -> &str {
        self.input_tensor(port)
            .any_name()
            .unwrap_or(&self.nodes[port.node.slot()].name)
    }

    pub fn output_display_name(&self, port: &OutputPort) -> &str {
        self.output_tensor(port)
            .any_name()
            .unwrap_or(&self.nodes[port.result.slot()].name)
    }

    /// Input slots consuming `value`.
    pub fn consumers(&self, value: ValueRef) -> &[Consumer] {
        let idx = value.node.slot();
        if idx >= self.nodes.len() {
            return &[];
        }
        let flat = self.value_offsets[idx] + value.output as usize;
        if flat >= self.value_offsets[idx + 1] {
            return &[];
        }
        let start = self.consumer_offsets[flat];
        let end = self.consumer_offsets[flat + 1];
        &self.consumers[start..end]
    }
}

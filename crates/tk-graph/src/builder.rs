//! Incremental graph builder.

use std::sync::Arc;

use tk_core::{Id, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Consumer, Graph, Node, NodeKind, ValueRef};
use crate::ops::Operator;
use crate::tensor::{TensorDesc, TensorInfo};
use crate::{infer, validate};

/// Mapping from the node IDs of an imported graph to IDs in the builder.
#[derive(Debug, Clone)]
pub struct NodeRemap {
    map: Vec<NodeId>,
}

impl NodeRemap {
    /// New ID of an imported node (panics if `old` is not from the imported graph).
    pub fn node(&self, old: NodeId) -> NodeId {
        self.map[old.slot()]
    }

    /// New reference to an imported value.
    pub fn value(&self, old: ValueRef) -> ValueRef {
        ValueRef::new(self.node(old.node), old.output)
    }
}

/// Builder for constructing a graph incrementally.
///
/// Use `add_parameter`, `add_op` and `add_result` to build up the graph,
/// then call `build()` to validate and freeze it into an immutable `Graph`.
/// Nodes that feed no declared output are dropped by `build()`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    name: String,
    nodes: Vec<Node>,
    parameters: Vec<NodeId>,
    results: Vec<NodeId>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn tensor(&self, value: ValueRef) -> Option<&TensorInfo> {
        self.node(value.node)?.outputs.get(value.output as usize)
    }

    fn push_node(
        &mut self,
        name: String,
        kind: NodeKind,
        inputs: Vec<ValueRef>,
        outputs: Vec<TensorInfo>,
    ) -> GraphResult<NodeId> {
        let id = Id::from_usize(self.nodes.len())?;
        for &value in &inputs {
            self.check_value(id, value)?;
        }
        self.nodes.push(Node {
            id,
            name,
            kind,
            inputs,
            outputs,
        });
        Ok(id)
    }

    fn check_value(&self, user: NodeId, value: ValueRef) -> GraphResult<()> {
        let producer = self.node(value.node).ok_or(GraphError::InvalidNodeRef {
            node: user,
            target: value.node,
        })?;
        if value.output as usize >= producer.outputs.len() {
            return Err(GraphError::InvalidOutputRef {
                node: user,
                target: value.node,
                output: value.output,
                count: producer.outputs.len(),
            });
        }
        Ok(())
    }

    /// Add a graph input whose tensor is named `name`, and declare it.
    pub fn add_parameter(&mut self, name: impl Into<String>, desc: TensorDesc) -> GraphResult<NodeId> {
        let name = name.into();
        let mut info = TensorInfo::new(desc);
        info.names.insert(name.clone());
        let id = self.push_node(name, NodeKind::Parameter, Vec::new(), vec![info])?;
        self.parameters.push(id);
        Ok(id)
    }

    /// Add an operator node; output descriptors are filled in by `build()`.
    pub fn add_op(
        &mut self,
        name: impl Into<String>,
        op: Arc<dyn Operator>,
        inputs: impl IntoIterator<Item = ValueRef>,
    ) -> GraphResult<NodeId> {
        let outputs = vec![TensorInfo::default(); op.output_count()];
        self.push_node(
            name.into(),
            NodeKind::Op(op),
            inputs.into_iter().collect(),
            outputs,
        )
    }

    /// Add a graph output sinking `source`, and declare it.
    pub fn add_result(&mut self, source: ValueRef) -> GraphResult<NodeId> {
        let name = match self.node(source.node) {
            Some(producer) => format!("{}/result", producer.name),
            None => String::from("result"),
        };
        let id = self.push_node(name, NodeKind::Result, vec![source], Vec::new())?;
        self.results.push(id);
        Ok(id)
    }

    /// Attach extra names to a produced tensor.
    pub fn add_tensor_names<S: Into<String>>(
        &mut self,
        value: ValueRef,
        names: impl IntoIterator<Item = S>,
    ) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(value.node.slot())
            .ok_or(GraphError::InvalidNodeRef {
                node: value.node,
                target: value.node,
            })?;
        let count = node.outputs.len();
        let info = node
            .outputs
            .get_mut(value.output as usize)
            .ok_or(GraphError::InvalidOutputRef {
                node: value.node,
                target: value.node,
                output: value.output,
                count,
            })?;
        info.names.extend(names.into_iter().map(Into::into));
        Ok(())
    }

    /// Rename a node (useful for post-construction adjustments).
    pub fn rename_node(&mut self, node_id: NodeId, new_name: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(node_id.slot()) {
            node.name = new_name.into();
        }
    }

    /// Copy every node of `graph` into this arena without declaring any of its
    /// inputs or outputs.
    pub fn import(&mut self, graph: &Graph) -> GraphResult<NodeRemap> {
        let base = self.nodes.len();
        let map = (0..graph.nodes.len())
            .map(|i| Id::from_usize(base + i))
            .collect::<Result<Vec<_>, _>>()?;
        let remap = NodeRemap { map };
        for node in &graph.nodes {
            self.nodes.push(Node {
                id: remap.node(node.id),
                name: node.name.clone(),
                kind: node.kind.clone(),
                inputs: node.inputs.iter().map(|&v| remap.value(v)).collect(),
                outputs: node.outputs.clone(),
            });
        }
        Ok(remap)
    }

    /// Append an existing parameter node to the graph inputs.
    pub fn declare_input(&mut self, node: NodeId) -> GraphResult<()> {
        match self.node(node) {
            Some(n) if n.kind.is_parameter() => {
                self.parameters.push(node);
                Ok(())
            }
            _ => Err(GraphError::NotAParameter { node }),
        }
    }

    /// Append an existing result node to the graph outputs.
    pub fn declare_output(&mut self, node: NodeId) -> GraphResult<()> {
        match self.node(node) {
            Some(n) if n.kind.is_result() => {
                self.results.push(node);
                Ok(())
            }
            _ => Err(GraphError::NotAResult { node }),
        }
    }

    /// Input slots currently reading `value`, in arena order.
    pub fn consumers_of(&self, value: ValueRef) -> Vec<Consumer> {
        self.nodes
            .iter()
            .flat_map(|n| {
                n.inputs
                    .iter()
                    .enumerate()
                    .filter(move |(_, v)| **v == value)
                    .map(move |(i, _)| Consumer {
                        node: n.id,
                        input: i as u32,
                    })
            })
            .collect()
    }

    /// Rewire one input slot to read from `source`.
    pub fn replace_source(&mut self, consumer: Consumer, source: ValueRef) -> GraphResult<()> {
        self.check_value(consumer.node, source)?;
        let slot = self
            .nodes
            .get_mut(consumer.node.slot())
            .and_then(|n| n.inputs.get_mut(consumer.input as usize))
            .ok_or(GraphError::InvalidInputSlot {
                node: consumer.node,
                input: consumer.input,
            })?;
        *slot = source;
        Ok(())
    }

    /// Build and validate the graph, returning an immutable `Graph`.
    ///
    /// This prunes unreachable nodes, orders the arena topologically, runs type
    /// inference and constructs compact consumer adjacency.
    pub fn build(self) -> GraphResult<Graph> {
        // First validate the structure
        validate::validate_structure(&self.nodes, &self.parameters, &self.results)?;

        let keep = validate::reachable_nodes(&self.nodes, &self.parameters, &self.results)?;
        let kept: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| keep[n.id.slot()])
            .map(|n| n.id)
            .collect();
        let (nodes, map) = Self::relabel(self.nodes, &kept);
        let parameters: Vec<NodeId> = self.parameters.iter().map(|id| map[id.slot()]).collect();
        let results: Vec<NodeId> = self.results.iter().map(|id| map[id.slot()]).collect();

        let order = validate::topological_order(&nodes)?;
        let (mut nodes, map) = Self::relabel(nodes, &order);
        let parameters: Vec<NodeId> = parameters.iter().map(|id| map[id.slot()]).collect();
        let results: Vec<NodeId> = results.iter().map(|id| map[id.slot()]).collect();

        let order: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        infer::infer_types(&mut nodes, &order)?;

        let (value_offsets, consumer_offsets, consumers) = Self::build_adjacency(&nodes);

        // Validate adjacency consistency
        validate::validate_adjacency(&nodes, &value_offsets, &consumer_offsets, &consumers)?;

        tracing::debug!(
            graph = %self.name,
            nodes = nodes.len(),
            inputs = parameters.len(),
            outputs = results.len(),
            "built graph"
        );

        Ok(Graph {
            name: self.name,
            nodes,
            parameters,
            results,
            value_offsets,
            consumer_offsets,
            consumers,
        })
    }

    /// Keep the nodes listed in `order`, renumbered by their position in it.
    ///
    /// Returns the new arena and a map indexed by old slot. Every kept node
    /// must only read from kept nodes.
    fn relabel(nodes: Vec<Node>, order: &[NodeId]) -> (Vec<Node>, Vec<NodeId>) {
        let mut map = vec![Id::from_index(0); nodes.len()];
        for (new, old) in order.iter().enumerate() {
            map[old.slot()] = Id::from_index(new as u32);
        }

        let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
        let relabeled = order
            .iter()
            .filter_map(|old| slots[old.slot()].take())
            .map(|mut node| {
                node.id = map[node.id.slot()];
                for value in &mut node.inputs {
                    value.node = map[value.node.slot()];
                }
                node
            })
            .collect();
        (relabeled, map)
    }

    /// Build compact adjacency lists: for each produced value, its consumers.
    fn build_adjacency(nodes: &[Node]) -> (Vec<usize>, Vec<usize>, Vec<Consumer>) {
        let mut value_offsets = Vec::with_capacity(nodes.len() + 1);
        value_offsets.push(0);
        for node in nodes {
            value_offsets.push(value_offsets[value_offsets.len() - 1] + node.outputs.len());
        }
        let value_count = value_offsets[nodes.len()];

        // Count consumers per value, then fill in consumer order
        let mut counts = vec![0_usize; value_count];
        for node in nodes {
            for value in &node.inputs {
                counts[value_offsets[value.node.slot()] + value.output as usize] += 1;
            }
        }
        let mut consumer_offsets = Vec::with_capacity(value_count + 1);
        consumer_offsets.push(0);
        for count in &counts {
            consumer_offsets.push(consumer_offsets[consumer_offsets.len() - 1] + count);
        }

        let mut cursor = consumer_offsets[..value_count].to_vec();
        let mut consumers = vec![
            Consumer {
                node: Id::from_index(0),
                input: 0,
            };
            consumer_offsets[value_count]
        ];
        for node in nodes {
            for (i, value) in node.inputs.iter().enumerate() {
                let flat = value_offsets[value.node.slot()] + value.output as usize;
                consumers[cursor[flat]] = Consumer {
                    node: node.id,
                    input: i as u32,
                };
                cursor[flat] += 1;
            }
        }

        (value_offsets, consumer_offsets, consumers)
    }
}

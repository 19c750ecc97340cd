//! Graph validation logic.

use std::collections::{HashMap, HashSet, VecDeque};

use tk_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Consumer, Node};

/// Validate references and declarations before pruning.
pub(crate) fn validate_structure(
    nodes: &[Node],
    parameters: &[NodeId],
    results: &[NodeId],
) -> GraphResult<()> {
    // Check that node IDs are contiguous and match their indices
    for (i, node) in nodes.iter().enumerate() {
        if node.id.slot() != i {
            return Err(GraphError::InvalidNodeRef {
                node: node.id,
                target: node.id,
            });
        }
    }

    // Check that each edge references an existing producer output
    for node in nodes {
        for value in &node.inputs {
            let Some(producer) = nodes.get(value.node.slot()) else {
                return Err(GraphError::InvalidNodeRef {
                    node: node.id,
                    target: value.node,
                });
            };
            if value.output as usize >= producer.outputs.len() {
                return Err(GraphError::InvalidOutputRef {
                    node: node.id,
                    target: value.node,
                    output: value.output,
                    count: producer.outputs.len(),
                });
            }
        }
    }

    let mut declared = HashSet::new();
    for &id in parameters.iter().chain(results) {
        if !declared.insert(id) {
            return Err(GraphError::DuplicateDeclaration { node: id });
        }
    }

    for &id in parameters {
        let node = nodes
            .get(id.slot())
            .ok_or(GraphError::NotAParameter { node: id })?;
        if !node.kind.is_parameter() || !node.inputs.is_empty() || node.outputs.len() != 1 {
            return Err(GraphError::NotAParameter { node: id });
        }
    }

    for &id in results {
        let node = nodes
            .get(id.slot())
            .ok_or(GraphError::NotAResult { node: id })?;
        if !node.kind.is_result() || node.inputs.len() != 1 || !node.outputs.is_empty() {
            return Err(GraphError::NotAResult { node: id });
        }
    }

    // Input names must resolve to a single port
    let mut names: HashMap<&str, NodeId> = HashMap::new();
    for &id in parameters {
        for name in &nodes[id.slot()].outputs[0].names {
            if names.insert(name.as_str(), id).is_some() {
                return Err(GraphError::DuplicateInputName { name: name.clone() });
            }
        }
    }

    Ok(())
}

/// Nodes to keep: everything that feeds a result, plus declared endpoints.
///
/// Fails if a parameter feeds a result without being declared.
pub(crate) fn reachable_nodes(
    nodes: &[Node],
    parameters: &[NodeId],
    results: &[NodeId],
) -> GraphResult<Vec<bool>> {
    let mut keep = vec![false; nodes.len()];
    let mut stack: Vec<NodeId> = results.to_vec();
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut keep[id.slot()], true) {
            continue;
        }
        stack.extend(nodes[id.slot()].inputs.iter().map(|v| v.node));
    }

    let declared: HashSet<NodeId> = parameters.iter().copied().collect();
    for node in nodes {
        if keep[node.id.slot()] && node.kind.is_parameter() && !declared.contains(&node.id) {
            return Err(GraphError::UndeclaredParameter {
                name: node
                    .outputs
                    .first()
                    .and_then(|t| t.any_name())
                    .unwrap_or(&node.name)
                    .to_string(),
            });
        }
    }

    for &id in parameters {
        keep[id.slot()] = true;
    }
    Ok(keep)
}

/// Compute a topological order of the nodes.
///
/// Ties are broken by arena position so the order is deterministic.
pub(crate) fn topological_order(nodes: &[Node]) -> GraphResult<Vec<NodeId>> {
    let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.inputs.len()).collect();
    let mut users: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
    for node in nodes {
        for value in &node.inputs {
            users[value.node.slot()].push(node.id);
        }
    }

    // Kahn's algorithm for topological sort
    let mut queue: VecDeque<NodeId> = nodes
        .iter()
        .filter(|n| n.inputs.is_empty())
        .map(|n| n.id)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &user in &users[id.slot()] {
            let deg = &mut in_degree[user.slot()];
            *deg -= 1;
            if *deg == 0 {
                queue.push_back(user);
            }
        }
    }

    // Check for cycles
    if order.len() != nodes.len() {
        let stuck = nodes
            .iter()
            .find(|n| in_degree[n.id.slot()] > 0)
            .map_or_else(String::new, |n| n.name.clone());
        return Err(GraphError::Cycle { name: stuck });
    }

    Ok(order)
}

/// Validate the consumer adjacency against the node edges.
pub(crate) fn validate_adjacency(
    nodes: &[Node],
    value_offsets: &[usize],
    consumer_offsets: &[usize],
    consumers: &[Consumer],
) -> GraphResult<()> {
    let value_count = value_offsets.last().copied().unwrap_or(0);
    if value_offsets.len() != nodes.len() + 1
        || consumer_offsets.len() != value_count + 1
        || consumer_offsets.last().copied() != Some(consumers.len())
    {
        return Err(GraphError::PortIndexOob {
            what: "adjacency offsets",
            index: consumer_offsets.len(),
            len: value_count + 1,
        });
    }

    // Every listed consumer must actually read the value it is listed under
    for node in nodes {
        let base = value_offsets[node.id.slot()];
        for output in 0..node.outputs.len() {
            let flat = base + output;
            for c in &consumers[consumer_offsets[flat]..consumer_offsets[flat + 1]] {
                let reads = nodes
                    .get(c.node.slot())
                    .and_then(|n| n.inputs.get(c.input as usize));
                match reads {
                    Some(v) if v.node == node.id && v.output as usize == output => {}
                    _ => {
                        return Err(GraphError::InvalidInputSlot {
                            node: c.node,
                            input: c.input,
                        });
                    }
                }
            }
        }
    }

    // Every edge appears exactly once
    let edge_count: usize = nodes.iter().map(|n| n.inputs.len()).sum();
    if edge_count != consumers.len() {
        return Err(GraphError::PortIndexOob {
            what: "consumer list",
            index: consumers.len(),
            len: edge_count,
        });
    }

    Ok(())
}

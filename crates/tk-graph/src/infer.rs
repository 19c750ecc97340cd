//! Type inference over a topologically ordered arena.

use std::sync::Arc;

use tk_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Node, NodeKind};
use crate::tensor::TensorDesc;

/// Recompute every operator output descriptor, in `order`.
///
/// Parameters keep their declared descriptor; results have no outputs.
pub(crate) fn infer_types(nodes: &mut [Node], order: &[NodeId]) -> GraphResult<()> {
    for &id in order {
        let node = &nodes[id.slot()];
        let NodeKind::Op(op) = &node.kind else {
            continue;
        };
        let op = Arc::clone(op);
        let inputs: Vec<TensorDesc> = node
            .inputs
            .iter()
            .map(|v| nodes[v.node.slot()].outputs[v.output as usize].desc.clone())
            .collect();

        let outputs = op.infer(&inputs).map_err(|source| GraphError::Inference {
            node: node.name.clone(),
            op: op.type_name().to_string(),
            source,
        })?;
        if outputs.len() != node.outputs.len() {
            return Err(GraphError::OutputCount {
                node: node.name.clone(),
                op: op.type_name().to_string(),
                expected: node.outputs.len(),
                actual: outputs.len(),
            });
        }

        tracing::trace!(node = %node.name, op = op.type_name(), "inferred output types");
        for (info, desc) in nodes[id.slot()].outputs.iter_mut().zip(outputs) {
            info.desc = desc;
        }
    }
    Ok(())
}

//! Structural invariants of the upstream relation.
//!
//! The registry only ever mutates through checked operations, so these checks
//! are a safety net: the tree runs them after every mutation in debug builds,
//! and the test suites run them directly.

use crate::store::{NodeId, Registry};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("Stage {node} points at upstream {upstream}, which does not exist")]
    DanglingUpstream { node: NodeId, upstream: NodeId },
    #[error("Children index of {parent} disagrees with the upstream of {child}")]
    ChildIndexMismatch { parent: NodeId, child: NodeId },
    #[error("Upstream relation contains a cycle")]
    CycleDetected,
}

/// Builds a petgraph view of the tree, edges pointing from upstream to child.
pub fn to_graph(registry: &Registry) -> DiGraphMap<NodeId, ()> {
    let mut graph = DiGraphMap::with_capacity(registry.count(), registry.count());
    for id in registry.ids() {
        graph.add_node(id);
    }
    for id in registry.ids() {
        if let Some(up) = registry.upstream(id) {
            graph.add_edge(up, id, ());
        }
    }
    graph
}

pub fn validate(registry: &Registry) -> Result<(), InvariantError> {
    for id in registry.ids() {
        if let Some(up) = registry.upstream(id) {
            if !registry.contains(up) {
                return Err(InvariantError::DanglingUpstream { node: id, upstream: up });
            }
            let listed = registry.children(up).iter().filter(|&&c| c == id).count();
            if listed != 1 {
                return Err(InvariantError::ChildIndexMismatch { parent: up, child: id });
            }
        }
        for &child in registry.children(id) {
            if registry.upstream(child) != Some(id) {
                return Err(InvariantError::ChildIndexMismatch { parent: id, child });
            }
        }
    }

    if is_cyclic_directed(&to_graph(registry)) {
        return Err(InvariantError::CycleDetected);
    }
    Ok(())
}

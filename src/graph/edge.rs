//! A directed supply link between two stages.
use crate::store::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `src` supplies `dst`: `dst.upstream == Some(src)`.
///
/// Edges are not stored; they are a view over the upstream pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
}

impl Edge {
    pub fn new(src: NodeId, dst: NodeId) -> Self { Self { src, dst } }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

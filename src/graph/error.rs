use crate::store::{NodeId, UnknownStageType};
use thiserror::Error;

/// Why an edge was refused. A refused edge leaves the tree untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeError {
    #[error("Stage {0} does not exist")]
    UnknownNode(NodeId),
    #[error("Cannot connect stage {node} to itself")]
    SelfLoop { node: NodeId },
    #[error("Stage {dst} is already supplied by {upstream}")]
    DestinationAlreadyConnected { dst: NodeId, upstream: NodeId },
    #[error("Connecting {src} -> {dst} would create a cycle")]
    CycleDetected { src: NodeId, dst: NodeId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Stage {0} not found")]
    NodeNotFound(NodeId),
    #[error(transparent)]
    UnknownStageType(#[from] UnknownStageType),
    #[error(transparent)]
    Edge(#[from] EdgeError),
}

//! Ownership of stages and of the upstream relation.
pub mod registry;
pub mod stage;
pub mod types;

pub use registry::{Children, Registry};
pub use stage::{Computed, ConfigPatch, Stage, StageConfig, StageRecord};
pub use types::{NodeId, Position, StageType, UnknownStageType};

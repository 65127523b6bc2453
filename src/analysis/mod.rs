//! Structural analysis of the power tree: ordering, depth and invariants.
pub mod invariants;
pub mod topology;

pub use invariants::InvariantError;

//! Human-readable rendering of stages and trees.
pub mod format;
pub mod trace;

pub use format::Sig;
pub use trace::{format_tree, stage_summary};

//! Evaluation engine for power distribution trees.
//!
//! A tree is a forest of stages (sources, linear and switching regulators,
//! loads). Every edit re-runs a fixed-point evaluation that settles the
//! current each stage draws and the voltage it receives, and attaches
//! electrical diagnostics to the stages that break a rule.

pub mod analysis;
pub mod compute;
pub mod display;
pub mod document;
pub mod graph;
pub mod store;

pub use compute::{ConvergenceReport, Diagnostic, DiagnosticKind, RuleConfig, Severity};
pub use document::{Document, DocumentError, NodeRecord};
pub use graph::{Edge, EdgeError, PowerTree, TreeError};
pub use store::{ConfigPatch, NodeId, Position, Stage, StageConfig, StageType};

// FFI Facade: compiled only with the `python` feature.
#[cfg(feature = "python")]
mod bindings {
    pub mod python;
}

// --- Module Definition ---
/// Defines the `_core` Python extension module.
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn _core(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::prelude::*;
    m.add_class::<bindings::python::PyPowerTree>()?;
    Ok(())
}

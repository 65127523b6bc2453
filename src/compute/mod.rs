//! Electrical evaluation: per-stage rules, current aggregation and the
//! fixed-point driver tying them together.
pub mod calculator;
pub mod currents;
pub mod diagnostics;
pub mod engine;
pub mod rules;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use engine::{ConvergenceReport, Engine};
pub use rules::RuleConfig;

use crate::display::trace;
use crate::graph::PowerTree;
use crate::store::{ConfigPatch, NodeId, Position};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Stage ids cross the boundary as `u32`; larger ints raise `OverflowError`.
#[pyclass(name = "PowerTree")]
#[derive(Debug, Clone, Default)]
pub struct PyPowerTree {
    inner: PowerTree,
}

#[pymethods]
impl PyPowerTree {
    #[new]
    pub fn new() -> Self { Self::default() }

    #[pyo3(signature = (stage_type, x=None, y=None))]
    pub fn add_stage(&mut self, stage_type: &str, x: Option<f64>, y: Option<f64>) -> PyResult<u32> {
        let position = match (x, y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            (None, None) => None,
            _ => return Err(PyValueError::new_err("Give both x and y, or neither")),
        };
        self.inner.add_stage_named(stage_type, position).map(|id| id.0).map_err(value_error)
    }

    pub fn remove_node(&mut self, id: u32) -> PyResult<()> {
        self.inner.remove_node(NodeId(id)).map(|_| ()).map_err(value_error)
    }

    pub fn add_edge(&mut self, src: u32, dst: u32) -> PyResult<()> {
        self.inner.add_edge(NodeId(src), NodeId(dst)).map(|_| ()).map_err(value_error)
    }

    /// Applies a JSON object of configuration fields, e.g. `{"vout": 3.3}`.
    pub fn configure(&mut self, id: u32, patch_json: &str) -> PyResult<()> {
        let patch: ConfigPatch = serde_json::from_str(patch_json).map_err(value_error)?;
        self.inner.apply_patch(NodeId(id), patch).map_err(value_error)
    }

    pub fn set_position(&mut self, id: u32, x: f64, y: f64) -> PyResult<()> {
        self.inner.set_position(NodeId(id), Position::new(x, y)).map_err(value_error)
    }

    /// Returns `(passes, violations, warnings)`.
    pub fn recompute(&mut self) -> (usize, usize, usize) {
        let report = self.inner.recompute();
        (report.passes, report.violations, report.warnings)
    }

    pub fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(value_error)
    }

    pub fn load_json(&mut self, json: &str) -> PyResult<()> {
        self.inner.load_json(json).map_err(value_error)
    }

    pub fn stage_json(&self, id: u32) -> PyResult<String> {
        let stage = self
            .inner
            .stage(NodeId(id))
            .ok_or_else(|| PyValueError::new_err("Invalid Node ID"))?;
        serde_json::to_string(stage).map_err(value_error)
    }

    pub fn diagnostics(&self, id: u32) -> PyResult<Vec<String>> {
        let stage = self
            .inner
            .stage(NodeId(id))
            .ok_or_else(|| PyValueError::new_err("Invalid Node ID"))?;
        Ok(stage.diagnostics.iter().map(|d| d.to_string()).collect())
    }

    pub fn error_report(&self) -> Vec<String> { self.inner.error_report() }

    pub fn format_tree(&self) -> String { trace::format_tree(&self.inner) }

    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.inner.edges().into_iter().map(|e| (e.src.0, e.dst.0)).collect()
    }

    pub fn node_ids(&self) -> Vec<u32> {
        self.inner.node_ids().into_iter().map(|id| id.0).collect()
    }

    pub fn node_count(&self) -> usize { self.inner.node_count() }
}

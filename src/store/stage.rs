//! The electrical record of one node in the power tree.

use super::types::{NodeId, StageType};
use crate::compute::diagnostics::Diagnostic;
use serde::{Deserialize, Serialize, Serializer};

/// User-set configuration of a stage.
///
/// For `SOURCE` stages `vin_min`/`vin_max` describe the valid *output* band,
/// so no dedicated fields are needed. `vin_nom` and `vout` of a `LOAD` are
/// overwritten with the bus voltage on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageConfig {
    pub stage_type: StageType,
    pub name: String,
    pub ic_name: String,
    pub vin_min: f64,
    pub vin_max: f64,
    pub vin_nom: f64,
    pub vout: f64,
    /// Only meaningful for `LOAD` stages (A).
    pub load_current: f64,
    /// Current capability of the IC, or of the supply for a `SOURCE` (A).
    pub iout_max_ic: f64,
    /// Only meaningful for `DCDC` stages, 0..1.
    pub efficiency_user: f64,
    /// Quiescent current (µA).
    pub iq: f64,
    pub notes: String,
    pub color: String,
}

impl StageConfig {
    /// Type-specific defaults for a new stage.
    pub fn for_type(stage_type: StageType) -> Self {
        let mut config = Self {
            stage_type,
            name: stage_type.as_str().to_string(),
            ic_name: String::new(),
            vin_min: 0.0,
            vin_max: 20.0,
            vin_nom: 12.0,
            vout: 12.0,
            load_current: 0.0,
            iout_max_ic: 1.0,
            efficiency_user: 0.9,
            iq: 0.0,
            notes: String::new(),
            color: stage_type.default_color().to_string(),
        };
        if stage_type == StageType::Source {
            config.vin_nom = 12.0;
            config.vin_min = 11.0;
            config.vin_max = 13.0;
            config.iout_max_ic = 2.0;
        }
        config
    }
}

/// Values derived by the engine. Never set by users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Computed {
    /// Aggregate current requested by descendants (A).
    pub iout_user: f64,
    pub vin_effective: f64,
    pub eff_effective: f64,
    pub p_out: f64,
    pub p_in: f64,
    pub p_diss: f64,
    pub p_iq: f64,
    pub p_tot: f64,
    /// Current drawn from the upstream bus (A).
    pub i_in: f64,
}

impl Default for Computed {
    fn default() -> Self {
        Self {
            iout_user: 0.0,
            vin_effective: 0.0,
            eff_effective: 1.0,
            p_out: 0.0,
            p_in: 0.0,
            p_diss: 0.0,
            p_iq: 0.0,
            p_tot: 0.0,
            i_in: 0.0,
        }
    }
}

/// One node of the tree. Owned exclusively by the `Registry`.
///
/// Serializes as a flat record (configuration, upstream, computed values and
/// rendered diagnostics under `errors`). Deserialization goes through
/// [`StageRecord`] so that missing keys take the defaults of the stage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StageRecord")]
pub struct Stage {
    pub id: NodeId,
    #[serde(flatten)]
    pub config: StageConfig,
    pub upstream: Option<NodeId>,
    #[serde(flatten)]
    pub computed: Computed,
    #[serde(rename = "errors", serialize_with = "render_diagnostics")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Stage {
    pub fn new(id: NodeId, config: StageConfig) -> Self {
        Self {
            id,
            config,
            upstream: None,
            computed: Computed::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn stage_type(&self) -> StageType { self.config.stage_type }
    pub fn name(&self) -> &str { &self.config.name }
}

fn render_diagnostics<S: Serializer>(diagnostics: &[Diagnostic], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(diagnostics.iter().map(|d| d.to_string()))
}

/// A partial configuration. `None` fields are left untouched when applied.
///
/// Used both for configuration edits coming from front-ends and as the body
/// of a stored stage record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigPatch {
    pub stage_type: Option<StageType>,
    pub name: Option<String>,
    pub ic_name: Option<String>,
    pub vin_min: Option<f64>,
    pub vin_max: Option<f64>,
    pub vin_nom: Option<f64>,
    pub vout: Option<f64>,
    pub load_current: Option<f64>,
    pub iout_max_ic: Option<f64>,
    pub efficiency_user: Option<f64>,
    pub iq: Option<f64>,
    pub notes: Option<String>,
    pub color: Option<String>,
}

impl ConfigPatch {
    pub fn apply_to(self, config: &mut StageConfig) {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $( if let Some(v) = self.$field { config.$field = v; } )*
            };
        }
        overlay!(
            stage_type, name, ic_name, vin_min, vin_max, vin_nom, vout,
            load_current, iout_max_ic, efficiency_user, iq, notes, color,
        );
    }
}

/// On-disk shape of a stage. Computed values, `upstream` and `errors` are
/// accepted but ignored: the first are recomputed and the upstream pointer
/// is rebuilt from the document's edge list.
#[derive(Debug, Clone, Deserialize)]
pub struct StageRecord {
    pub id: NodeId,
    #[serde(flatten)]
    pub config: ConfigPatch,
}

impl From<StageRecord> for Stage {
    fn from(record: StageRecord) -> Self {
        let stage_type = record.config.stage_type.unwrap_or(StageType::Ldo);
        let mut config = StageConfig::for_type(stage_type);
        record.config.apply_to(&mut config);
        Stage::new(record.id, config)
    }
}

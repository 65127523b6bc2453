//! Per-stage electrical rules.
//!
//! `compute` is a pure function of the stage's configuration, its current
//! `iout_user` and the voltage supplied by its upstream. It fully replaces the
//! stage's computed values and diagnostics.

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::rules::RuleConfig;
use crate::store::{Computed, Stage, StageType};

pub fn compute(stage: &mut Stage, upstream_vout: Option<f64>, rules: &RuleConfig) {
    stage.diagnostics.clear();
    // `iout_user` is owned by the current propagator; everything else is ours.
    stage.computed = Computed { iout_user: stage.computed.iout_user, ..Computed::default() };

    match stage.config.stage_type {
        StageType::Source => compute_source(stage),
        StageType::Load => compute_load(stage, upstream_vout),
        StageType::Ldo | StageType::Dcdc => compute_regulator(stage, upstream_vout, rules),
    }
}

/// A source is checked against its own output band only.
fn compute_source(stage: &mut Stage) {
    let cfg = &stage.config;
    let c = &mut stage.computed;

    c.vin_effective = cfg.vin_nom;
    c.p_out = cfg.vout * c.iout_user;
    c.p_in = c.p_out;
    c.i_in = c.iout_user;

    if !(cfg.vin_min <= cfg.vout && cfg.vout <= cfg.vin_max) {
        let kind = DiagnosticKind::SourceOutputOutOfRange { vout: cfg.vout, min: cfg.vin_min, max: cfg.vin_max };
        stage.diagnostics.push(Diagnostic::new(stage.id, cfg.name.clone(), kind));
    }
}

/// A load sits on the bus voltage: both its nominal input and its "output" follow it.
fn compute_load(stage: &mut Stage, upstream_vout: Option<f64>) {
    let cfg = &mut stage.config;
    if let Some(bus) = upstream_vout {
        cfg.vin_nom = bus;
    }
    cfg.vout = cfg.vin_nom;

    let c = &mut stage.computed;
    c.vin_effective = cfg.vin_nom;
    c.p_out = cfg.vout.abs() * cfg.load_current;
    c.p_in = c.p_out;
    c.i_in = cfg.load_current;
}

fn compute_regulator(stage: &mut Stage, upstream_vout: Option<f64>, rules: &RuleConfig) {
    let id = stage.id;
    let cfg = &stage.config;
    let c = &mut stage.computed;
    let mut found = Vec::new();

    let vin = upstream_vout.unwrap_or(cfg.vin_nom);
    c.vin_effective = vin;

    let eff = if cfg.stage_type == StageType::Ldo {
        if vin.abs() <= cfg.vout.abs() + rules.ldo_dropout_margin {
            found.push(DiagnosticKind::InsufficientDropout { vin, vout: cfg.vout });
        }
        // An LDO burns the headroom: efficiency is the voltage ratio.
        if vin != 0.0 { cfg.vout.abs() / vin.abs() } else { 0.0 }
    } else {
        cfg.efficiency_user
    };
    let eff = eff.clamp(0.0, 1.0);
    c.eff_effective = eff;

    c.p_out = cfg.vout.abs() * c.iout_user;
    c.p_in = if eff > 0.0 { c.p_out / eff } else { f64::INFINITY };
    c.i_in = if vin != 0.0 { c.p_in / vin.abs() } else { f64::INFINITY };
    c.p_iq = (cfg.iq / 1e6) * vin;
    c.p_diss = if c.p_in.is_finite() { c.p_in - c.p_out } else { f64::INFINITY };
    c.p_tot = (if c.p_diss.is_finite() { c.p_diss } else { 0.0 }) + c.p_iq;

    if cfg.iout_max_ic < c.iout_user {
        found.push(DiagnosticKind::CurrentCapabilityExceeded { limit: cfg.iout_max_ic, requested: c.iout_user });
    }

    let (low, high) = rules.input_band(cfg.vin_min, cfg.vin_max);
    if !(low <= vin && vin <= high) {
        found.push(DiagnosticKind::InputVoltageMargin { vin, low, high, min: cfg.vin_min, max: cfg.vin_max });
    }

    let name = &cfg.name;
    stage.diagnostics.extend(found.into_iter().map(|kind| Diagnostic::new(id, name.clone(), kind)));
}

use super::calculator;
use super::currents;
use super::diagnostics::{Diagnostic, DiagnosticKind, Severity};
use super::rules::RuleConfig;
use crate::analysis::topology;
use crate::store::{NodeId, Registry, StageType};

/// Summary of one recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceReport {
    pub passes: usize,
    /// Evaluation order of the last pass.
    pub order: Vec<NodeId>,
    pub violations: usize,
    pub warnings: usize,
}

/// The convergence driver.
///
/// Requested current travels leaves -> root and supplied voltage travels
/// root -> leaves, and each depends on the other through the regulators'
/// input current. One pass settles one more level, so the driver repeats
/// propagate + calculate as many times as the deepest chain is long.
pub struct Engine<'a> {
    rules: &'a RuleConfig,
}

impl<'a> Engine<'a> {
    pub fn new(rules: &'a RuleConfig) -> Self {
        Self { rules }
    }

    pub fn run(&self, registry: &mut Registry) -> ConvergenceReport {
        let passes = topology::pass_count(registry);
        let mut order = Vec::new();

        for pass in 0..passes {
            order = topology::sort(registry);
            currents::propagate(registry, &order);
            for &id in &order {
                self.evaluate(registry, id);
            }
            self.check_supply_limits(registry);
            log::trace!("pass {}/{} evaluated {} stage(s)", pass + 1, passes, order.len());
        }

        let mut report = ConvergenceReport { passes, order, ..Default::default() };
        for d in registry.stages().flat_map(|s| s.diagnostics.iter()) {
            match d.severity() {
                Severity::Violation => report.violations += 1,
                Severity::Warning => report.warnings += 1,
            }
        }
        log::debug!(
            "recomputed {} stage(s) in {} pass(es): {} violation(s), {} warning(s)",
            registry.count(), report.passes, report.violations, report.warnings
        );
        report
    }

    fn evaluate(&self, registry: &mut Registry, id: NodeId) {
        let upstream_vout = registry
            .upstream(id)
            .and_then(|up| registry.get(up))
            .map(|up| up.config.vout);
        if let Some(stage) = registry.get_mut(id) {
            calculator::compute(stage, upstream_vout, self.rules);
        }
    }

    /// Compares the current each source's direct children request with its
    /// rating. Appended after the calculator's own diagnostics.
    fn check_supply_limits(&self, registry: &mut Registry) {
        let sources: Vec<NodeId> = registry
            .stages()
            .filter(|s| s.stage_type() == StageType::Source)
            .map(|s| s.id)
            .collect();

        for id in sources {
            let total: f64 = registry
                .children(id)
                .iter()
                .filter_map(|&child| registry.get(child))
                .map(|child| child.computed.iout_user)
                .sum();

            let Some(stage) = registry.get_mut(id) else { continue };
            let limit = stage.config.iout_max_ic;
            let kind = if total > limit {
                DiagnosticKind::SupplyOverload { total, limit }
            } else if total > limit * self.rules.supply_warning_ratio {
                DiagnosticKind::SupplyNearLimit { total, limit }
            } else {
                continue;
            };
            let name = stage.config.name.clone();
            stage.diagnostics.push(Diagnostic::new(id, name, kind));
        }
    }
}

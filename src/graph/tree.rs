//! The public face of the engine: a power tree that keeps its electrical
//! results up to date after every structural or configuration change.

use super::edge::Edge;
use super::error::{EdgeError, TreeError};
use crate::analysis::{invariants, topology};
use crate::compute::{ConvergenceReport, Diagnostic, Engine, RuleConfig};
use crate::store::{ConfigPatch, NodeId, Position, Registry, Stage, StageConfig, StageType};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct PowerTree {
    pub(crate) registry: Registry,
    rules: RuleConfig,
    last_report: ConvergenceReport,
}

impl PowerTree {
    pub fn new() -> Self { Self::default() }

    // --- Structure ---

    /// Adds a stage with the defaults of its type, named `"{TYPE}_{n}"`.
    pub fn add_stage(&mut self, stage_type: StageType, position: Option<Position>) -> NodeId {
        let mut config = StageConfig::for_type(stage_type);
        config.name = format!("{}_{}", stage_type.as_str(), self.registry.count() + 1);
        self.add_stage_with(config, position)
    }

    /// Like [`add_stage`](Self::add_stage) with the type given by name
    /// (case-insensitive, `INPUT` accepted for `SOURCE`).
    pub fn add_stage_named(&mut self, stage_type: &str, position: Option<Position>) -> Result<NodeId, TreeError> {
        let stage_type: StageType = stage_type.parse()?;
        Ok(self.add_stage(stage_type, position))
    }

    pub fn add_stage_with(&mut self, config: StageConfig, position: Option<Position>) -> NodeId {
        let offset = 50.0 + self.registry.count() as f64;
        let position = position.unwrap_or(Position::new(offset, offset));
        let id = self.registry.insert(config, position);
        self.recompute();
        id
    }

    /// Removes a stage together with every edge touching it. Former children
    /// become roots.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Stage, TreeError> {
        let stage = self.registry.remove(id).ok_or(TreeError::NodeNotFound(id))?;
        self.recompute();
        Ok(stage)
    }

    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) -> Result<Edge, EdgeError> {
        check_edge(&self.registry, src, dst)?;
        self.registry.link(src, dst);
        self.recompute();
        Ok(Edge::new(src, dst))
    }

    // --- Configuration ---

    pub fn configure<F>(&mut self, id: NodeId, edit: F) -> Result<(), TreeError>
    where
        F: FnOnce(&mut StageConfig),
    {
        let stage = self.registry.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        edit(&mut stage.config);
        self.recompute();
        Ok(())
    }

    pub fn apply_patch(&mut self, id: NodeId, patch: ConfigPatch) -> Result<(), TreeError> {
        self.configure(id, |config| patch.apply_to(config))
    }

    /// Layout only; nothing is recomputed.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<(), TreeError> {
        if self.registry.set_position(id, position) { Ok(()) } else { Err(TreeError::NodeNotFound(id)) }
    }

    pub fn rules(&self) -> &RuleConfig { &self.rules }

    pub fn set_rules(&mut self, rules: RuleConfig) {
        self.rules = rules;
        self.recompute();
    }

    // --- Evaluation ---

    /// Runs the convergence driver over the whole tree.
    pub fn recompute(&mut self) -> &ConvergenceReport {
        self.debug_assert_invariants();
        self.last_report = Engine::new(&self.rules).run(&mut self.registry);
        &self.last_report
    }

    pub fn last_report(&self) -> &ConvergenceReport { &self.last_report }

    fn debug_assert_invariants(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = invariants::validate(&self.registry) {
            panic!("[invariants] power tree corrupted: {}", e);
        }
    }

    /// Checks the structural invariants (single parent, consistent child
    /// index, no cycle).
    pub fn validate(&self) -> Result<(), invariants::InvariantError> {
        invariants::validate(&self.registry)
    }

    // --- Queries ---

    pub fn node_count(&self) -> usize { self.registry.count() }
    pub fn node_ids(&self) -> Vec<NodeId> { self.registry.ids().collect() }
    pub fn stage(&self, id: NodeId) -> Option<&Stage> { self.registry.get(id) }
    pub fn position(&self, id: NodeId) -> Option<Position> { self.registry.position(id) }
    pub fn upstream(&self, id: NodeId) -> Option<NodeId> { self.registry.upstream(id) }
    pub fn children(&self, id: NodeId) -> &[NodeId] { self.registry.children(id) }

    /// Stages in id order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> + '_ {
        self.registry.stages()
    }

    /// One edge per stage that has an upstream, ordered by destination id.
    pub fn edges(&self) -> Vec<Edge> {
        self.registry
            .stages()
            .filter_map(|s| s.upstream.map(|up| Edge::new(up, s.id)))
            .collect()
    }

    pub fn topological_order(&self) -> Vec<NodeId> { topology::sort(&self.registry) }

    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.registry.contains(id).then(|| topology::depth(&self.registry, id))
    }

    /// Diagnostics of the last recompute, stage by stage in id order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.registry.stages().flat_map(|s| s.diagnostics.iter())
    }

    /// Rendered diagnostics with duplicates dropped, first occurrence kept.
    pub fn error_report(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.diagnostics()
            .map(|d| d.to_string())
            .filter(|line| seen.insert(line.clone()))
            .collect()
    }
}

/// Validates `dst.upstream = src` against the current structure.
pub(crate) fn check_edge(registry: &Registry, src: NodeId, dst: NodeId) -> Result<(), EdgeError> {
    for id in [src, dst] {
        if !registry.contains(id) {
            return Err(EdgeError::UnknownNode(id));
        }
    }
    if src == dst {
        return Err(EdgeError::SelfLoop { node: src });
    }
    if let Some(upstream) = registry.upstream(dst) {
        return Err(EdgeError::DestinationAlreadyConnected { dst, upstream });
    }
    if topology::creates_cycle(registry, src, dst) {
        return Err(EdgeError::CycleDetected { src, dst });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::DiagnosticKind;

    /// SOURCE -> LDO 5 V -> LOAD
    fn scenario_a(load_current: f64) -> (PowerTree, NodeId, NodeId, NodeId) {
        let mut tree = PowerTree::new();
        let src = tree.add_stage(StageType::Source, None);
        let ldo = tree.add_stage(StageType::Ldo, None);
        let load = tree.add_stage(StageType::Load, None);
        tree.configure(ldo, |c| c.vout = 5.0).unwrap();
        tree.configure(load, |c| c.load_current = load_current).unwrap();
        tree.add_edge(src, ldo).unwrap();
        tree.add_edge(ldo, load).unwrap();
        (tree, src, ldo, load)
    }

    #[test]
    fn test_default_names_and_positions() {
        let mut tree = PowerTree::new();
        let a = tree.add_stage(StageType::Source, None);
        let b = tree.add_stage(StageType::Dcdc, None);
        let c = tree.add_stage(StageType::Load, Some(Position::new(-3.0, 7.5)));

        assert_eq!(tree.stage(a).unwrap().name(), "SOURCE_1");
        assert_eq!(tree.stage(b).unwrap().name(), "DCDC_2");
        assert_eq!(tree.position(a), Some(Position::new(50.0, 50.0)));
        assert_eq!(tree.position(b), Some(Position::new(51.0, 51.0)));
        assert_eq!(tree.position(c), Some(Position::new(-3.0, 7.5)));
        assert_eq!(tree.stage(b).unwrap().config.color, "#fff2c2");
    }

    #[test]
    fn test_add_stage_named_accepts_legacy_input() {
        let mut tree = PowerTree::new();
        let id = tree.add_stage_named("input", None).unwrap();
        assert_eq!(tree.stage(id).unwrap().stage_type(), StageType::Source);
        assert!(matches!(tree.add_stage_named("buck", None), Err(TreeError::UnknownStageType(_))));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_scenario_a_nominal_chain() {
        let (tree, src, ldo, load) = scenario_a(0.5);
        let l = tree.stage(ldo).unwrap().computed;
        assert!((tree.stage(load).unwrap().computed.i_in - 0.5).abs() < 1e-12);
        assert!((l.iout_user - 0.5).abs() < 1e-12);
        assert!((l.eff_effective - 5.0 / 12.0).abs() < 1e-12);
        assert!((l.p_out - 2.5).abs() < 1e-12);
        assert!(tree.diagnostics().all(|d| !d.is_violation()));
        assert_eq!(tree.last_report().violations, 0);
        assert_eq!(tree.depth(src), Some(3));
    }

    #[test]
    fn test_scenario_b_overload() {
        let (tree, src, ldo, _) = scenario_a(3.0);
        let on = |id: NodeId| tree.stage(id).unwrap().diagnostics.iter().map(|d| d.kind.clone()).collect::<Vec<_>>();

        assert!(on(ldo).iter().any(|k| matches!(k, DiagnosticKind::CurrentCapabilityExceeded { .. })));
        assert!(on(src).iter().any(|k| matches!(k, DiagnosticKind::SupplyOverload { .. })));
        assert!(tree.error_report().iter().any(|l| l == "[SOURCE_1] Total load 3 A > source Imax 2 A"));
    }

    #[test]
    fn test_scenario_c_cycle_is_rejected() {
        let mut tree = PowerTree::new();
        let a = tree.add_stage(StageType::Ldo, None);
        let b = tree.add_stage(StageType::Ldo, None);
        tree.add_edge(a, b).unwrap();
        let before: Vec<Stage> = tree.stages().cloned().collect();
        let report = tree.last_report().clone();

        assert_eq!(tree.add_edge(b, a), Err(EdgeError::CycleDetected { src: b, dst: a }));
        assert_eq!(tree.stages().cloned().collect::<Vec<_>>(), before);
        assert_eq!(tree.last_report(), &report);
        assert_eq!(tree.edges(), vec![Edge::new(a, b)]);
    }

    #[test]
    fn test_edge_checks_run_in_order() {
        let mut tree = PowerTree::new();
        let a = tree.add_stage(StageType::Source, None);
        let b = tree.add_stage(StageType::Ldo, None);
        let c = tree.add_stage(StageType::Load, None);
        tree.add_edge(a, c).unwrap();

        assert_eq!(tree.add_edge(a, NodeId(9)), Err(EdgeError::UnknownNode(NodeId(9))));
        assert_eq!(tree.add_edge(b, b), Err(EdgeError::SelfLoop { node: b }));
        assert_eq!(tree.add_edge(b, c), Err(EdgeError::DestinationAlreadyConnected { dst: c, upstream: a }));
        // Self-loop wins over "already connected".
        assert_eq!(tree.add_edge(c, c), Err(EdgeError::SelfLoop { node: c }));
    }

    #[test]
    fn test_scenario_d_remove_node_with_two_children() {
        let mut tree = PowerTree::new();
        let src = tree.add_stage(StageType::Source, None);
        let dcdc = tree.add_stage(StageType::Dcdc, None);
        let l1 = tree.add_stage(StageType::Load, None);
        let l2 = tree.add_stage(StageType::Load, None);
        tree.add_edge(src, dcdc).unwrap();
        tree.add_edge(dcdc, l1).unwrap();
        tree.add_edge(dcdc, l2).unwrap();

        let removed = tree.remove_node(dcdc).unwrap();
        assert_eq!(removed.name(), "DCDC_2");
        assert_eq!(tree.upstream(l1), None);
        assert_eq!(tree.upstream(l2), None);
        assert!(tree.children(src).is_empty());
        assert!(tree.edges().is_empty());
        assert_eq!(tree.remove_node(dcdc).unwrap_err(), TreeError::NodeNotFound(dcdc));
        assert_eq!(tree.validate(), Ok(()));

        // Ids are not reused.
        let next = tree.add_stage(StageType::Ldo, None);
        assert_eq!(next, NodeId(4));
    }

    #[test]
    fn test_configure_triggers_recompute() {
        let (mut tree, _, ldo, load) = scenario_a(0.5);
        tree.configure(load, |c| c.load_current = 0.8).unwrap();
        assert!((tree.stage(ldo).unwrap().computed.iout_user - 0.8).abs() < 1e-12);

        let patch = ConfigPatch { vout: Some(3.3), ..Default::default() };
        tree.apply_patch(ldo, patch).unwrap();
        assert_eq!(tree.stage(load).unwrap().config.vout, 3.3);
        assert_eq!(tree.configure(NodeId(77), |_| {}), Err(TreeError::NodeNotFound(NodeId(77))));
    }

    #[test]
    fn test_set_position_does_not_recompute() {
        let (mut tree, src, ..) = scenario_a(0.5);
        tree.set_position(src, Position::new(1.0, 2.0)).unwrap();
        assert_eq!(tree.position(src), Some(Position::new(1.0, 2.0)));
        assert!(tree.set_position(NodeId(99), Position::default()).is_err());
    }

    #[test]
    fn test_set_rules_recomputes_with_new_thresholds() {
        let (mut tree, src, ..) = scenario_a(1.7);
        assert!(tree.stage(src).unwrap().diagnostics.is_empty());
        tree.set_rules(RuleConfig { supply_warning_ratio: 0.5, ..RuleConfig::default() });
        assert_eq!(tree.last_report().warnings, 1);
        // LDO capability (1 A) is exceeded as well.
        assert_eq!(tree.last_report().violations, 1);
    }

    #[test]
    fn test_error_report_is_deduplicated() {
        let mut tree = PowerTree::new();
        // Two disconnected LDOs with the same name and the same dropout problem.
        for _ in 0..2 {
            let mut config = StageConfig::for_type(StageType::Ldo);
            config.name = "U1".into();
            config.vin_nom = 3.3;
            config.vout = 3.3;
            tree.add_stage_with(config, None);
        }
        assert_eq!(tree.diagnostics().count(), 2);
        assert_eq!(tree.error_report(), vec!["[U1] Vin 3.3 V must be > Vout 3.3 V for an LDO".to_string()]);
    }

    #[test]
    fn test_topological_order_and_depth() {
        let (tree, src, ldo, load) = scenario_a(0.1);
        assert_eq!(tree.topological_order(), vec![src, ldo, load]);
        assert_eq!(tree.depth(ldo), Some(2));
        assert_eq!(tree.depth(NodeId(40)), None);
    }
}

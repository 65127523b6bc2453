use super::format::Sig;
use crate::compute::Severity;
use crate::graph::PowerTree;
use crate::store::{NodeId, Stage, StageType};
use std::collections::HashSet;
use std::fmt::Write;

/// Per-type metric lines of a stage, as shown on its node card.
pub fn stage_summary(stage: &Stage) -> Vec<String> {
    let cfg = &stage.config;
    let c = &stage.computed;
    let mut lines = match cfg.stage_type {
        StageType::Source => vec![
            format!("Vout_nom = {} V", Sig(cfg.vout)),
            format!("Source range: {} ; {} V", Sig(cfg.vin_min), Sig(cfg.vin_max)),
            format!("Imax_source = {} A", Sig(cfg.iout_max_ic)),
        ],
        StageType::Load => vec![
            format!("Vload = {} V", Sig(cfg.vout)),
            format!("Load current = {} A", Sig(cfg.load_current)),
            format!("Dissipated power = {} W", Sig(c.p_in)),
        ],
        StageType::Ldo | StageType::Dcdc => {
            return vec![
                format!("Vin = {} V (range {} ; {})", Sig(c.vin_effective), Sig(cfg.vin_min), Sig(cfg.vin_max)),
                format!("Vout = {} V", Sig(cfg.vout)),
                format!("Imax_IC = {} A", Sig(cfg.iout_max_ic)),
                format!("η = {:.1}%, Iq = {} uA", c.eff_effective * 100.0, Sig(cfg.iq)),
                format!("Pin = {} W, Pout = {} W", Sig(c.p_in), Sig(c.p_out)),
                format!("Iin = {} A, Pdiss = {} W", Sig(c.i_in), Sig(c.p_diss)),
                format!("Ptot ≈ {} W", Sig(c.p_tot)),
            ];
        }
    };
    if !cfg.notes.is_empty() {
        lines.push(format!("Notes: {}", cfg.notes));
    }
    lines
}

/// Renders the whole tree, one branch per root, with each stage's metrics
/// and diagnostics under it.
pub fn format_tree(tree: &PowerTree) -> String {
    let mut printer = TreePrinter { tree, visited: HashSet::new(), output: String::new() };

    let _ = writeln!(printer.output, "POWER TREE ({} stages)", tree.node_count());
    let _ = writeln!(printer.output, "--------------------------------------------------");

    for stage in tree.stages().filter(|s| s.upstream.is_none()) {
        printer.print_node(stage.id, "", "");
    }

    let unreached: Vec<String> = tree
        .node_ids()
        .into_iter()
        .filter(|id| !printer.visited.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !unreached.is_empty() {
        let _ = writeln!(printer.output, "(unreachable: {})", unreached.join(", "));
    }
    printer.output
}

struct TreePrinter<'a> {
    tree: &'a PowerTree,
    visited: HashSet<NodeId>,
    output: String,
}

impl<'a> TreePrinter<'a> {
    /// `line_prefix` precedes the stage's own line, `stem` the lines below it.
    fn print_node(&mut self, id: NodeId, line_prefix: &str, stem: &str) {
        if !self.visited.insert(id) {
            let _ = writeln!(self.output, "{}-> (Ref to {})", line_prefix, id);
            return;
        }
        let Some(stage) = self.tree.stage(id) else { return };
        let children = self.tree.children(id);

        let ic = if stage.config.ic_name.is_empty() { String::new() } else { format!(" ({})", stage.config.ic_name) };
        let _ = writeln!(self.output, "{}[{}] {}{}", line_prefix, stage.stage_type(), stage.name(), ic);

        let detail = format!("{}{}", stem, if children.is_empty() { "   " } else { "|  " });
        for line in stage_summary(stage) {
            let _ = writeln!(self.output, "{}{}", detail, line);
        }
        for d in &stage.diagnostics {
            let tag = match d.severity() {
                Severity::Violation => "ERROR",
                Severity::Warning => "WARN",
            };
            let _ = writeln!(self.output, "{}{}: {}", detail, tag, d.kind);
        }

        for (i, &child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "`-- " } else { "|-- " };
            let child_stem = format!("{}{}", stem, if is_last { "    " } else { "|   " });
            self.print_node(child, &format!("{}{}", stem, connector), &child_stem);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_stage_tree() {
        let mut tree = PowerTree::new();
        let src = tree.add_stage(StageType::Source, None);
        let load = tree.add_stage(StageType::Load, None);
        tree.configure(load, |c| { c.load_current = 0.5; c.notes = "MCU".into(); }).unwrap();
        tree.add_edge(src, load).unwrap();

        let expected = "\
POWER TREE (2 stages)
--------------------------------------------------
[SOURCE] SOURCE_1
|  Vout_nom = 12 V
|  Source range: 11 ; 13 V
|  Imax_source = 2 A
`-- [LOAD] LOAD_2
       Vload = 12 V
       Load current = 0.5 A
       Dissipated power = 6 W
       Notes: MCU
";
        assert_eq!(format_tree(&tree), expected);
    }

    #[test]
    fn test_branches_and_diagnostics() {
        let mut tree = PowerTree::new();
        let src = tree.add_stage(StageType::Source, None);
        let ldo = tree.add_stage(StageType::Ldo, None);
        let dcdc = tree.add_stage(StageType::Dcdc, None);
        let load = tree.add_stage(StageType::Load, None);
        tree.configure(ldo, |c| { c.vout = 3.3; c.ic_name = "TLV755".into(); }).unwrap();
        tree.configure(load, |c| c.load_current = 3.0).unwrap();
        tree.add_edge(src, ldo).unwrap();
        tree.add_edge(src, dcdc).unwrap();
        tree.add_edge(ldo, load).unwrap();

        let out = format_tree(&tree);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.contains(&"|-- [LDO] LDO_2 (TLV755)"));
        assert!(lines.contains(&"|   `-- [LOAD] LOAD_4"));
        assert!(lines.contains(&"`-- [DCDC] DCDC_3"));
        assert!(lines.contains(&"|   |  ERROR: IC max current 1 A < requested Iout 3 A"));
        assert!(lines.contains(&"|  ERROR: Total load 3 A > source Imax 2 A"));
        assert!(lines.contains(&"       η = 90.0%, Iq = 0 uA"));
        assert!(!out.contains("unreachable"));
    }

    #[test]
    fn test_regulator_summary() {
        let mut tree = PowerTree::new();
        let src = tree.add_stage(StageType::Source, None);
        let ldo = tree.add_stage(StageType::Ldo, None);
        let load = tree.add_stage(StageType::Load, None);
        tree.configure(ldo, |c| c.vout = 5.0).unwrap();
        tree.configure(load, |c| c.load_current = 0.5).unwrap();
        tree.add_edge(src, ldo).unwrap();
        tree.add_edge(ldo, load).unwrap();

        let summary = stage_summary(tree.stage(ldo).unwrap());
        assert_eq!(
            summary,
            vec![
                "Vin = 12 V (range 0 ; 20)",
                "Vout = 5 V",
                "Imax_IC = 1 A",
                "η = 41.7%, Iq = 0 uA",
                "Pin = 6 W, Pout = 2.5 W",
                "Iin = 0.5 A, Pdiss = 3.5 W",
                "Ptot ≈ 3.5 W",
            ]
        );
    }
}

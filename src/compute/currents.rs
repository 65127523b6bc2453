use crate::store::{NodeId, Registry, StageType};

/// Aggregates requested current bottom-up.
///
/// `order` must be a topological order (upstream first); it is walked in
/// reverse so that every child is settled before its parent. A LOAD requests
/// its own `load_current`; any other stage requests the sum of its children's
/// `i_in` as computed by the most recent calculator pass.
pub fn propagate(registry: &mut Registry, order: &[NodeId]) {
    for &id in order.iter().rev() {
        let requested = match registry.get(id) {
            None => continue,
            Some(stage) if stage.stage_type() == StageType::Load => stage.config.load_current,
            Some(_) => registry
                .children(id)
                .iter()
                .filter_map(|&child| registry.get(child))
                .map(|child| child.computed.i_in)
                .sum::<f64>(),
        };
        if let Some(stage) = registry.get_mut(id) {
            stage.computed.iout_user = requested;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::topology;
    use crate::store::{Position, StageConfig};

    #[test]
    fn test_sums_children_input_current() {
        let mut reg = Registry::new();
        let src = reg.insert(StageConfig::for_type(StageType::Source), Position::default());
        let dcdc = reg.insert(StageConfig::for_type(StageType::Dcdc), Position::default());
        let mut load_cfg = StageConfig::for_type(StageType::Load);
        load_cfg.load_current = 0.75;
        let load = reg.insert(load_cfg, Position::default());
        let idle = reg.insert(StageConfig::for_type(StageType::Ldo), Position::default());
        reg.link(src, dcdc);
        reg.link(dcdc, load);
        reg.link(src, idle);

        reg.get_mut(dcdc).unwrap().computed.i_in = 0.4;
        reg.get_mut(idle).unwrap().computed.i_in = 0.1;

        let order = topology::sort(&reg);
        propagate(&mut reg, &order);

        assert_eq!(reg.get(load).unwrap().computed.iout_user, 0.75);
        // The DCDC sees its load's i_in from the previous pass (still 0 here).
        assert_eq!(reg.get(dcdc).unwrap().computed.iout_user, 0.0);
        assert_eq!(reg.get(src).unwrap().computed.iout_user, 0.4 + 0.1);
        // Childless non-loads request nothing.
        assert_eq!(reg.get(idle).unwrap().computed.iout_user, 0.0);
    }
}

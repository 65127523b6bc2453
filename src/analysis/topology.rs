use crate::store::{NodeId, Registry, StageType};
use std::collections::{HashMap, HashSet, VecDeque};

/// Returns an order in which every stage appears after its upstream, using
/// Kahn's Algorithm.
///
/// Never fails: stages that Kahn cannot reach (an upstream that points at a
/// missing id, or a corrupted chain) are appended at the end in id order, so
/// every stage is still evaluated.
pub fn sort(registry: &Registry) -> Vec<NodeId> {
    let count = registry.count();
    let mut in_degree: HashMap<NodeId, usize> = HashMap::with_capacity(count);
    let mut queue = VecDeque::with_capacity(count);
    let mut order = Vec::with_capacity(count);

    // 1. Initialize In-Degrees (single parent: 0 or 1)
    for id in registry.ids() {
        let degree = usize::from(registry.upstream(id).is_some());
        in_degree.insert(id, degree);
        if degree == 0 {
            queue.push_back(id);
        }
    }

    // 2. Process Queue
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &child in registry.children(node) {
            if let Some(degree) = in_degree.get_mut(&child) {
                if *degree > 0 {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }
    }

    // 3. Orphans
    if order.len() != count {
        let placed: HashSet<NodeId> = order.iter().copied().collect();
        let orphans: Vec<NodeId> = registry.ids().filter(|id| !placed.contains(id)).collect();
        log::warn!("topological sort left {} stage(s) unreached: {:?}", orphans.len(), orphans);
        order.extend(orphans);
    }

    order
}

/// Length of the longest chain starting at `id` (a leaf has depth 1).
///
/// Counts levels breadth-first; a stage already seen is not expanded again,
/// so a corrupt loop ends the walk instead of recursing forever.
pub fn depth(registry: &Registry, id: NodeId) -> usize {
    let mut visited = HashSet::from([id]);
    let mut level = vec![id];
    let mut depth = 0;
    while !level.is_empty() {
        depth += 1;
        level = level
            .iter()
            .flat_map(|&node| registry.children(node).iter().copied())
            .filter(|&child| visited.insert(child))
            .collect();
    }
    depth
}

/// Number of propagate/calculate passes needed for current and voltage to
/// settle: the longest chain below any SOURCE, or below any root so that
/// disconnected chains settle as well. At least 1.
pub fn pass_count(registry: &Registry) -> usize {
    registry
        .stages()
        .filter(|s| s.stage_type() == StageType::Source || s.upstream.is_none())
        .map(|s| depth(registry, s.id))
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Would `dst.upstream = src` close a loop? Walks the upstream chain from
/// `src` looking for `dst`. The walk stops on a repeated or dangling id, so a
/// chain that is already corrupt cannot hang it.
pub fn creates_cycle(registry: &Registry, src: NodeId, dst: NodeId) -> bool {
    let mut visited = HashSet::new();
    let mut current = src;
    while let Some(up) = registry.upstream(current) {
        if !visited.insert(up) {
            break;
        }
        if up == dst {
            return true;
        }
        if !registry.contains(up) {
            break;
        }
        current = up;
    }
    false
}

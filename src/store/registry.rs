use super::stage::{Stage, StageConfig};
use super::types::{NodeId, Position};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Children of one node, kept sorted by id so that aggregation over
/// siblings always happens in the same order.
pub type Children = SmallVec<[NodeId; 4]>;

#[derive(Debug, Clone)]
struct Entry {
    stage: Stage,
    position: Position,
    children: Children,
}

/// Arena owning every stage of a tree, keyed by id.
///
/// The upstream pointer lives on the `Stage`; the registry mirrors it in a
/// children-by-parent index so downstream lookups never scan the arena.
/// Structural checks (self-loops, second parents, cycles) are the caller's
/// job: `link` trusts its inputs.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<NodeId, Entry>,
    /// `None` once the counter has handed out `u32::MAX`.
    next_id: Option<u32>,
}

impl Default for Registry {
    fn default() -> Self {
        Self { entries: BTreeMap::new(), next_id: Some(0) }
    }
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.entries.len() }
    pub fn contains(&self, id: NodeId) -> bool { self.entries.contains_key(&id) }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> + '_ {
        self.entries.values().map(|e| &e.stage)
    }

    pub fn get(&self, id: NodeId) -> Option<&Stage> {
        self.entries.get(&id).map(|e| &e.stage)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Stage> {
        self.entries.get_mut(&id).map(|e| &mut e.stage)
    }

    pub fn position(&self, id: NodeId) -> Option<Position> {
        self.entries.get(&id).map(|e| e.position)
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> bool {
        match self.entries.get_mut(&id) {
            Some(e) => { e.position = position; true }
            None => false,
        }
    }

    #[inline(always)]
    pub fn upstream(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).and_then(|e| e.stage.upstream)
    }

    #[inline(always)]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.entries.get(&id) {
            Some(e) => e.children.as_slice(),
            None => &[],
        }
    }

    /// Registers a new stage under a freshly allocated id.
    pub fn insert(&mut self, config: StageConfig, position: Position) -> NodeId {
        let id = self.allocate();
        self.entries.insert(id, Entry { stage: Stage::new(id, config), position, children: Children::new() });
        id
    }

    /// Registers a stage that already carries an id (document loading).
    /// The upstream pointer is cleared; edges are re-created with `link`.
    /// Returns the id back as the error if it is already taken.
    pub fn insert_existing(&mut self, mut stage: Stage, position: Position) -> Result<NodeId, NodeId> {
        let id = stage.id;
        if self.entries.contains_key(&id) {
            return Err(id);
        }
        stage.upstream = None;
        self.next_id = match (self.next_id, id.0.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        self.entries.insert(id, Entry { stage, position, children: Children::new() });
        Ok(id)
    }

    /// Removes a stage. Its children become roots and its parent forgets it.
    pub fn remove(&mut self, id: NodeId) -> Option<Stage> {
        let entry = self.entries.remove(&id)?;

        if let Some(parent) = entry.stage.upstream {
            if let Some(p) = self.entries.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        for child in &entry.children {
            if let Some(c) = self.entries.get_mut(child) {
                c.stage.upstream = None;
            }
        }

        let mut stage = entry.stage;
        stage.upstream = None;
        Some(stage)
    }

    /// Sets `dst.upstream = src` and indexes `dst` under `src`.
    pub(crate) fn link(&mut self, src: NodeId, dst: NodeId) {
        if let Some(d) = self.entries.get_mut(&dst) {
            d.stage.upstream = Some(src);
        }
        if let Some(s) = self.entries.get_mut(&src) {
            if let Err(pos) = s.children.binary_search(&dst) {
                s.children.insert(pos, dst);
            }
        }
    }

    /// Ids come from a monotonic counter. Once the counter is spent (a
    /// document carried `u32::MAX`), the lowest id not in use is taken instead.
    fn allocate(&mut self) -> NodeId {
        if let Some(next) = self.next_id {
            self.next_id = next.checked_add(1);
            return NodeId(next);
        }
        let mut candidate = 0u32;
        for id in self.entries.keys() {
            if id.0 != candidate {
                break;
            }
            candidate = candidate.saturating_add(1);
        }
        NodeId(candidate)
    }
}

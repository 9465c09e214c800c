use fnv::FnvHashMap;

use crate::moves::{Move, Moves};
use crate::state::State;

use super::features::FeatureVector;

pub(crate) type NodeId = usize;

/// One state in the search tree.
pub(crate) struct SearchNode {
    pub(crate) state: State,
    /// Sum of move weights from the root.
    pub(crate) weight: u32,
    pub(crate) parent: Option<NodeId>,
    /// The move that created this node - root has none.
    pub(crate) mov: Option<Move>,
    /// Unexpanded candidates with their move weights.
    pub(crate) candidates: Vec<(Move, u32)>,
    pub(crate) expanded: bool,
}

/// Arena of search nodes plus the global visited-state registry.
///
/// Nodes reference each other by index, never by pointer, and are never
/// evicted - memory grows with every unique state explored, which is why
/// callers must bound `max_states`.
pub(crate) struct SearchTree {
    nodes: Vec<SearchNode>,
    visited: FnvHashMap<State, NodeId>,
}

impl SearchTree {
    pub(crate) fn new() -> Self {
        SearchTree {
            nodes: Vec::new(),
            visited: FnvHashMap::default(),
        }
    }

    /// Inserts a state, `None` if an equal state already exists anywhere in
    /// the tree - deduplication is global, not per-path.
    pub(crate) fn add_state(
        &mut self,
        state: State,
        weight: u32,
        parent: Option<NodeId>,
        mov: Option<Move>,
    ) -> Option<NodeId> {
        if self.visited.contains_key(&state) {
            return None;
        }
        let id = self.nodes.len();
        self.visited.insert(state.clone(), id);
        self.nodes.push(SearchNode {
            state,
            weight,
            parent,
            mov,
            candidates: Vec::new(),
            expanded: false,
        });
        Some(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id]
    }

    /// The moves from the root to `id`, in playing order.
    pub(crate) fn path_moves(&self, id: NodeId) -> Moves {
        let mut rev = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.nodes[cur].parent {
            rev.push(self.nodes[cur].mov.clone().unwrap());
            cur = parent;
        }
        let mut moves = Moves::default();
        for mov in rev.into_iter().rev() {
            moves.add(mov);
        }
        moves
    }
}

/// The 4D bucket map with a rotating cursor.
///
/// Cycling buckets round-robin (instead of best-first on some scalar) is the
/// heart of FESS: every discovered feature-space region keeps getting its
/// fair share of expansions.
pub(crate) struct FeatureSpace {
    cells: FnvHashMap<FeatureVector, Vec<NodeId>>,
    /// Non-empty cells in discovery order - iteration must not depend on
    /// hash map ordering.
    order: Vec<FeatureVector>,
    cursor: usize,
}

impl FeatureSpace {
    pub(crate) fn new() -> Self {
        FeatureSpace {
            cells: FnvHashMap::default(),
            order: Vec::new(),
            cursor: 0,
        }
    }

    pub(crate) fn add_state_to_cell(&mut self, fv: FeatureVector, id: NodeId) {
        let bucket = self.cells.entry(fv).or_insert_with(Vec::new);
        if bucket.is_empty() {
            self.order.push(fv);
        }
        bucket.push(id);
    }

    /// The next cell in round-robin order.
    pub(crate) fn next_cell_for_cycling(&mut self) -> Option<FeatureVector> {
        if self.order.is_empty() {
            return None;
        }
        let fv = self.order[self.cursor % self.order.len()];
        self.cursor += 1;
        Some(fv)
    }

    pub(crate) fn cell_nodes(&self, fv: FeatureVector) -> &[NodeId] {
        self.cells.get(&fv).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn cell_cnt(&self) -> usize {
        self.order.len()
    }
}

use alloc::collections::VecDeque;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Order in which pending cells are taken off the worklist.
///
/// Either order reaches the same fixed point; only the visiting order differs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainOrder {
    #[default]
    Fifo,
    Lifo,
}

/// Cells that need their deduction re-checked.
///
/// The membership grid says whether a cell is currently dirty, the worklist says in which order to
/// look at them. Marking always pushes, so a cell can sit in the worklist more than once; entries
/// whose membership was already cleared are stale and get skipped when taken.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirtySet {
    members: Array2<bool>,
    worklist: VecDeque<Coord2>,
    order: DrainOrder,
}

impl DirtySet {
    pub fn new(size: Coord2, order: DrainOrder) -> Self {
        Self {
            members: Array2::default(size.to_nd_index()),
            worklist: VecDeque::new(),
            order,
        }
    }

    pub fn order(&self) -> DrainOrder {
        self.order
    }

    pub fn is_dirty(&self, coords: Coord2) -> bool {
        self.members[coords.to_nd_index()]
    }

    /// Number of worklist entries, stale ones included.
    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    pub fn mark_dirty(&mut self, coords: Coord2) {
        self.members[coords.to_nd_index()] = true;
        self.worklist.push_back(coords);
    }

    /// Marks `coords` and all of its in-bounds neighbours, returning how many marks were made.
    pub fn mark_neighborhood_dirty(&mut self, coords: Coord2) -> usize {
        let neighbors = self.members.iter_neighbors(coords);
        self.mark_dirty(coords);
        let mut marked = 1;
        for neighbor in neighbors {
            self.mark_dirty(neighbor);
            marked += 1;
        }
        marked
    }

    pub fn take_next(&mut self) -> Option<Coord2> {
        match self.order {
            DrainOrder::Fifo => self.worklist.pop_front(),
            DrainOrder::Lifo => self.worklist.pop_back(),
        }
    }

    pub fn clear(&mut self, coords: Coord2) {
        self.members[coords.to_nd_index()] = false;
    }

    /// Worklist empty and no membership left set.
    pub fn is_quiescent(&self) -> bool {
        self.worklist.is_empty() && self.members.iter().all(|&dirty| !dirty)
    }

    /// Panics if the worklist is empty while some cell is still marked dirty, which would mean a
    /// mark was lost.
    pub fn assert_drained(&self) {
        assert!(self.worklist.is_empty(), "worklist still holds {} entries", self.worklist.len());
        if let Some(((x, y), _)) = self.members.indexed_iter().find(|&(_, &dirty)| dirty) {
            panic!("cell ({x}, {y}) is still dirty after the worklist drained");
        }
    }
}

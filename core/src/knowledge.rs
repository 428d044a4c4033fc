use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Per-cell knowledge for a whole board.
///
/// Cells only ever move out of [`CellKnowledge::Hidden`], and only once. The running totals are
/// kept in step with the array so the solver can ask whether anything is left to do without a scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGrid {
    cells: Array2<CellKnowledge>,
    hidden_count: CellCount,
    flagged_count: CellCount,
    revealed_count: CellCount,
}

impl KnowledgeGrid {
    pub fn new(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
            hidden_count: mult(size.0, size.1),
            flagged_count: 0,
            revealed_count: 0,
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.cells.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn in_bounds(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size())
    }

    /// In-bounds neighbours of `coords`. Panics if `coords` itself is out of bounds.
    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    pub fn cell_at(&self, coords: Coord2) -> CellKnowledge {
        self.cells[coords.to_nd_index()]
    }

    pub fn hidden_count(&self) -> CellCount {
        self.hidden_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.hidden_count == 0
    }

    /// Coordinates of every hidden cell, column by column.
    pub fn iter_hidden(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.iter()
            .filter(|&(_, cell)| cell.is_hidden())
            .map(|(coords, _)| coords)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord2, CellKnowledge)> + '_ {
        self.cells.indexed_iter().map(|((x, y), &cell)| {
            // shape came from `Coord2`, so both axes fit
            ((x as Coord, y as Coord), cell)
        })
    }

    /// Resolves a hidden cell. Panics when the cell is already resolved or the new state is
    /// `Hidden`, both of which would break monotonicity.
    pub(crate) fn resolve(&mut self, coords: Coord2, knowledge: CellKnowledge) {
        let cell = &mut self.cells[coords.to_nd_index()];
        assert!(
            cell.is_hidden(),
            "cell {coords:?} is already resolved as {cell:?}"
        );

        match knowledge {
            CellKnowledge::Hidden => panic!("cell {coords:?} cannot be resolved back to hidden"),
            CellKnowledge::Flagged => self.flagged_count += 1,
            CellKnowledge::Revealed(count) => {
                assert!(count <= 8, "cell {coords:?} reports {count} adjacent mines");
                self.revealed_count += 1;
            }
        }

        *cell = knowledge;
        self.hidden_count -= 1;
    }
}

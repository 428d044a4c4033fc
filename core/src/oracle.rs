use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Answer to a reveal query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealResult {
    /// The cell is safe; this many of its neighbours hold mines.
    SafeCount(u8),
    Detonated,
}

/// Authority over the true mine positions.
///
/// The solver only ever learns about the board through [`Oracle::reveal_cell`]; it never
/// inspects where the mines are. Each cell is revealed at most once.
pub trait Oracle {
    fn size(&self) -> Coord2;

    fn mine_count(&self) -> CellCount;

    fn reveal_cell(&mut self, coords: Coord2) -> RevealResult;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn size(&self) -> Coord2 {
        (**self).size()
    }

    fn mine_count(&self) -> CellCount {
        (**self).mine_count()
    }

    fn reveal_cell(&mut self, coords: Coord2) -> RevealResult {
        (**self).reveal_cell(coords)
    }
}

/// Oracle backed by a concrete [`MineLayout`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    layout: MineLayout,
    opened: Array2<bool>,
    opened_count: CellCount,
    triggered_mine: Option<Coord2>,
}

impl Board {
    pub fn new(layout: MineLayout) -> Self {
        let size = layout.size();
        Self {
            layout,
            opened: Array2::default(size.to_nd_index()),
            opened_count: 0,
            triggered_mine: None,
        }
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    pub fn is_opened(&self, coords: Coord2) -> bool {
        self.opened[coords.to_nd_index()]
    }

    pub fn opened_count(&self) -> CellCount {
        self.opened_count
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }
}

impl Oracle for Board {
    fn size(&self) -> Coord2 {
        self.layout.size()
    }

    fn mine_count(&self) -> CellCount {
        self.layout.mine_count()
    }

    fn reveal_cell(&mut self, coords: Coord2) -> RevealResult {
        let coords = match self.layout.validate_coords(coords) {
            Ok(coords) => coords,
            Err(err) => panic!("reveal of {coords:?}: {err}"),
        };
        assert!(
            !self.opened[coords.to_nd_index()],
            "cell {coords:?} was already revealed"
        );

        self.opened[coords.to_nd_index()] = true;
        self.opened_count += 1;

        if self.layout.contains_mine(coords) {
            self.triggered_mine = Some(coords);
            RevealResult::Detonated
        } else {
            RevealResult::SafeCount(self.layout.adjacent_mine_count(coords))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::new(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    #[test]
    fn reveal_reports_counts_and_detonations() {
        let mut board = board((3, 3), &[(2, 2)]);

        assert_eq!(board.reveal_cell((0, 0)), RevealResult::SafeCount(0));
        assert_eq!(board.reveal_cell((1, 1)), RevealResult::SafeCount(1));
        assert_eq!(board.triggered_mine(), None);

        assert_eq!(board.reveal_cell((2, 2)), RevealResult::Detonated);
        assert_eq!(board.triggered_mine(), Some((2, 2)));
        assert_eq!(board.opened_count(), 3);
        assert!(board.is_opened((1, 1)));
        assert!(!board.is_opened((1, 0)));
    }

    #[test]
    #[should_panic(expected = "already revealed")]
    fn repeated_reveal_is_a_contract_violation() {
        let mut board = board((2, 2), &[]);

        board.reveal_cell((1, 1));
        board.reveal_cell((1, 1));
    }

    #[test]
    #[should_panic(expected = "Invalid coordinates")]
    fn out_of_bounds_reveal_is_a_contract_violation() {
        let mut board = board((2, 2), &[]);

        board.reveal_cell((2, 0));
    }

    fn reveal_through<O: Oracle>(mut oracle: O, coords: Coord2) -> (Coord2, CellCount, RevealResult) {
        (oracle.size(), oracle.mine_count(), oracle.reveal_cell(coords))
    }

    #[test]
    fn borrowed_oracle_forwards_queries() {
        let mut board = board((2, 1), &[(0, 0)]);

        let answer = reveal_through(&mut board, (1, 0));

        assert_eq!(answer, ((2, 1), 1, RevealResult::SafeCount(1)));
        assert!(board.is_opened((1, 0)));
    }
}

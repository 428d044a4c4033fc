use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Running counters of the work done by a [`KnowledgeEngine`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub reveals: CellCount,
    pub flags: CellCount,
    /// Deduction checks of cells that were still marked dirty.
    pub evaluations: u64,
    /// Worklist entries skipped because the cell had already been checked.
    pub stale_skips: u64,
    pub dirty_marks: u64,
}

/// Incremental solver state: what is known about every cell, and which cells need another look.
///
/// Every change of knowledge goes through [`reveal`](Self::reveal) or [`flag`](Self::flag), which
/// both dirty the neighbourhood of the changed cell. [`drain`](Self::drain) then re-runs the
/// deduction on dirty cells until nothing more follows.
#[derive(Clone, Debug)]
pub struct KnowledgeEngine<O> {
    oracle: O,
    grid: KnowledgeGrid,
    dirty: DirtySet,
    stats: EngineStats,
}

impl<O: Oracle> KnowledgeEngine<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_order(oracle, DrainOrder::default())
    }

    pub fn with_order(oracle: O, order: DrainOrder) -> Self {
        let size = oracle.size();
        Self {
            oracle,
            grid: KnowledgeGrid::new(size),
            dirty: DirtySet::new(size, order),
            stats: EngineStats::default(),
        }
    }

    pub fn size(&self) -> Coord2 {
        self.grid.size()
    }

    pub fn mine_count(&self) -> CellCount {
        self.oracle.mine_count()
    }

    pub fn grid(&self) -> &KnowledgeGrid {
        &self.grid
    }

    pub fn cell_at(&self, coords: Coord2) -> CellKnowledge {
        self.grid.cell_at(coords)
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn is_quiescent(&self) -> bool {
        self.dirty.is_quiescent()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Asks the oracle about a hidden cell.
    ///
    /// A detonation leaves the knowledge untouched and is handed back to the caller. Panics if the
    /// cell is out of bounds or already resolved.
    pub fn reveal(&mut self, coords: Coord2) -> Result<u8, Detonated> {
        self.check_hidden(coords);

        match self.oracle.reveal_cell(coords) {
            RevealResult::Detonated => Err(Detonated { coords }),
            RevealResult::SafeCount(count) => {
                self.grid.resolve(coords, CellKnowledge::Revealed(count));
                self.stats.reveals += 1;
                self.mark_neighborhood_dirty(coords);
                Ok(count)
            }
        }
    }

    /// Records a deduced mine. Panics if the cell is out of bounds or already resolved, or if
    /// there would be more flags than mines on the board.
    pub fn flag(&mut self, coords: Coord2) {
        self.check_hidden(coords);

        self.grid.resolve(coords, CellKnowledge::Flagged);
        self.stats.flags += 1;
        assert!(
            self.grid.flagged_count() <= self.oracle.mine_count(),
            "flagging {coords:?} makes {} flags on a board with {} mines",
            self.grid.flagged_count(),
            self.oracle.mine_count()
        );
        self.mark_neighborhood_dirty(coords);
    }

    pub fn mark_neighborhood_dirty(&mut self, coords: Coord2) {
        let marked = self.dirty.mark_neighborhood_dirty(coords);
        self.stats.dirty_marks += marked as u64;
    }

    /// Reveals every neighbour of `coords` that is still hidden when it is reached.
    pub fn reveal_all_hidden_neighbors(&mut self, coords: Coord2) -> Result<(), Detonated> {
        for neighbor in self.grid.neighbors(coords) {
            if self.grid.cell_at(neighbor).is_hidden() {
                self.reveal(neighbor)?;
            }
        }
        Ok(())
    }

    /// Flags every neighbour of `coords` that is still hidden when it is reached.
    pub fn flag_all_hidden_neighbors(&mut self, coords: Coord2) {
        for neighbor in self.grid.neighbors(coords) {
            if self.grid.cell_at(neighbor).is_hidden() {
                self.flag(neighbor);
            }
        }
    }

    /// Runs the deduction rule on one cell if it is marked dirty, then clears the mark.
    ///
    /// For a revealed cell with `n` adjacent mines, `n` minus the flagged neighbours is the number
    /// of mines still among the hidden neighbours. If that is zero they are all safe; if it equals
    /// the number of hidden neighbours they are all mines; anything in between tells nothing.
    pub fn evaluate(&mut self, coords: Coord2) {
        if !self.dirty.is_dirty(coords) {
            self.stats.stale_skips += 1;
            return;
        }
        self.stats.evaluations += 1;

        if let CellKnowledge::Revealed(count) = self.grid.cell_at(coords) {
            self.deduce(coords, count);
        }

        self.dirty.clear(coords);
    }

    fn deduce(&mut self, coords: Coord2, count: u8) {
        let mut flagged: u8 = 0;
        let mut hidden: SmallVec<[Coord2; 8]> = SmallVec::new();

        for neighbor in self.grid.neighbors(coords) {
            match self.grid.cell_at(neighbor) {
                CellKnowledge::Flagged => flagged += 1,
                CellKnowledge::Hidden => hidden.push(neighbor),
                CellKnowledge::Revealed(_) => {}
            }
        }

        let hidden_mines = i16::from(count) - i16::from(flagged);
        assert!(
            hidden_mines >= 0 && hidden_mines as usize <= hidden.len(),
            "inconsistent knowledge at {coords:?}: {count} adjacent mines, {flagged} flagged, {} hidden",
            hidden.len()
        );

        if hidden.is_empty() {
            return;
        }

        if hidden_mines == 0 {
            log::trace!("{coords:?} ({count}): revealing {hidden:?}");
            if let Err(Detonated { coords: mine }) = self.reveal_all_hidden_neighbors(coords) {
                panic!("{mine:?} was deduced safe from {coords:?} but holds a mine");
            }
        } else if hidden_mines as usize == hidden.len() {
            log::trace!("{coords:?} ({count}): flagging {hidden:?}");
            self.flag_all_hidden_neighbors(coords);
        }
    }

    /// Evaluates dirty cells until the worklist runs dry.
    pub fn drain(&mut self) {
        let before = self.stats;

        while let Some(coords) = self.dirty.take_next() {
            self.evaluate(coords);
        }

        if cfg!(debug_assertions) {
            self.dirty.assert_drained();
        }

        log::debug!(
            "drained: {} evaluations, {} stale, {} revealed, {} flagged, {} hidden left",
            self.stats.evaluations - before.evaluations,
            self.stats.stale_skips - before.stale_skips,
            self.stats.reveals - before.reveals,
            self.stats.flags - before.flags,
            self.grid.hidden_count(),
        );
    }

    fn check_hidden(&self, coords: Coord2) {
        assert!(
            self.grid.in_bounds(coords),
            "{coords:?} is outside of the {:?} board",
            self.grid.size()
        );
        let cell = self.grid.cell_at(coords);
        assert!(cell.is_hidden(), "{coords:?} is already resolved as {cell:?}");
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use ndarray::Array2;

    use super::*;

    /// Answers reveals from a closure, with no mine layout behind it.
    struct ScriptedOracle<F> {
        size: Coord2,
        mines: CellCount,
        answer: F,
        calls: Vec<Coord2>,
    }

    impl<F: FnMut(Coord2) -> RevealResult> ScriptedOracle<F> {
        fn new(size: Coord2, mines: CellCount, answer: F) -> Self {
            Self {
                size,
                mines,
                answer,
                calls: Vec::new(),
            }
        }
    }

    impl<F: FnMut(Coord2) -> RevealResult> Oracle for ScriptedOracle<F> {
        fn size(&self) -> Coord2 {
            self.size
        }

        fn mine_count(&self) -> CellCount {
            self.mines
        }

        fn reveal_cell(&mut self, coords: Coord2) -> RevealResult {
            self.calls.push(coords);
            (self.answer)(coords)
        }
    }

    fn engine(size: Coord2, mines: &[Coord2]) -> KnowledgeEngine<Board> {
        engine_from(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    fn engine_from(layout: MineLayout) -> KnowledgeEngine<Board> {
        KnowledgeEngine::new(Board::new(layout))
    }

    fn snapshot<O: Oracle>(engine: &KnowledgeEngine<O>) -> Array2<CellKnowledge> {
        let (w, h) = engine.size();
        Array2::from_shape_fn([w as usize, h as usize], |(x, y)| {
            engine.cell_at((x as Coord, y as Coord))
        })
    }

    #[test]
    fn empty_board_resolves_from_one_reveal() {
        let oracle = ScriptedOracle::new((5, 5), 0, |_| RevealResult::SafeCount(0));
        let mut engine = KnowledgeEngine::new(oracle);

        assert_eq!(engine.reveal((2, 3)), Ok(0));
        engine.drain();

        assert!(engine.grid().iter().all(|(_, cell)| cell == CellKnowledge::Revealed(0)));
        assert_eq!(engine.grid().flagged_count(), 0);
        assert!(engine.grid().is_fully_resolved());
        assert_eq!(engine.oracle().calls.len(), 25);
        assert_eq!(engine.stats().reveals, 25);
        assert!(engine.is_quiescent());
    }

    #[test]
    fn zero_cell_cascades_and_flags_the_lone_mine() {
        let mut engine = engine((3, 3), &[(2, 2)]);

        assert_eq!(engine.reveal((0, 0)), Ok(0));
        engine.drain();

        for (coords, cell) in engine.grid().iter() {
            if coords == (2, 2) {
                assert_eq!(cell, CellKnowledge::Flagged);
            } else {
                let expected = engine.oracle().layout().adjacent_mine_count(coords);
                assert_eq!(cell, CellKnowledge::Revealed(expected), "at {coords:?}");
            }
        }
        assert_eq!(engine.cell_at((1, 1)), CellKnowledge::Revealed(1));
        assert_eq!(engine.cell_at((2, 0)), CellKnowledge::Revealed(0));
        assert_eq!(engine.oracle().opened_count(), 8);
    }

    #[test]
    fn saturated_count_flags_every_hidden_neighbor() {
        let mut engine = engine((2, 2), &[(0, 0), (1, 0), (0, 1)]);

        assert_eq!(engine.reveal((1, 1)), Ok(3));
        engine.drain();

        assert_eq!(engine.cell_at((0, 0)), CellKnowledge::Flagged);
        assert_eq!(engine.cell_at((1, 0)), CellKnowledge::Flagged);
        assert_eq!(engine.cell_at((0, 1)), CellKnowledge::Flagged);
        assert_eq!(engine.stats().reveals, 1);
        assert_eq!(engine.oracle().opened_count(), 1);
    }

    #[test]
    fn ambiguous_count_leaves_neighbors_hidden() {
        let mut engine = engine((3, 1), &[(0, 0)]);

        assert_eq!(engine.reveal((1, 0)), Ok(1));
        engine.drain();

        assert!(engine.cell_at((0, 0)).is_hidden());
        assert!(engine.cell_at((2, 0)).is_hidden());
        assert!(engine.is_quiescent());
    }

    #[test]
    fn flags_feed_further_reveals() {
        // . 1 X 1 .
        let mut engine = engine((5, 1), &[(2, 0)]);

        assert_eq!(engine.reveal((0, 0)), Ok(0));
        engine.drain();

        assert_eq!(engine.cell_at((1, 0)), CellKnowledge::Revealed(1));
        assert_eq!(engine.cell_at((2, 0)), CellKnowledge::Flagged);
        assert!(engine.cell_at((3, 0)).is_hidden());

        assert_eq!(engine.reveal((4, 0)), Ok(0));
        engine.drain();

        assert_eq!(engine.cell_at((3, 0)), CellKnowledge::Revealed(1));
        assert!(engine.grid().is_fully_resolved());
    }

    #[test]
    fn detonation_leaves_knowledge_untouched() {
        let mut engine = engine((5, 1), &[(0, 0), (1, 0)]);

        assert_eq!(engine.reveal((4, 0)), Ok(0));
        engine.drain();
        let before = snapshot(&engine);
        assert_eq!(engine.cell_at((1, 0)), CellKnowledge::Flagged);

        assert_eq!(engine.reveal((0, 0)), Err(Detonated { coords: (0, 0) }));

        assert_eq!(snapshot(&engine), before);
        assert!(engine.cell_at((0, 0)).is_hidden());
        assert!(engine.is_quiescent());
    }

    #[test]
    fn evaluating_a_clean_cell_changes_nothing() {
        let mut engine = engine((4, 4), &[(3, 3)]);
        engine.reveal((0, 3)).unwrap();
        engine.drain();
        let before = snapshot(&engine);
        let stats = engine.stats();

        for (coords, _) in snapshot(&engine).indexed_iter() {
            engine.evaluate((coords.0 as Coord, coords.1 as Coord));
        }

        assert_eq!(snapshot(&engine), before);
        assert_eq!(engine.dirty().pending(), 0);
        assert_eq!(engine.stats().evaluations, stats.evaluations);
        assert_eq!(engine.stats().dirty_marks, stats.dirty_marks);
        assert_eq!(engine.stats().stale_skips, stats.stale_skips + 16);
    }

    #[test]
    fn repeated_marks_are_checked_once() {
        let oracle = ScriptedOracle::new((1, 1), 0, |_| RevealResult::SafeCount(0));
        let mut engine = KnowledgeEngine::new(oracle);
        engine.reveal((0, 0)).unwrap();
        engine.mark_neighborhood_dirty((0, 0));
        engine.mark_neighborhood_dirty((0, 0));

        engine.drain();

        assert_eq!(engine.stats().dirty_marks, 3);
        assert_eq!(engine.stats().evaluations, 1);
        assert_eq!(engine.stats().stale_skips, 2);
    }

    #[test]
    fn drain_orders_agree_on_the_fixed_point() {
        let config = GameConfig::new((16, 16), 30).unwrap();
        let layout = RandomLayoutGenerator::new(11).generate(config);
        let (w, h) = layout.size();
        let start = (0..w)
            .flat_map(|x| (0..h).map(move |y| (x, y)))
            .find(|&coords| !layout.contains_mine(coords))
            .unwrap();

        let mut fifo = KnowledgeEngine::with_order(Board::new(layout.clone()), DrainOrder::Fifo);
        let mut lifo = KnowledgeEngine::with_order(Board::new(layout), DrainOrder::Lifo);
        fifo.reveal(start).unwrap();
        lifo.reveal(start).unwrap();
        fifo.drain();
        lifo.drain();

        assert_eq!(snapshot(&fifo), snapshot(&lifo));
        assert_eq!(fifo.stats().reveals, lifo.stats().reveals);
        assert_eq!(fifo.stats().flags, lifo.stats().flags);
    }

    #[test]
    fn dirty_marks_stay_linear_in_transitions() {
        let config = GameConfig::new((30, 16), 40).unwrap();
        let layout = RandomLayoutGenerator::new(3).generate(config);
        let safe: Vec<_> = (0..30)
            .flat_map(|x| (0..16).map(move |y| (x, y)))
            .filter(|&coords| !layout.contains_mine(coords))
            .collect();
        let mut engine = engine_from(layout);

        for coords in safe {
            if engine.cell_at(coords).is_hidden() {
                engine.reveal(coords).unwrap();
                engine.drain();
            }
        }

        let stats = engine.stats();
        assert!(stats.dirty_marks <= 9 * u64::from(stats.reveals + stats.flags));
        assert_eq!(
            stats.evaluations + stats.stale_skips,
            stats.dirty_marks,
            "every mark is taken exactly once"
        );
        assert_eq!(engine.grid().revealed_count(), 440);
    }

    #[test]
    #[should_panic(expected = "already resolved")]
    fn revealing_twice_is_a_contract_violation() {
        let mut engine = engine((2, 2), &[]);

        engine.reveal((0, 0)).unwrap();
        engine.reveal((0, 0)).unwrap();
    }

    #[test]
    #[should_panic(expected = "outside of")]
    fn out_of_bounds_flag_is_a_contract_violation() {
        let mut engine = engine((2, 2), &[]);

        engine.flag((0, 2));
    }

    #[test]
    #[should_panic(expected = "inconsistent knowledge")]
    fn impossible_count_is_fatal() {
        let oracle = ScriptedOracle::new((2, 1), 2, |_| RevealResult::SafeCount(2));
        let mut engine = KnowledgeEngine::new(oracle);

        engine.reveal((0, 0)).unwrap();
        engine.drain();
    }

    #[test]
    #[should_panic(expected = "deduced safe")]
    fn detonating_a_deduced_cell_is_fatal() {
        let oracle = ScriptedOracle::new((2, 1), 1, |coords| match coords {
            (0, 0) => RevealResult::SafeCount(0),
            _ => RevealResult::Detonated,
        });
        let mut engine = KnowledgeEngine::new(oracle);

        engine.reveal((0, 0)).unwrap();
        engine.drain();
    }

    #[test]
    #[should_panic(expected = "flags on a board with 0 mines")]
    fn flags_never_exceed_mine_count() {
        let oracle = ScriptedOracle::new((2, 1), 0, |_| RevealResult::SafeCount(1));
        let mut engine = KnowledgeEngine::new(oracle);

        engine.reveal((0, 0)).unwrap();
        engine.drain();
    }
}

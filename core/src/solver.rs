use alloc::vec::Vec;
use core::fmt;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::*;

/// Mixed into the run seed so guesses do not replay the layout generator's stream.
const GUESS_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    #[default]
    Running,
    /// No hidden cell left.
    Solved,
    /// A guess revealed a mine.
    Lost { mine: Coord2 },
}

impl SolveStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Solved | Self::Lost { .. })
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("Running"),
            Self::Solved => f.write_str("Solved"),
            Self::Lost { mine: (x, y) } => write!(f, "Lost (mine at {x}, {y})"),
        }
    }
}

/// Progress notifications from [`Solver::solve_with`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolveEvent {
    /// A random guess was made and everything it implied has been propagated.
    Guess(Coord2),
    Finished(SolveStatus),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub size: Coord2,
    pub mines: CellCount,
    pub guesses: u32,
    pub revealed: CellCount,
    pub flagged: CellCount,
    pub hidden: CellCount,
    pub stats: EngineStats,
}

/// Drives a [`KnowledgeEngine`] to the end of a game: propagate everything that can be deduced,
/// and guess a random hidden cell when nothing can.
#[derive(Clone, Debug)]
pub struct Solver<O, R> {
    engine: KnowledgeEngine<O>,
    rng: R,
    status: SolveStatus,
    guesses: u32,
    last_guess: Option<Coord2>,
    /// Scratch list of hidden cells, refilled on every guess.
    hidden: Vec<Coord2>,
}

impl Solver<Board, SmallRng> {
    /// Reproducible session on a random board: the same seed gives the same layout and the same
    /// sequence of guesses.
    pub fn seeded(config: GameConfig, seed: u64, order: DrainOrder) -> Self {
        let layout = RandomLayoutGenerator::new(seed).generate(config);
        let engine = KnowledgeEngine::with_order(Board::new(layout), order);
        Self::new(engine, SmallRng::seed_from_u64(seed ^ GUESS_SEED_SALT))
    }
}

impl<O: Oracle, R: Rng> Solver<O, R> {
    pub fn new(engine: KnowledgeEngine<O>, rng: R) -> Self {
        Self {
            engine,
            rng,
            status: SolveStatus::Running,
            guesses: 0,
            last_guess: None,
            hidden: Vec::new(),
        }
    }

    pub fn engine(&self) -> &KnowledgeEngine<O> {
        &self.engine
    }

    pub fn into_engine(self) -> KnowledgeEngine<O> {
        self.engine
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn guesses(&self) -> u32 {
        self.guesses
    }

    pub fn last_guess(&self) -> Option<Coord2> {
        self.last_guess
    }

    /// A hidden cell chosen uniformly at random, if any is left.
    ///
    /// Scans the whole grid once per call; the buffer is kept so repeated guesses do not
    /// reallocate.
    pub fn pick_random_hidden(&mut self) -> Option<Coord2> {
        self.hidden.clear();
        self.hidden.extend(self.engine.grid().iter_hidden());
        self.hidden.choose(&mut self.rng).copied()
    }

    /// One guess followed by full propagation. Does nothing once the game is over.
    pub fn step(&mut self) -> SolveStatus {
        if self.status.is_finished() {
            return self.status;
        }

        let Some(coords) = self.pick_random_hidden() else {
            self.status = SolveStatus::Solved;
            return self.status;
        };

        self.guesses += 1;
        self.last_guess = Some(coords);

        match self.engine.reveal(coords) {
            Ok(count) => {
                log::debug!("guess #{} at {coords:?}: {count}", self.guesses);
                self.engine.drain();
                if self.engine.grid().is_fully_resolved() {
                    self.status = SolveStatus::Solved;
                }
            }
            Err(Detonated { coords: mine }) => {
                log::debug!("guess #{} at {coords:?}: mine", self.guesses);
                self.status = SolveStatus::Lost { mine };
            }
        }

        self.status
    }

    pub fn solve(&mut self) -> SolveStatus {
        self.solve_with(|_, _| {})
    }

    /// Runs to the end of the game, calling `observer` after every guess and once at the end.
    pub fn solve_with<F>(&mut self, mut observer: F) -> SolveStatus
    where
        F: FnMut(&KnowledgeEngine<O>, SolveEvent),
    {
        while !self.status.is_finished() {
            let guesses = self.guesses;
            self.step();
            if self.guesses != guesses
                && let Some(coords) = self.last_guess
            {
                observer(&self.engine, SolveEvent::Guess(coords));
            }
        }

        log::info!(
            "{:?} after {} guesses, {} revealed, {} flagged",
            self.status,
            self.guesses,
            self.engine.grid().revealed_count(),
            self.engine.grid().flagged_count()
        );
        observer(&self.engine, SolveEvent::Finished(self.status));
        self.status
    }

    pub fn report(&self) -> SolveReport {
        let grid = self.engine.grid();
        SolveReport {
            status: self.status,
            size: grid.size(),
            mines: self.engine.mine_count(),
            guesses: self.guesses,
            revealed: grid.revealed_count(),
            flagged: grid.flagged_count(),
            hidden: grid.hidden_count(),
            stats: self.engine.stats(),
        }
    }
}

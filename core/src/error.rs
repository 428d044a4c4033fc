use thiserror::Error;

use crate::Coord2;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Board must have at least one cell")]
    EmptyBoard,
}

pub type Result<T, E = GameError> = core::result::Result<T, E>;

/// A reveal hit a mine. Ends the solve attempt; this is an outcome of play, not a defect.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("Mine detonated at {coords:?}")]
pub struct Detonated {
    pub coords: Coord2,
}

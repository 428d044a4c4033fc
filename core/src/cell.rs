use serde::{Deserialize, Serialize};

/// What the solver knows about a single cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKnowledge {
    /// Nothing learned yet.
    #[default]
    Hidden,
    /// Deduced to hold a mine. Never revealed.
    Flagged,
    /// Confirmed safe, with this many mines among its neighbours.
    Revealed(u8),
}

impl CellKnowledge {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn is_resolved(self) -> bool {
        !self.is_hidden()
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Hidden => '_',
            Self::Flagged => 'X',
            Self::Revealed(0) => '.',
            Self::Revealed(count) => match char::from_digit(count as u32, 10) {
                Some(digit) => digit,
                None => '?',
            },
        }
    }
}

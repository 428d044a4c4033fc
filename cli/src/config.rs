use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sweepwise_core::{CellCount, Coord, DrainOrder, GameConfig};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Beginner,
    Intermediate,
    Expert,
    /// 60x1000 with 8000 mines
    Benchmark,
}

impl Preset {
    pub fn game_config(self) -> GameConfig {
        match self {
            Self::Beginner => GameConfig::beginner(),
            Self::Intermediate => GameConfig::intermediate(),
            Self::Expert => GameConfig::expert(),
            Self::Benchmark => GameConfig::benchmark(),
        }
    }
}

/// When to print the knowledge grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Never,
    /// After every guess, the last one showing the final board
    Guesses,
    End,
}

/// Propagation order, mirrored here so clap can parse it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Order {
    Fifo,
    Lifo,
}

impl From<Order> for DrainOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Fifo => DrainOrder::Fifo,
            Order::Lifo => DrainOrder::Lifo,
        }
    }
}

/// Run settings as they appear in a JSON config file. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub preset: Option<Preset>,
    pub width: Option<Coord>,
    pub height: Option<Coord>,
    pub mines: Option<CellCount>,
    pub seed: Option<u64>,
    pub order: Option<DrainOrder>,
    pub render: Option<RenderMode>,
}

/// Fully resolved settings for one run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub game: GameConfig,
    pub seed: Option<u64>,
    pub order: DrainOrder,
    pub render: RenderMode,
}

impl RunConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Layers `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            preset: overrides.preset.or(self.preset),
            width: overrides.width.or(self.width),
            height: overrides.height.or(self.height),
            mines: overrides.mines.or(self.mines),
            seed: overrides.seed.or(self.seed),
            order: overrides.order.or(self.order),
            render: overrides.render.or(self.render),
        }
    }

    /// Fills gaps from the preset (beginner if none) and validates the board.
    pub fn resolve(&self) -> anyhow::Result<Settings> {
        let base = self.preset.unwrap_or_default().game_config();
        let size = (
            self.width.unwrap_or(base.size.0),
            self.height.unwrap_or(base.size.1),
        );
        let mines = self.mines.unwrap_or(base.mines);
        let game = GameConfig::new(size, mines)
            .with_context(|| format!("cannot place {mines} mines on a {}x{} board", size.0, size.1))?;

        Ok(Settings {
            game,
            seed: self.seed,
            order: self.order.unwrap_or_default(),
            render: self.render.unwrap_or_default(),
        })
    }
}

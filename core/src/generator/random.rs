use ndarray::Array2;

use super::*;

/// Places mines uniformly at random, reproducibly from a seed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::prelude::*;

        let total_cells = config.total_cells();
        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());

        // optimize for full boards
        if config.mines >= total_cells {
            if config.mines > total_cells {
                log::warn!(
                    "Minefield already full, generated anyway, requested {} but only fits {}",
                    config.mines,
                    total_cells
                );
            }
            mines.fill(true);
            return MineLayout::from_mine_mask(mines);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        {
            let cells = mines.as_slice_mut().expect("layout should be standard");
            let amount = config.mines as usize;
            for index in rand::seq::index::sample(&mut rng, cells.len(), amount) {
                cells[index] = true;
            }
        }

        let layout = MineLayout::from_mine_mask(mines);
        log::debug!(
            "generated {:?} layout with {} mines from seed {}",
            config.size,
            layout.mine_count(),
            self.seed
        );
        layout
    }
}

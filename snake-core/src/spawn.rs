use crate::simulation::GridSimulation;
use rand::Rng;
use snake_types::{Cell, ItemKind, TransientItem};

const PLACEMENT_ATTEMPTS: u32 = 500;
pub(crate) const PLACEMENT_FALLBACK: Cell = Cell::new(0, 0);

impl GridSimulation {
    /// Samples random cells until one is free of obstacles, body, goal, portal
    /// and items. Gives up after a bounded number of tries and returns the
    /// fallback cell, which may be occupied.
    pub(crate) fn random_open_cell(&mut self) -> Cell {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let cell = Cell::new(
                self.rng.random_range(0..self.board_size),
                self.rng.random_range(0..self.board_size),
            );
            if self.is_open_for_placement(cell) {
                return cell;
            }
        }
        PLACEMENT_FALLBACK
    }

    pub(crate) fn is_open_for_placement(&self, cell: Cell) -> bool {
        !self.is_blocked(cell)
            && cell != self.goal
            && self.portal != Some(cell)
            && !self.items.iter().any(|item| item.cell == cell)
    }

    pub(crate) fn maybe_spawn_item(&mut self) {
        let interval = u64::from(self.config.item_spawn_interval);
        if self.steps % interval != 0 {
            return;
        }
        if self.items.len() >= self.config.max_active_items as usize {
            return;
        }
        if !self
            .rng
            .random_bool(f64::from(self.config.item_spawn_chance))
        {
            return;
        }

        let kind = ItemKind::ALL[self.rng.random_range(0..ItemKind::ALL.len())];
        let cell = self.random_open_cell();
        self.items.push(TransientItem {
            kind,
            cell,
            expires_at: self.steps + u64::from(self.config.item_lifetime),
        });
    }

    pub(crate) fn expire_items(&mut self) {
        let now = self.steps;
        self.items.retain(|item| item.expires_at > now);
    }
}

use crate::simulation::GridSimulation;
use snake_types::{Cell, ItemKind, ItemSighting, RayBlocker, RayDirection, RayReading};

impl GridSimulation {
    /// Casts the eight rays from the head, in [`RayDirection::ALL`] order.
    pub fn perceive(&self) -> [RayReading; 8] {
        RayDirection::ALL.map(|direction| self.cast_ray(direction))
    }

    pub fn cast_ray(&self, direction: RayDirection) -> RayReading {
        let (dx, dy) = direction.delta();
        let target = self.active_target();
        let mut current = self.head();
        let mut distance = 0;
        let mut target_seen = false;
        let mut item = None;

        let blocked_by = loop {
            current = current.offset(dx, dy);
            distance += 1;
            if self.is_wall(current) {
                break RayBlocker::Wall;
            }
            if self.body.contains(&current) {
                break RayBlocker::Body;
            }
            if current == target {
                target_seen = true;
            }
            if item.is_none() {
                item = self.item_at(current).map(|kind| ItemSighting { kind, distance });
            }
        };

        RayReading {
            direction,
            distance,
            target_seen,
            item,
            blocked_by,
        }
    }

    fn item_at(&self, cell: Cell) -> Option<ItemKind> {
        self.items
            .iter()
            .find(|item| item.cell == cell)
            .map(|item| item.kind)
    }
}

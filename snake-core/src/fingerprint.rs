use crate::simulation::GridSimulation;
use snake_types::{AxisOffset, Direction, StateFeatures, StateKey};

/// Discrete state code for value-table lookup. Depends only on the head, the
/// active target, walls and body; counters such as score or steps alias.
pub fn fingerprint(sim: &GridSimulation) -> StateKey {
    features(sim).key()
}

pub(crate) fn features(sim: &GridSimulation) -> StateFeatures {
    let head = sim.head();
    let target = sim.active_target();
    let blocked_at = |distance: i32| {
        Direction::ALL.map(|direction| {
            let (dx, dy) = direction.delta();
            sim.is_blocked(head.offset(dx * distance, dy * distance))
        })
    };

    StateFeatures {
        target_dx: AxisOffset::of(target.x - head.x),
        target_dy: AxisOffset::of(target.y - head.y),
        blocked_near: blocked_at(1),
        blocked_far: blocked_at(2),
        heading: sim.heading(),
    }
}

use super::*;
use crate::grid::cell_index;

/// Default world with random item spawns disabled.
pub(super) fn stable_world_config() -> WorldConfig {
    WorldConfig {
        item_spawn_chance: 0.0,
        ..WorldConfig::default()
    }
}

pub(super) fn stable_training_config() -> TrainingConfig {
    TrainingConfig {
        world: stable_world_config(),
        ..TrainingConfig::default()
    }
}

/// Training config whose agent always exploits.
pub(super) fn greedy_training_config() -> TrainingConfig {
    let mut config = stable_training_config();
    config.agent.exploration_rate = 0.0;
    config.agent.exploration_floor = 0.0;
    config
}

pub(super) fn open_sim(seed: u64) -> GridSimulation {
    GridSimulation::new(stable_world_config(), 1, seed).expect("simulation should initialize")
}

pub(super) fn cells(raw: &[(i32, i32)]) -> Vec<Cell> {
    raw.iter().copied().map(Cell::from).collect()
}

/// Rewrites body and goal and clears every other piece of episode state.
pub(super) fn configure_sim(sim: &mut GridSimulation, body: &[(i32, i32)], goal: (i32, i32)) {
    assert!(!body.is_empty(), "test body needs a head");
    sim.body = cells(body).into_iter().collect();
    sim.goal = Cell::from(goal);
    sim.portal = None;
    sim.items.clear();
    sim.score = 0;
    sim.steps = 0;
    sim.level_progress = 0;
    sim.terminal = false;
    sim.slow_turns_remaining = 0;
    for segment in &sim.body {
        let idx = cell_index(*segment, sim.board_size).expect("test body should be in bounds");
        assert!(!sim.obstacles[idx], "test body should not sit on an obstacle");
    }
}

pub(super) fn place_obstacle(sim: &mut GridSimulation, cell: (i32, i32)) {
    let idx = cell_index(Cell::from(cell), sim.board_size).expect("obstacle should be in bounds");
    sim.obstacles[idx] = true;
}

pub(super) fn place_item(sim: &mut GridSimulation, kind: ItemKind, cell: (i32, i32)) {
    sim.items.push(TransientItem {
        kind,
        cell: Cell::from(cell),
        expires_at: sim.steps + 1_000,
    });
}

/// Head at `(15, 15)` trailing `len - 1` segments straight down.
pub(super) fn vertical_body(len: i32) -> Vec<(i32, i32)> {
    (0..len).map(|offset| (15, 15 + offset)).collect()
}

pub(super) fn assert_episode_invariants(sim: &GridSimulation) {
    let mut seen = HashSet::new();
    for segment in sim.body() {
        assert!(seen.insert(*segment), "body segments should not overlap");
    }
    if !sim.is_terminal() {
        assert!(in_bounds(sim.head(), sim.board_size));
        assert!(!sim.is_wall(sim.head()), "head should not sit on a wall");
    }
}

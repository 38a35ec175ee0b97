use crate::grid::{cell_at, cell_index, in_bounds, spawn_body};
use crate::terrain::build_obstacle_map;
use crate::{validate_world, SimError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snake_config::WorldConfig;
use snake_types::{Cell, Direction, EpisodeSnapshot, ItemKind, TransientItem};
use std::collections::VecDeque;
use tracing::debug;

pub(crate) const TERMINAL_REPEAT_REWARD: f32 = -20.0;
pub(crate) const DEATH_REWARD: f32 = -100.0;
pub(crate) const PORTAL_REWARD: f32 = 250.0;
pub(crate) const STEP_REWARD: f32 = -0.05;
pub(crate) const GOAL_REWARD: f32 = 30.0;
pub(crate) const STEP_BUDGET_PER_POINT: u64 = 50;

pub(crate) const BONUS_SCORE: u32 = 15;
pub(crate) const BONUS_REWARD: f32 = 60.0;
pub(crate) const CUTTER_SCORE: u32 = 5;
pub(crate) const CUTTER_REWARD: f32 = 40.0;
pub(crate) const CUTTER_SHRINK: usize = 3;
pub(crate) const CUTTER_MIN_LENGTH: usize = 5;
pub(crate) const SLOW_SCORE: u32 = 2;
pub(crate) const SLOW_REWARD: f32 = 15.0;

/// One episode of the grid game. All mutation goes through [`GridSimulation::step`].
#[derive(Debug, Clone)]
pub struct GridSimulation {
    pub(crate) config: WorldConfig,
    pub(crate) board_size: i32,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) level: u32,
    pub(crate) body: VecDeque<Cell>,
    pub(crate) obstacles: Vec<bool>,
    pub(crate) goal: Cell,
    pub(crate) portal: Option<Cell>,
    pub(crate) items: Vec<TransientItem>,
    pub(crate) score: u32,
    pub(crate) steps: u64,
    pub(crate) level_progress: u32,
    pub(crate) terminal: bool,
    pub(crate) slow_turns_remaining: u32,
}

impl GridSimulation {
    pub fn new(config: WorldConfig, level: u32, seed: u64) -> Result<Self, SimError> {
        Self::with_rng(config, level, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(config: WorldConfig, level: u32, rng: ChaCha8Rng) -> Result<Self, SimError> {
        validate_world(&config)?;
        Ok(Self::from_validated(config, level, rng))
    }

    pub(crate) fn from_validated(config: WorldConfig, level: u32, rng: ChaCha8Rng) -> Self {
        let level = level.max(1);
        let board_size = config.board_size as i32;
        let mut sim = Self {
            obstacles: build_obstacle_map(level, config.board_size),
            config,
            board_size,
            rng,
            level,
            body: spawn_body(board_size).into_iter().collect(),
            goal: Cell::default(),
            portal: None,
            items: Vec::new(),
            score: 0,
            steps: 0,
            level_progress: 0,
            terminal: false,
            slow_turns_remaining: 0,
        };
        sim.goal = sim.random_open_cell();
        sim
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn board_size(&self) -> u32 {
        self.config.board_size
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn level_progress(&self) -> u32 {
        self.level_progress
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn slow_turns_remaining(&self) -> u32 {
        self.slow_turns_remaining
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    pub fn portal(&self) -> Option<Cell> {
        self.portal
    }

    pub fn items(&self) -> &[TransientItem] {
        &self.items
    }

    /// The portal once it is open, otherwise the goal.
    pub fn active_target(&self) -> Cell {
        self.portal.unwrap_or(self.goal)
    }

    pub fn target_distance(&self) -> u32 {
        self.head().manhattan(self.active_target())
    }

    /// Direction of travel, from the neck to the head. `None` for a one-cell body.
    pub fn heading(&self) -> Option<Direction> {
        let head = *self.body.front()?;
        let neck = *self.body.get(1)?;
        let delta = (head.x - neck.x, head.y - neck.y);
        Direction::ALL
            .into_iter()
            .find(|direction| direction.delta() == delta)
    }

    /// Outside the board or on an obstacle.
    pub fn is_wall(&self, cell: Cell) -> bool {
        match cell_index(cell, self.board_size) {
            Some(idx) => self.obstacles[idx],
            None => true,
        }
    }

    /// A wall or any body segment.
    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.is_wall(cell) || self.body.contains(&cell)
    }

    pub fn obstacle_cells(&self) -> Vec<Cell> {
        self.obstacles
            .iter()
            .enumerate()
            .filter(|(_, blocked)| **blocked)
            .map(|(idx, _)| cell_at(idx, self.board_size))
            .collect()
    }

    pub fn snapshot(&self) -> EpisodeSnapshot {
        EpisodeSnapshot {
            level: self.level,
            score: self.score,
            steps: self.steps,
            level_progress: self.level_progress,
            terminal: self.terminal,
            slow_turns_remaining: self.slow_turns_remaining,
            body: self.body.iter().copied().collect(),
            goal: self.goal,
            portal: self.portal,
            items: self.items.clone(),
            obstacles: self.obstacle_cells(),
        }
    }

    /// Advances one step and returns the unshaped reward.
    pub fn step(&mut self, direction: Direction) -> f32 {
        if self.terminal {
            return TERMINAL_REPEAT_REWARD;
        }

        self.steps += 1;
        self.slow_turns_remaining = self.slow_turns_remaining.saturating_sub(1);

        let next = self.head().step(direction);
        if self.is_blocked(next) || self.steps > self.step_budget() {
            self.terminal = true;
            return DEATH_REWARD;
        }

        if self.portal == Some(next) {
            self.advance_level();
            return PORTAL_REWARD;
        }

        self.body.push_front(next);
        let mut reward = STEP_REWARD;

        let mut shrink = 0;
        if let Some(pos) = self.items.iter().position(|item| item.cell == next) {
            let item = self.items.remove(pos);
            match item.kind {
                ItemKind::Bonus => {
                    self.score += BONUS_SCORE;
                    reward = BONUS_REWARD;
                }
                ItemKind::Cutter => {
                    self.score += CUTTER_SCORE;
                    reward = CUTTER_REWARD;
                    shrink = CUTTER_SHRINK;
                }
                ItemKind::Slow => {
                    self.score += SLOW_SCORE;
                    reward = SLOW_REWARD;
                    self.slow_turns_remaining = self.config.slow_duration;
                }
            }
        }

        let mut grew = false;
        if next == self.goal {
            self.score += 1;
            reward = GOAL_REWARD;
            self.level_progress += 1;
            grew = true;
            if self.level_progress >= self.config.level_goal_count && self.portal.is_none() {
                self.portal = Some(self.random_open_cell());
                debug!(level = self.level, portal = ?self.portal, "portal opened");
            }
            self.goal = self.random_open_cell();
        }

        if !grew {
            self.body.pop_back();
        }
        if shrink > 0 {
            let removable = self
                .body
                .len()
                .saturating_sub(CUTTER_MIN_LENGTH)
                .min(shrink);
            self.body.truncate(self.body.len() - removable);
        }

        self.maybe_spawn_item();
        self.expire_items();
        self.debug_assert_consistent_state();
        reward
    }

    fn step_budget(&self) -> u64 {
        u64::from(self.config.max_steps) + u64::from(self.score) * STEP_BUDGET_PER_POINT
    }

    fn advance_level(&mut self) {
        self.level += 1;
        self.obstacles = build_obstacle_map(self.level, self.config.board_size);
        self.body = spawn_body(self.board_size).into_iter().collect();
        self.items.clear();
        self.portal = None;
        self.steps = 0;
        self.level_progress = 0;
        self.goal = self.random_open_cell();
        debug!(level = self.level, score = self.score, "advanced level");
    }

    fn debug_assert_consistent_state(&self) {
        if cfg!(debug_assertions) {
            for (idx, segment) in self.body.iter().enumerate() {
                debug_assert!(
                    in_bounds(*segment, self.board_size),
                    "body segment must remain in bounds",
                );
                debug_assert!(
                    !self.body.iter().skip(idx + 1).any(|other| other == segment),
                    "body segments must not overlap",
                );
            }
        }
    }
}

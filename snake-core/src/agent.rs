use crate::fingerprint::fingerprint;
use crate::simulation::GridSimulation;
use crate::value_table::{best_action_index, max_value, ValueTable};
use crate::{validate_training, AgentError, SimError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use snake_config::TrainingConfig;
use snake_types::{
    AgentSnapshot, Direction, StateKey, TrainedState, TrainingStats, ACTION_COUNT,
};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::{debug, warn};

const SHAPING_REWARD: f32 = 0.8;
const RECENT_SCORE_WINDOW: usize = 100;

/// Result of a single perceive, choose, step, learn cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub state: StateKey,
    pub action: Direction,
    pub explored: bool,
    /// Simulation reward plus distance shaping.
    pub reward: f32,
    pub terminal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub decisions: u64,
    pub episodes_completed: u64,
    pub lifetime_steps: u64,
    pub exploration_rate: f32,
    pub table_size: usize,
    pub best_score: u32,
    pub best_level: u32,
    pub mean_recent_score: f64,
}

#[derive(Debug, Clone, Default)]
struct EpisodeLog {
    episodes_completed: u64,
    best_score: u32,
    best_level: u32,
    total_reward: f64,
    recent_scores: VecDeque<u32>,
}

impl EpisodeLog {
    fn record(&mut self, score: u32, level: u32) {
        self.episodes_completed += 1;
        self.best_score = self.best_score.max(score);
        self.best_level = self.best_level.max(level);
        if self.recent_scores.len() == RECENT_SCORE_WINDOW {
            self.recent_scores.pop_front();
        }
        self.recent_scores.push_back(score);
    }

    fn mean_recent_score(&self) -> f64 {
        if self.recent_scores.is_empty() {
            return 0.0;
        }
        let total: u64 = self.recent_scores.iter().map(|s| u64::from(*s)).sum();
        total as f64 / self.recent_scores.len() as f64
    }
}

/// Tabular Q-learner that owns its value table and the live episode.
#[derive(Debug, Clone)]
pub struct TabularAgent {
    pub(crate) config: TrainingConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) sim: GridSimulation,
    pub(crate) table: ValueTable,
    pub(crate) exploration_rate: f32,
    pub(crate) lifetime_steps: u64,
    pub(crate) episode_reward: f32,
    log: EpisodeLog,
}

impl TabularAgent {
    pub fn new(config: TrainingConfig, seed: u64) -> Result<Self, SimError> {
        validate_training(&config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sim = GridSimulation::from_validated(
            config.world.clone(),
            config.world.starting_level,
            ChaCha8Rng::seed_from_u64(rng.random()),
        );
        Ok(Self {
            exploration_rate: config.agent.exploration_rate,
            config,
            rng,
            sim,
            table: ValueTable::new(),
            lifetime_steps: 0,
            episode_reward: 0.0,
            log: EpisodeLog::default(),
        })
    }

    /// Builds an agent and restores `payload` into it. A payload that does not
    /// parse or validate is logged and the agent keeps its initial values.
    pub fn restore_or_default(
        config: TrainingConfig,
        seed: u64,
        payload: &str,
    ) -> Result<Self, SimError> {
        let mut agent = Self::new(config, seed)?;
        if let Err(err) = agent.import_trained_state_json(payload) {
            warn!("failed to restore trained state, starting from defaults: {err}");
        }
        Ok(agent)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn simulation(&self) -> &GridSimulation {
        &self.sim
    }

    pub fn value_table(&self) -> &ValueTable {
        &self.table
    }

    pub fn exploration_rate(&self) -> f32 {
        self.exploration_rate
    }

    pub fn lifetime_steps(&self) -> u64 {
        self.lifetime_steps
    }

    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    pub fn stats(&self) -> TrainingStats {
        TrainingStats {
            episodes_completed: self.log.episodes_completed,
            best_score: self.log.best_score,
            best_level: self.log.best_level,
            total_reward: self.log.total_reward,
            recent_scores: self.log.recent_scores.iter().copied().collect(),
        }
    }

    /// Epsilon-greedy choice. Returns the action and whether it was random.
    pub fn select_action(&mut self, state: StateKey) -> (Direction, bool) {
        if self.rng.random::<f32>() < self.exploration_rate {
            let idx = self.rng.random_range(0..ACTION_COUNT);
            return (Direction::ALL[idx], true);
        }
        let values = self.table.entry(state);
        (Direction::ALL[best_action_index(values)], false)
    }

    pub fn advance(&mut self) -> Decision {
        let state = fingerprint(&self.sim);
        let distance_before = self.sim.target_distance();

        let (action, explored) = self.select_action(state);
        let mut reward = self.sim.step(action);
        let terminal = self.sim.is_terminal();

        if !terminal {
            match self.sim.target_distance().cmp(&distance_before) {
                Ordering::Less => reward += SHAPING_REWARD,
                Ordering::Greater => reward -= SHAPING_REWARD,
                Ordering::Equal => {}
            }
        }

        let next_state = fingerprint(&self.sim);
        let next_best = max_value(self.table.entry(next_state));
        let bootstrap = if terminal { 0.0 } else { next_best };
        self.table.update(
            state,
            action.index(),
            reward,
            bootstrap,
            self.config.agent.learning_rate,
            self.config.agent.discount_factor,
        );

        self.decay_exploration();
        self.lifetime_steps += 1;
        self.episode_reward += reward;
        self.log.total_reward += f64::from(reward);

        Decision {
            state,
            action,
            explored,
            reward,
            terminal,
        }
    }

    fn decay_exploration(&mut self) {
        let floor = self.config.agent.exploration_floor;
        if self.exploration_rate > floor {
            self.exploration_rate =
                (self.exploration_rate * self.config.agent.exploration_decay).max(floor);
        }
    }

    /// Replaces the episode with a fresh one at `level`. A finished episode is
    /// counted in the statistics first.
    pub fn reset_episode(&mut self, level: u32) {
        if self.sim.is_terminal() {
            self.log.record(self.sim.score(), self.sim.level());
            debug!(
                score = self.sim.score(),
                level = self.sim.level(),
                reward = self.episode_reward,
                episodes = self.log.episodes_completed,
                "episode finished"
            );
        }
        self.sim = GridSimulation::from_validated(
            self.config.world.clone(),
            level,
            ChaCha8Rng::seed_from_u64(self.rng.random()),
        );
        self.episode_reward = 0.0;
    }

    /// Starts over at the level the current episode reached.
    pub fn restart_episode(&mut self) {
        self.reset_episode(self.sim.level());
    }

    /// Runs `count` decisions, restarting whenever an episode ends.
    pub fn run_decisions(&mut self, count: u64) -> TrainingReport {
        for _ in 0..count {
            if self.advance().terminal {
                self.restart_episode();
            }
        }
        self.report(count)
    }

    pub fn report(&self, decisions: u64) -> TrainingReport {
        TrainingReport {
            decisions,
            episodes_completed: self.log.episodes_completed,
            lifetime_steps: self.lifetime_steps,
            exploration_rate: self.exploration_rate,
            table_size: self.table.len(),
            best_score: self.log.best_score,
            best_level: self.log.best_level,
            mean_recent_score: self.log.mean_recent_score(),
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let state_key = fingerprint(&self.sim);
        AgentSnapshot {
            episode: self.sim.snapshot(),
            rays: self.sim.perceive().to_vec(),
            state_key,
            action_values: self.table.values(state_key),
            exploration_rate: self.exploration_rate,
            lifetime_steps: self.lifetime_steps,
            table_size: self.table.len(),
            episode_reward: self.episode_reward,
            stats: self.stats(),
        }
    }

    pub fn export_trained_state(&self) -> TrainedState {
        TrainedState {
            q_table: self.table.to_entries(),
            exploration_rate: self.exploration_rate,
            lifetime_steps: self.lifetime_steps,
        }
    }

    /// Replaces the value table, exploration rate and step count. On error the
    /// live state is left as it was.
    pub fn import_trained_state(&mut self, state: TrainedState) -> Result<(), AgentError> {
        validate_trained_state(&state)?;
        self.table = ValueTable::from_entries(state.q_table);
        self.exploration_rate = state.exploration_rate;
        self.lifetime_steps = state.lifetime_steps;
        Ok(())
    }

    pub fn import_trained_state_json(&mut self, payload: &str) -> Result<(), AgentError> {
        let state: TrainedState = serde_json::from_str(payload)?;
        self.import_trained_state(state)
    }
}

fn validate_trained_state(state: &TrainedState) -> Result<(), AgentError> {
    if !state.exploration_rate.is_finite() || !(0.0..=1.0).contains(&state.exploration_rate) {
        return Err(AgentError::InvalidTrainedState(format!(
            "exploration_rate {} is outside [0, 1]",
            state.exploration_rate
        )));
    }
    if let Some((key, _)) = state
        .q_table
        .iter()
        .find(|(_, values)| values.iter().any(|v| !v.is_finite()))
    {
        return Err(AgentError::InvalidTrainedState(format!(
            "non-finite action value for state {key}"
        )));
    }
    Ok(())
}

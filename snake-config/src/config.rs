use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TRAINING_CONFIG_REL_PATH: &str = "default.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrainingConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldConfig {
    #[serde(default = "default_board_size")]
    pub board_size: u32,
    #[serde(default = "default_starting_level")]
    pub starting_level: u32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_level_goal_count")]
    pub level_goal_count: u32,
    #[serde(default = "default_item_spawn_interval")]
    pub item_spawn_interval: u32,
    #[serde(default = "default_item_spawn_chance")]
    pub item_spawn_chance: f32,
    #[serde(default = "default_item_lifetime")]
    pub item_lifetime: u32,
    #[serde(default = "default_max_active_items")]
    pub max_active_items: u32,
    #[serde(default = "default_slow_duration")]
    pub slow_duration: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            board_size: default_board_size(),
            starting_level: default_starting_level(),
            max_steps: default_max_steps(),
            level_goal_count: default_level_goal_count(),
            item_spawn_interval: default_item_spawn_interval(),
            item_spawn_chance: default_item_spawn_chance(),
            item_lifetime: default_item_lifetime(),
            max_active_items: default_max_active_items(),
            slow_duration: default_slow_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f32,
    #[serde(default = "default_exploration_rate")]
    pub exploration_rate: f32,
    #[serde(default = "default_exploration_floor")]
    pub exploration_floor: f32,
    #[serde(default = "default_exploration_decay")]
    pub exploration_decay: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            exploration_rate: default_exploration_rate(),
            exploration_floor: default_exploration_floor(),
            exploration_decay: default_exploration_decay(),
        }
    }
}

pub fn training_config_from_toml_str(raw: &str) -> Result<TrainingConfig, toml::de::Error> {
    toml::from_str(raw)
}

pub fn default_training_config() -> TrainingConfig {
    training_config_from_toml_str(include_str!("../default.toml"))
        .expect("default training config TOML must deserialize")
}

pub fn default_training_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_TRAINING_CONFIG_REL_PATH)
}

pub fn load_default_training_config() -> Result<TrainingConfig> {
    load_training_config_from_path(&default_training_config_path())
}

pub fn load_training_config_from_path(path: &Path) -> Result<TrainingConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read training config from {}", path.display()))?;
    training_config_from_toml_str(&raw)
        .context("training config TOML failed schema deserialization")
        .with_context(|| format!("failed to parse training config from {}", path.display()))
}

pub fn validate_training_config(config: &TrainingConfig) -> Result<(), String> {
    validate_world_config(&config.world)?;
    validate_agent_config(&config.agent)
}

pub fn validate_world_config(config: &WorldConfig) -> Result<(), String> {
    if config.board_size < 10 {
        return Err("board_size must be at least 10".to_owned());
    }
    if config.board_size > 1024 {
        return Err("board_size must be at most 1024".to_owned());
    }
    if config.starting_level == 0 {
        return Err("starting_level must be >= 1".to_owned());
    }
    if config.max_steps == 0 {
        return Err("max_steps must be greater than zero".to_owned());
    }
    if config.level_goal_count == 0 {
        return Err("level_goal_count must be greater than zero".to_owned());
    }
    if config.item_spawn_interval == 0 {
        return Err("item_spawn_interval must be greater than zero".to_owned());
    }
    if !(0.0..=1.0).contains(&config.item_spawn_chance) {
        return Err("item_spawn_chance must be in [0.0, 1.0]".to_owned());
    }
    Ok(())
}

pub fn validate_agent_config(config: &AgentConfig) -> Result<(), String> {
    if !config.learning_rate.is_finite()
        || config.learning_rate <= 0.0
        || config.learning_rate > 1.0
    {
        return Err("learning_rate must be in (0.0, 1.0]".to_owned());
    }
    if !(0.0..=1.0).contains(&config.discount_factor) {
        return Err("discount_factor must be in [0.0, 1.0]".to_owned());
    }
    if !(0.0..=1.0).contains(&config.exploration_rate) {
        return Err("exploration_rate must be in [0.0, 1.0]".to_owned());
    }
    if !(0.0..=1.0).contains(&config.exploration_floor) {
        return Err("exploration_floor must be in [0.0, 1.0]".to_owned());
    }
    if config.exploration_floor > config.exploration_rate {
        return Err("exploration_floor must not exceed exploration_rate".to_owned());
    }
    if !config.exploration_decay.is_finite()
        || config.exploration_decay <= 0.0
        || config.exploration_decay > 1.0
    {
        return Err("exploration_decay must be in (0.0, 1.0]".to_owned());
    }
    Ok(())
}

fn default_board_size() -> u32 {
    30
}

fn default_starting_level() -> u32 {
    1
}

fn default_max_steps() -> u32 {
    500
}

fn default_level_goal_count() -> u32 {
    10
}

fn default_item_spawn_interval() -> u32 {
    75
}

fn default_item_spawn_chance() -> f32 {
    0.3
}

fn default_item_lifetime() -> u32 {
    150
}

fn default_max_active_items() -> u32 {
    3
}

fn default_slow_duration() -> u32 {
    20
}

fn default_learning_rate() -> f32 {
    0.1
}

fn default_discount_factor() -> f32 {
    0.9
}

fn default_exploration_rate() -> f32 {
    1.0
}

fn default_exploration_floor() -> f32 {
    0.01
}

fn default_exploration_decay() -> f32 {
    0.99995
}

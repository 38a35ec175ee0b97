use snake_config::{validate_training_config, validate_world_config, TrainingConfig, WorldConfig};
use thiserror::Error;

mod agent;
mod fingerprint;
mod grid;
mod sensing;
mod simulation;
mod spawn;
mod terrain;
mod value_table;
mod workers;

#[cfg(test)]
mod tests;

pub use agent::{Decision, TabularAgent, TrainingReport};
pub use fingerprint::fingerprint;
pub use simulation::GridSimulation;
pub use terrain::build_obstacle_map;
pub use value_table::{best_action_index, ValueTable};
pub use workers::{train_workers, WorkerReport};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid training config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid trained state: {0}")]
    InvalidTrainedState(String),
    #[error("malformed trained state payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] SimError),
}

fn validate_world(config: &WorldConfig) -> Result<(), SimError> {
    validate_world_config(config).map_err(SimError::InvalidConfig)
}

fn validate_training(config: &TrainingConfig) -> Result<(), SimError> {
    validate_training_config(config).map_err(SimError::InvalidConfig)
}

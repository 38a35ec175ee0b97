use crate::agent::{TabularAgent, TrainingReport};
use crate::{validate_training, SimError};
use rayon::prelude::*;
use snake_config::TrainingConfig;
use snake_types::TrainedState;

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub seed: u64,
    pub report: TrainingReport,
    pub trained_state: TrainedState,
}

/// Trains one independent agent per seed on the rayon pool. Workers share no
/// state; results come back in `seeds` order and are not merged.
pub fn train_workers(
    config: &TrainingConfig,
    seeds: &[u64],
    decisions: u64,
) -> Result<Vec<WorkerReport>, SimError> {
    validate_training(config)?;
    seeds
        .par_iter()
        .map(|&seed| {
            let mut agent = TabularAgent::new(config.clone(), seed)?;
            let report = agent.run_decisions(decisions);
            Ok(WorkerReport {
                seed,
                report,
                trained_state: agent.export_trained_state(),
            })
        })
        .collect()
}

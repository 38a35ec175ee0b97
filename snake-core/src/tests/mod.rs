pub(super) use super::*;
pub(super) use crate::grid::{in_bounds, spawn_body};
pub(super) use crate::simulation::GridSimulation;
pub(super) use snake_config::{TrainingConfig, WorldConfig};
pub(super) use snake_types::{
    Cell, Direction, ItemKind, RayBlocker, RayDirection, StateKey, TrainedState, TransientItem,
};
pub(super) use std::collections::HashSet;

mod agent_and_learning;
mod sensing;
mod support;

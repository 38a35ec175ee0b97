use snake_types::{ActionValues, StateKey, ACTION_COUNT};
use std::collections::{BTreeMap, HashMap};

/// Action-value estimates keyed by fingerprint. Entries appear on first visit
/// as all zeros and are never removed except by replacing the whole table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    entries: HashMap<StateKey, ActionValues>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored values, or zeros for an unvisited state. Does not insert.
    pub fn values(&self, key: StateKey) -> ActionValues {
        self.entries
            .get(&key)
            .copied()
            .unwrap_or([0.0; ACTION_COUNT])
    }

    pub fn entry(&mut self, key: StateKey) -> &mut ActionValues {
        self.entries.entry(key).or_insert([0.0; ACTION_COUNT])
    }

    /// One-step temporal-difference update of `Q[key][action]` toward
    /// `reward + discount * bootstrap`.
    pub fn update(
        &mut self,
        key: StateKey,
        action: usize,
        reward: f32,
        bootstrap: f32,
        learning_rate: f32,
        discount: f32,
    ) {
        let values = self.entry(key);
        let target = reward + discount * bootstrap;
        values[action] += learning_rate * (target - values[action]);
    }

    pub fn to_entries(&self) -> BTreeMap<StateKey, ActionValues> {
        self.entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn from_entries(entries: BTreeMap<StateKey, ActionValues>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

/// Index of the largest value; the lowest index wins ties.
pub fn best_action_index(values: &ActionValues) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}

pub(crate) fn max_value(values: &ActionValues) -> f32 {
    values[best_action_index(values)]
}

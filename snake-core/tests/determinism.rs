use snake_config::default_training_config;
use snake_core::TabularAgent;

fn train(seed: u64, decisions: u64) -> String {
    let mut agent = TabularAgent::new(default_training_config(), seed).expect("agent init");
    agent.run_decisions(decisions);
    serde_json::to_string(&agent.export_trained_state()).expect("serialize trained state")
}

#[test]
fn same_seed_trains_identical_tables() {
    assert_eq!(train(42, 5_000), train(42, 5_000));
}

#[test]
fn different_seeds_diverge() {
    assert_ne!(train(42, 5_000), train(43, 5_000));
}

#[test]
fn snapshot_serializes_for_clients() {
    let mut agent = TabularAgent::new(default_training_config(), 7).expect("agent init");
    agent.run_decisions(200);

    let value = serde_json::to_value(agent.snapshot()).expect("serialize snapshot");

    assert_eq!(value["rays"].as_array().map(Vec::len), Some(8));
    assert!(value["state_key"].is_string());
    assert_eq!(value["lifetime_steps"], 200);
}

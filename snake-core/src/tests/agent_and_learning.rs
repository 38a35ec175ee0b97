use super::support::*;
use super::*;
use snake_config::AgentConfig;

fn key(raw: &str) -> StateKey {
    raw.parse().expect("test key should parse")
}

#[test]
fn fingerprint_summarizes_target_and_blockers() {
    let mut sim = open_sim(1);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (10, 10));

    assert_eq!(fingerprint(&sim), key("LU-0100-0100-U"));
}

#[test]
fn fingerprint_flags_board_edges() {
    let mut sim = open_sim(2);
    configure_sim(&mut sim, &[(0, 0), (0, 1), (0, 2)], (5, 5));

    assert_eq!(fingerprint(&sim), key("RD-1110-1110-U"));
}

#[test]
fn single_segment_body_has_no_heading() {
    let mut sim = open_sim(3);
    configure_sim(&mut sim, &[(4, 4)], (4, 9));

    assert_eq!(fingerprint(&sim), key("CD-0000-0000-N"));
}

#[test]
fn fingerprint_tracks_the_portal_once_open() {
    let mut sim = open_sim(4);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (10, 10));
    sim.portal = Some(Cell::new(20, 20));

    assert_eq!(fingerprint(&sim), key("RD-0100-0100-U"));
}

#[test]
fn fingerprint_ignores_counters_and_items() {
    let mut sim = open_sim(5);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (10, 10));
    let before = fingerprint(&sim);

    sim.score = 99;
    sim.steps = 321;
    sim.level_progress = 7;
    sim.slow_turns_remaining = 4;
    place_item(&mut sim, ItemKind::Bonus, (15, 14));

    assert_eq!(fingerprint(&sim), before);
    assert_eq!(fingerprint(&sim), fingerprint(&sim));
}

#[test]
fn best_action_prefers_lowest_index_on_ties() {
    assert_eq!(best_action_index(&[0.0; 4]), 0);
    assert_eq!(best_action_index(&[1.0, 1.0, 0.0, 0.0]), 0);
    assert_eq!(best_action_index(&[0.0, 2.0, 2.0, 1.0]), 1);
    assert_eq!(best_action_index(&[-3.0, -1.0, -2.0, -1.0]), 1);
    assert_eq!(best_action_index(&[0.0, 0.0, 0.0, 0.5]), 3);
}

#[test]
fn greedy_step_applies_shaped_td_update() {
    let mut agent = TabularAgent::new(greedy_training_config(), 11).expect("agent init");
    configure_sim(&mut agent.sim, &[(15, 15), (15, 16), (15, 17)], (15, 2));
    let state = fingerprint(&agent.sim);

    let decision = agent.advance();

    assert_eq!(decision.state, state);
    assert_eq!(decision.action, Direction::Up);
    assert!(!decision.explored);
    assert!(!decision.terminal);
    assert!((decision.reward - 0.75).abs() < 1e-6);
    let values = agent.value_table().values(state);
    assert!((values[Direction::Up.index()] - 0.075).abs() < 1e-6);
    assert_eq!(values[1..], [0.0_f32; 3]);
    assert_eq!(agent.lifetime_steps(), 1);
    assert!((agent.episode_reward() - 0.75).abs() < 1e-6);
}

#[test]
fn moving_away_from_target_is_penalized() {
    let mut agent = TabularAgent::new(greedy_training_config(), 12).expect("agent init");
    configure_sim(&mut agent.sim, &[(15, 15), (15, 16), (15, 17)], (15, 25));

    let decision = agent.advance();

    assert_eq!(decision.action, Direction::Up);
    assert!((decision.reward - (-0.85)).abs() < 1e-6);
}

#[test]
fn terminal_decision_uses_zero_bootstrap() {
    let mut agent = TabularAgent::new(greedy_training_config(), 13).expect("agent init");
    configure_sim(&mut agent.sim, &[(15, 0), (15, 1), (15, 2)], (2, 20));
    let state = fingerprint(&agent.sim);

    let decision = agent.advance();

    assert!(decision.terminal);
    assert_eq!(decision.reward, -100.0);
    let values = agent.value_table().values(state);
    assert!((values[Direction::Up.index()] - (-10.0)).abs() < 1e-5);
}

#[test]
fn decision_on_finished_episode_leaves_it_untouched() {
    let mut agent = TabularAgent::new(stable_training_config(), 14).expect("agent init");
    configure_sim(&mut agent.sim, &[(15, 15), (15, 16), (15, 17)], (2, 2));
    agent.sim.terminal = true;
    let frozen = agent.simulation().snapshot();

    let decision = agent.advance();

    assert_eq!(decision.reward, -20.0);
    assert!(decision.terminal);
    assert_eq!(agent.simulation().snapshot(), frozen);
}

#[test]
fn exploration_decays_monotonically_to_floor() {
    let mut agent = TabularAgent::new(stable_training_config(), 15).expect("agent init");
    let mut previous = agent.exploration_rate();
    for _ in 0..500 {
        if agent.advance().terminal {
            agent.restart_episode();
        }
        let rate = agent.exploration_rate();
        assert!(rate <= previous);
        assert!(rate >= agent.config().agent.exploration_floor);
        previous = rate;
    }
    assert!(previous < 1.0);

    let mut config = stable_training_config();
    config.agent = AgentConfig {
        exploration_decay: 0.5,
        exploration_floor: 0.1,
        ..AgentConfig::default()
    };
    let mut agent = TabularAgent::new(config, 15).expect("agent init");
    agent.run_decisions(20);
    assert_eq!(agent.exploration_rate(), 0.1);
}

#[test]
fn value_table_only_grows() {
    let mut agent = TabularAgent::new(stable_training_config(), 16).expect("agent init");
    let mut previous = agent.value_table().len();
    for _ in 0..1_000 {
        if agent.advance().terminal {
            agent.restart_episode();
        }
        let size = agent.value_table().len();
        assert!(size >= previous);
        previous = size;
    }
    assert!(previous > 1);
}

#[test]
fn reset_episode_records_finished_run_and_jumps_level() {
    let mut agent = TabularAgent::new(greedy_training_config(), 17).expect("agent init");
    configure_sim(&mut agent.sim, &[(15, 0), (15, 1), (15, 2)], (2, 20));
    agent.sim.score = 4;
    agent.advance();
    assert!(agent.simulation().is_terminal());

    agent.reset_episode(3);

    let stats = agent.stats();
    assert_eq!(stats.episodes_completed, 1);
    assert_eq!(stats.best_score, 4);
    assert_eq!(stats.recent_scores, vec![4]);
    assert_eq!(agent.simulation().level(), 3);
    assert_eq!(agent.simulation().score(), 0);
    assert!(!agent.simulation().is_terminal());
    assert_eq!(agent.episode_reward(), 0.0);
    assert_eq!(agent.simulation().obstacles, build_obstacle_map(3, 30));
}

#[test]
fn reset_of_live_episode_is_not_counted() {
    let mut agent = TabularAgent::new(stable_training_config(), 18).expect("agent init");
    agent.reset_episode(0);

    assert_eq!(agent.stats().episodes_completed, 0);
    assert_eq!(agent.simulation().level(), 1);
}

#[test]
fn run_decisions_reports_progress() {
    let mut agent = TabularAgent::new(stable_training_config(), 19).expect("agent init");

    let report = agent.run_decisions(3_000);

    assert_eq!(report.decisions, 3_000);
    assert_eq!(report.lifetime_steps, 3_000);
    assert!(report.episodes_completed > 0);
    assert_eq!(report.table_size, agent.value_table().len());
    assert_eq!(report.exploration_rate, agent.exploration_rate());

    let stats = agent.stats();
    assert_eq!(stats.episodes_completed, report.episodes_completed);
    assert!(stats.recent_scores.len() <= 100);
    assert!(stats.recent_scores.len() as u64 <= stats.episodes_completed);
    assert!(stats.recent_scores.iter().all(|score| *score <= stats.best_score));
    let mean = stats.recent_scores.iter().map(|s| f64::from(*s)).sum::<f64>()
        / stats.recent_scores.len().max(1) as f64;
    assert!((report.mean_recent_score - mean).abs() < 1e-9);
}

#[test]
fn snapshot_does_not_grow_the_table() {
    let agent = TabularAgent::new(stable_training_config(), 20).expect("agent init");

    let snapshot = agent.snapshot();

    assert!(agent.value_table().is_empty());
    assert_eq!(snapshot.action_values, [0.0; 4]);
    assert_eq!(snapshot.table_size, 0);
    assert_eq!(snapshot.rays.len(), 8);
    assert_eq!(snapshot.state_key, fingerprint(agent.simulation()));
    assert_eq!(snapshot.episode, agent.simulation().snapshot());
}

#[test]
fn invalid_agent_config_is_rejected() {
    let mut config = stable_training_config();
    config.agent.learning_rate = 0.0;

    let err = TabularAgent::new(config, 1).expect_err("config should be rejected");
    assert!(matches!(err, SimError::InvalidConfig(_)));
}

#[test]
fn workers_return_in_seed_order_and_are_reproducible() {
    let config = stable_training_config();
    let seeds = [3, 1, 2];

    let first = train_workers(&config, &seeds, 400).expect("workers should train");
    let second = train_workers(&config, &seeds, 400).expect("workers should train");

    assert_eq!(
        first.iter().map(|worker| worker.seed).collect::<Vec<_>>(),
        seeds.to_vec()
    );
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.trained_state, b.trained_state);
        assert_eq!(a.report, b.report);
    }

    let mut solo = TabularAgent::new(config, 1).expect("agent init");
    solo.run_decisions(400);
    assert_eq!(first[1].trained_state, solo.export_trained_state());
}

#[test]
fn workers_reject_invalid_config() {
    let mut config = stable_training_config();
    config.world.item_spawn_chance = 2.0;

    assert!(train_workers(&config, &[1], 10).is_err());
}

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use snake_config::{default_training_config, load_training_config_from_path, TrainingConfig};
use snake_core::{best_action_index, train_workers, TabularAgent, TrainingReport};
use snake_types::{Direction, StateKey, TrainedState, ACTION_COUNT};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

const DEFAULT_LOG_FILTER: &str = "snake_cli=info,snake_core=info";

#[derive(Parser, Debug)]
#[command(name = "snake-cli")]
#[command(about = "Tabular Q-learning snake trainer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train an agent, optionally resuming from and saving to a trained-state file.
    Train {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 100_000)]
        decisions: u64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        load: Option<PathBuf>,
        #[arg(long)]
        save: Option<PathBuf>,
        /// Write the trained state every N decisions; 0 saves only at the end.
        #[arg(long, default_value_t = 0)]
        save_every: u64,
        /// Independent agents trained in parallel on seeds `seed..seed + workers`.
        #[arg(long, default_value_t = 1)]
        workers: u32,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Run one greedy episode from a trained state.
    Play {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        load: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 100_000)]
        max_decisions: u64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Benchmark {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 200_000)]
        decisions: u64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Summarize a trained-state file.
    Inspect {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Debug, Serialize)]
struct WorkerSummary {
    seed: u64,
    report: TrainingReport,
}

#[derive(Debug, Serialize)]
struct PlaySummary {
    decisions: u64,
    level: u32,
    score: u32,
    episode_reward: f32,
    terminal: bool,
}

#[derive(Debug, Serialize)]
struct BenchmarkSummary {
    decisions: u64,
    elapsed_ms: u128,
    decisions_per_second: f64,
    report: TrainingReport,
}

#[derive(Debug, Serialize)]
struct InspectSummary {
    states: usize,
    visited_states: usize,
    exploration_rate: f32,
    lifetime_steps: u64,
    greedy_action_counts: [usize; ACTION_COUNT],
    top_states: Vec<StateValue>,
}

#[derive(Debug, Serialize)]
struct StateValue {
    state: StateKey,
    best_action: Direction,
    value: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            config,
            decisions,
            seed,
            load,
            save,
            save_every,
            workers,
            format,
        } => {
            if workers > 1 {
                ensure!(load.is_none(), "--load cannot be combined with --workers");
                parallel_train_command(config, decisions, seed, workers, save, format)
            } else {
                train_command(config, decisions, seed, load, save, save_every, format)
            }
        }
        Commands::Play {
            config,
            load,
            seed,
            max_decisions,
            format,
            out,
        } => play_command(config, load, seed, max_decisions, format, out),
        Commands::Benchmark {
            config,
            decisions,
            seed,
        } => benchmark_command(config, decisions, seed),
        Commands::Inspect { input, top, format } => inspect_command(input, top, format),
    }
}

fn train_command(
    config_path: Option<PathBuf>,
    decisions: u64,
    seed: u64,
    load: Option<PathBuf>,
    save: Option<PathBuf>,
    save_every: u64,
    format: OutputFormat,
) -> Result<()> {
    let cfg = load_config(config_path)?;
    let mut agent = build_training_agent(cfg, seed, load.as_deref())?;

    let chunk = if save_every == 0 { decisions } else { save_every };
    let mut remaining = decisions;
    while remaining > 0 {
        let batch = remaining.min(chunk);
        let report = agent.run_decisions(batch);
        remaining -= batch;
        info!(
            lifetime_steps = report.lifetime_steps,
            episodes = report.episodes_completed,
            best_score = report.best_score,
            mean_recent_score = report.mean_recent_score,
            exploration_rate = report.exploration_rate,
            states = report.table_size,
            "training progress"
        );
        if let Some(path) = save.as_deref() {
            write_trained_state(path, &agent.export_trained_state())?;
        }
    }

    let report = agent.report(decisions);
    match format {
        OutputFormat::Pretty => println!(
            "decisions={} episodes={} best_score={} best_level={} mean_recent_score={:.2} epsilon={:.4} states={}",
            report.decisions,
            report.episodes_completed,
            report.best_score,
            report.best_level,
            report.mean_recent_score,
            report.exploration_rate,
            report.table_size
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// A saved state that cannot be parsed or validated is logged and training
/// starts fresh. A file that cannot be read at all is still an error.
fn build_training_agent(
    cfg: TrainingConfig,
    seed: u64,
    load: Option<&Path>,
) -> Result<TabularAgent> {
    let Some(path) = load else {
        return Ok(TabularAgent::new(cfg, seed)?);
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read trained state {}", path.display()))?;
    let agent = TabularAgent::restore_or_default(cfg, seed, &raw)?;
    info!(
        path = %path.display(),
        states = agent.value_table().len(),
        exploration_rate = agent.exploration_rate(),
        "resumed trained state"
    );
    Ok(agent)
}

fn parallel_train_command(
    config_path: Option<PathBuf>,
    decisions: u64,
    seed: u64,
    workers: u32,
    save: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let cfg = load_config(config_path)?;
    let seeds: Vec<u64> = (0..u64::from(workers)).map(|offset| seed + offset).collect();
    info!(workers, decisions, "training independent workers");
    let results = train_workers(&cfg, &seeds, decisions)?;

    if let Some(path) = save.as_deref() {
        for worker in &results {
            let worker_path = worker_save_path(path, worker.seed);
            write_trained_state(&worker_path, &worker.trained_state)?;
        }
    }

    let summaries: Vec<WorkerSummary> = results
        .into_iter()
        .map(|worker| WorkerSummary {
            seed: worker.seed,
            report: worker.report,
        })
        .collect();
    match format {
        OutputFormat::Pretty => {
            for summary in &summaries {
                println!(
                    "seed={} episodes={} best_score={} best_level={} mean_recent_score={:.2} states={}",
                    summary.seed,
                    summary.report.episodes_completed,
                    summary.report.best_score,
                    summary.report.best_level,
                    summary.report.mean_recent_score,
                    summary.report.table_size
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
    }
    Ok(())
}

fn play_command(
    config_path: Option<PathBuf>,
    load: PathBuf,
    seed: u64,
    max_decisions: u64,
    format: OutputFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut cfg = load_config(config_path)?;
    cfg.agent.exploration_rate = 0.0;
    cfg.agent.exploration_floor = 0.0;

    let mut state = read_trained_state(&load)?;
    state.exploration_rate = 0.0;
    let mut agent = TabularAgent::new(cfg, seed)?;
    agent.import_trained_state(state)?;

    let mut lines = Vec::new();
    let mut decisions = 0;
    while decisions < max_decisions && !agent.simulation().is_terminal() {
        let decision = agent.advance();
        decisions += 1;
        if matches!(format, OutputFormat::Pretty) {
            let sim = agent.simulation();
            lines.push(format!(
                "step={} state={} action={:?} reward={:.2} level={} score={}",
                decisions,
                decision.state,
                decision.action,
                decision.reward,
                sim.level(),
                sim.score()
            ));
        }
    }

    let sim = agent.simulation();
    let summary = PlaySummary {
        decisions,
        level: sim.level(),
        score: sim.score(),
        episode_reward: agent.episode_reward(),
        terminal: sim.is_terminal(),
    };
    let text = match format {
        OutputFormat::Pretty => {
            lines.push(format!(
                "decisions={} level={} score={} episode_reward={:.2} terminal={}",
                summary.decisions,
                summary.level,
                summary.score,
                summary.episode_reward,
                summary.terminal
            ));
            lines.join("\n")
        }
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "summary": summary,
            "snapshot": agent.snapshot(),
        }))?,
    };
    write_output(text, out)
}

fn benchmark_command(config_path: Option<PathBuf>, decisions: u64, seed: u64) -> Result<()> {
    let cfg = load_config(config_path)?;
    let mut agent = TabularAgent::new(cfg, seed)?;
    let decisions = decisions.max(1);

    let start = Instant::now();
    let report = agent.run_decisions(decisions);
    let elapsed = start.elapsed();

    let summary = BenchmarkSummary {
        decisions,
        elapsed_ms: elapsed.as_millis(),
        decisions_per_second: decisions as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        report,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn inspect_command(input: PathBuf, top: usize, format: OutputFormat) -> Result<()> {
    let state = read_trained_state(&input)?;

    let mut greedy_action_counts = [0; ACTION_COUNT];
    let mut ranked: Vec<StateValue> = Vec::with_capacity(state.q_table.len());
    for (key, values) in &state.q_table {
        let best = best_action_index(values);
        greedy_action_counts[best] += 1;
        ranked.push(StateValue {
            state: *key,
            best_action: Direction::ALL[best],
            value: values[best],
        });
    }
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(top);

    let summary = InspectSummary {
        states: state.q_table.len(),
        visited_states: state
            .q_table
            .values()
            .filter(|values| values.iter().any(|v| *v != 0.0))
            .count(),
        exploration_rate: state.exploration_rate,
        lifetime_steps: state.lifetime_steps,
        greedy_action_counts,
        top_states: ranked,
    };

    match format {
        OutputFormat::Pretty => {
            println!(
                "states={} visited={} epsilon={:.4} lifetime_steps={}",
                summary.states,
                summary.visited_states,
                summary.exploration_rate,
                summary.lifetime_steps
            );
            for (direction, count) in Direction::ALL.iter().zip(summary.greedy_action_counts) {
                println!("greedy {direction:?}: {count}");
            }
            for entry in &summary.top_states {
                println!(
                    "{} -> {:?} ({:.3})",
                    entry.state, entry.best_action, entry.value
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<TrainingConfig> {
    match path {
        Some(path) => load_training_config_from_path(&path),
        None => Ok(default_training_config()),
    }
}

fn read_trained_state(path: &Path) -> Result<TrainedState> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read trained state {}", path.display()))?;
    let state = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse trained state {}", path.display()))?;
    Ok(state)
}

fn write_trained_state(path: &Path, state: &TrainedState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let payload = serde_json::to_string(state)?;
    let staging = staging_path(path);
    fs::write(&staging, payload)
        .with_context(|| format!("failed writing {}", staging.display()))?;
    fs::rename(&staging, path).with_context(|| {
        format!("failed moving {} to {}", staging.display(), path.display())
    })?;
    info!(
        path = %path.display(),
        states = state.q_table.len(),
        lifetime_steps = state.lifetime_steps,
        "saved trained state"
    );
    Ok(())
}

/// Sibling file the state is written to before it replaces `path`, so an
/// interrupted save never leaves a truncated state file behind.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "trained".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// `agent.json` becomes `agent-<seed>.json`.
fn worker_save_path(path: &Path, seed: u64) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("trained");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}-{seed}.{ext}"),
        None => format!("{stem}-{seed}"),
    };
    path.with_file_name(name)
}

fn write_output(text: String, out: Option<PathBuf>) -> Result<()> {
    if let Some(path) = out {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating output directory {}", parent.display())
            })?;
        }
        fs::write(&path, text).with_context(|| format!("failed writing {}", path.display()))?;
        info!(path = %path.display(), "wrote output");
    } else {
        println!("{text}");
    }
    Ok(())
}

//! Episode runner for IQ-UCT planning.
//!
//! Plays episodes of a simulated environment, choosing every action with a
//! fresh search, and writes one JSON line per episode. Episodes are
//! independent and run in parallel; each owns its environment, agent and
//! generators, all seeded from the episode seed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use iquct_core::{Action, Environment, Transition};
use iquct_envs::{CartPole, NChain, PoleDrift};
use iquct_mcts::{EmpiricalModel, IqUct, IqUctConfig, UniformPolicy, ValueModel};
use iquct_models::{KnnModel, LinearModel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// IQ-UCT planning runner.
#[derive(Parser)]
#[command(name = "iquct-run")]
#[command(about = "Plan episodes with approximate inferred-Q UCT")]
struct Cli {
    /// Log search summaries. RUST_LOG takes precedence when set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play episodes and write one JSON line per episode.
    Run {
        /// Environment to plan in.
        #[arg(short, long, value_enum, default_value = "dynamic-cartpole")]
        env: EnvKind,

        /// Value model generalizing across searches.
        #[arg(short, long, value_enum, default_value = "empirical")]
        model: ModelKind,

        /// Number of episodes to play.
        #[arg(long, default_value = "4")]
        episodes: usize,

        /// Maximum number of actions per episode.
        #[arg(long, default_value = "100")]
        steps: usize,

        /// JSON file with a search configuration. Flags below override it.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rollouts per action.
        #[arg(long)]
        rollouts: Option<usize>,

        /// Depth at which default-policy rollouts are cut off.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Discount factor.
        #[arg(long)]
        gamma: Option<f64>,

        /// UCB exploration constant.
        #[arg(long)]
        ucb_constant: Option<f64>,

        /// Plan with the time-evolving model instead of a frozen snapshot.
        #[arg(long)]
        dynamic_model: bool,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file for episode records (JSON lines).
        #[arg(short, long, default_value = "episodes.jsonl")]
        output: PathBuf,
    },

    /// Print the default search configuration as JSON.
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum EnvKind {
    /// Classic cart-pole.
    Cartpole,
    /// Cart-pole whose pole length drifts over time.
    DynamicCartpole,
    /// Five-position chain with slipping actions.
    Nchain,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ModelKind {
    /// Plain UCT: every node is valued by its own mean return.
    Empirical,
    /// Per-action ridge regression.
    Linear,
    /// Per-action k-nearest neighbours.
    Knn,
}

/// Search parameters given on the command line.
#[derive(Clone, Debug, Default)]
struct Overrides {
    rollouts: Option<usize>,
    max_depth: Option<usize>,
    gamma: Option<f64>,
    ucb_constant: Option<f64>,
    dynamic_model: bool,
}

/// Outcome of one episode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct EpisodeRecord {
    env: EnvKind,
    model: ModelKind,
    seed: u64,

    /// Actions taken.
    steps: usize,

    /// Undiscounted sum of rewards collected.
    total_reward: f64,

    /// Whether the last transition ended the episode.
    terminated: bool,

    /// Distinct (state, action) pairs remembered by the agent at the end.
    histories: usize,
}

/// Environments the runner can play real episodes in.
trait Episodic: Environment {
    /// Apply `action` to the real episode.
    fn advance(&mut self, action: &Action) -> iquct_core::Result<Transition<Self::State>>;
}

impl<R: Rng> Episodic for CartPole<R> {
    fn advance(&mut self, action: &Action) -> iquct_core::Result<Transition<Self::State>> {
        self.step(action)
    }
}

impl<R: Rng> Episodic for NChain<R> {
    fn advance(&mut self, action: &Action) -> iquct_core::Result<Transition<Self::State>> {
        self.step(action)
    }
}

/// Load the search configuration and apply command-line overrides.
fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<IqUctConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        }
        None => IqUctConfig::default(),
    };

    if let Some(rollouts) = overrides.rollouts {
        config.rollouts = rollouts;
    }
    if let Some(max_depth) = overrides.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(gamma) = overrides.gamma {
        config.gamma = gamma;
    }
    if let Some(c) = overrides.ucb_constant {
        config.ucb_constant = c;
    }
    if overrides.dynamic_model {
        config.dynamic_model = true;
    }

    config.validate().context("Invalid search configuration")?;
    Ok(config)
}

fn build_model(kind: ModelKind) -> Box<dyn ValueModel> {
    match kind {
        ModelKind::Empirical => Box::new(EmpiricalModel),
        ModelKind::Linear => Box::new(LinearModel::default()),
        ModelKind::Knn => Box::new(KnnModel::default()),
    }
}

/// Play one episode of `env` and return (steps, total reward, terminated,
/// histories).
fn play<E: Episodic>(
    mut env: E,
    config: &IqUctConfig,
    model: ModelKind,
    max_steps: usize,
    seed: u64,
) -> Result<(usize, f64, bool, usize)> {
    let policy = UniformPolicy::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)));
    let mut agent = IqUct::new(
        config.clone(),
        build_model(model),
        policy,
        ChaCha8Rng::seed_from_u64(seed.wrapping_add(2)),
    )?;

    let mut done = false;
    let mut total_reward = 0.0;
    let mut steps = 0;

    while steps < max_steps && !done {
        let action = agent.act(&mut env, done)?;
        let t = env.advance(&action)?;
        total_reward += t.reward;
        done = t.terminal;
        steps += 1;

        debug!(seed, step = steps, action = %action, reward = t.reward, "step");
    }

    Ok((steps, total_reward, done, agent.histories().len()))
}

/// Run a single episode with its own environment and agent.
fn run_episode(
    env: EnvKind,
    model: ModelKind,
    config: &IqUctConfig,
    max_steps: usize,
    seed: u64,
) -> Result<EpisodeRecord> {
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let (steps, total_reward, terminated, histories) = match env {
        EnvKind::Cartpole => play(
            CartPole::new(rng).with_max_steps(max_steps),
            config,
            model,
            max_steps,
            seed,
        )?,
        EnvKind::DynamicCartpole => {
            let drift = PoleDrift {
                amplitude: 0.5,
                period: 100.0,
            };
            play(
                CartPole::dynamic(rng, drift).with_max_steps(max_steps),
                config,
                model,
                max_steps,
                seed,
            )?
        }
        EnvKind::Nchain => play(
            NChain::with_params(rng, 5, 0.2, 2.0, 10.0, max_steps),
            config,
            model,
            max_steps,
            seed,
        )?,
    };

    info!(seed, steps, total_reward, terminated, "episode finished");
    Ok(EpisodeRecord {
        env,
        model,
        seed,
        steps,
        total_reward,
        terminated,
        histories,
    })
}

/// Write records as JSON lines.
fn write_records(path: &Path, records: &[EpisodeRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .with_context(|| format!("Failed to serialize episode {}", record.seed))?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Run the run command.
#[allow(clippy::too_many_arguments)]
fn cmd_run(
    env: EnvKind,
    model: ModelKind,
    episodes: usize,
    steps: usize,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    seed: u64,
    output: PathBuf,
) -> Result<()> {
    let config = load_config(config_path.as_deref(), &overrides)?;

    println!(
        "Playing {} episodes of {:?} with the {:?} model ({} rollouts/action)",
        episodes, env, model, config.rollouts
    );
    println!("Seed: {}", seed);

    let start = Instant::now();

    let records: Vec<EpisodeRecord> = (0..episodes)
        .into_par_iter()
        .map(|i| {
            let episode_seed = seed.wrapping_add(i as u64 * 1000);
            run_episode(env, model, &config, steps, episode_seed)
        })
        .collect::<Result<_>>()?;

    write_records(&output, &records)?;

    let elapsed = start.elapsed();
    let n = records.len().max(1) as f64;
    let mean_reward = records.iter().map(|r| r.total_reward).sum::<f64>() / n;
    let mean_steps = records.iter().map(|r| r.steps).sum::<usize>() as f64 / n;
    let terminated = records.iter().filter(|r| r.terminated).count();

    println!("\nCompleted in {:.2}s", elapsed.as_secs_f64());
    println!("Episodes: {}", records.len());
    println!("Average total reward: {:.2}", mean_reward);
    println!("Average length: {:.1} steps", mean_steps);
    println!("Terminated early: {}", terminated);
    println!("Records saved to: {:?}", output);

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            env,
            model,
            episodes,
            steps,
            config,
            rollouts,
            max_depth,
            gamma,
            ucb_constant,
            dynamic_model,
            seed,
            output,
        } => cmd_run(
            env,
            model,
            episodes,
            steps,
            config,
            Overrides {
                rollouts,
                max_depth,
                gamma,
                ucb_constant,
                dynamic_model,
            },
            seed,
            output,
        ),

        Commands::Config => {
            let json = serde_json::to_string_pretty(&IqUctConfig::default())?;
            println!("{}", json);
            Ok(())
        }
    }
}

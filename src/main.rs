//! Reward Optimizer CLI
//!
//! Fits the attendance model on a historical event table and answers
//! attendance forecasts and reward recommendations.
//!
//! # Usage
//!
//! ```bash
//! # Fit and print the decay-selection report
//! reward-optimizer train --data events.csv
//!
//! # Expected attendance for one event at a given reward
//! reward-optimizer predict --data events.csv --event event.json --reward 3000
//!
//! # Reward recommendation for the narrative generator (request from stdin)
//! echo '{"event_type": "seminar", ..., "target_participants": 80}' \
//!     | reward-optimizer recommend --data events.csv --request -
//!
//! # Print the built-in configuration as TOML
//! reward-optimizer show-config
//! ```
//!
//! # Environment Variables
//!
//! - `REWARD_OPTIMIZER_CONFIG`: Path to engine TOML config
//! - `RUST_LOG`: Logging level (default: info)

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::info;

use reward_optimizer::{
    EngineConfig, EventFeatures, RecommendRequest, RecommendationResponse, RewardEngine,
    SearchBounds, TrainingDataset,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "reward-optimizer")]
#[command(about = "Event attendance forecasting and reward recommendation")]
#[command(version)]
struct CliArgs {
    /// Engine config TOML (overrides REWARD_OPTIMIZER_CONFIG and ./reward_optimizer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Fit on a training table and print the training report as JSON
    Train {
        /// Historical events CSV
        #[arg(long)]
        data: PathBuf,
    },

    /// Predict attendance for an event at a given reward
    Predict {
        #[arg(long)]
        data: PathBuf,
        /// Event features JSON file, or "-" for stdin
        #[arg(long)]
        event: String,
        /// Reward per participant
        #[arg(long)]
        reward: f64,
    },

    /// Recommend a reward for a target head count
    Recommend {
        #[arg(long)]
        data: PathBuf,
        /// Recommendation request JSON file, or "-" for stdin
        #[arg(long)]
        request: String,
        /// Lower search bound (default: smallest training reward, at least 0)
        #[arg(long)]
        low: Option<f64>,
        /// Upper search bound (default: 1.2 x largest training reward)
        #[arg(long)]
        high: Option<f64>,
    },

    /// Print the effective engine configuration as TOML
    ShowConfig,
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load_from_file(p)
            .with_context(|| format!("loading engine config {}", p.display())),
        None => Ok(EngineConfig::load()),
    }
}

/// Read and parse a JSON document from a file path or "-" (stdin).
fn read_json<T: DeserializeOwned>(source: &str) -> Result<T> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading JSON from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing JSON from {source}"))
}

fn fitted_engine(config: EngineConfig, data: &Path) -> Result<RewardEngine> {
    let dataset = TrainingDataset::from_path(data)
        .with_context(|| format!("loading training data {}", data.display()))?;
    let engine = RewardEngine::new(config);
    engine
        .fit(dataset.records())
        .context("fitting attendance model")?;
    Ok(engine)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        SubCommand::Train { data } => {
            let engine = fitted_engine(config, &data)?;
            let state = engine.snapshot().context("no model published after fit")?;
            for score in &state.report().selection.scores {
                info!(
                    lambda = score.lambda,
                    mean_r2 = score.mean_r2,
                    policy = %score.policy,
                    "Candidate"
                );
            }
            print_json(state.report())?;
        }

        SubCommand::Predict {
            data,
            event,
            reward,
        } => {
            let features: EventFeatures = read_json(&event)?;
            let engine = fitted_engine(config, &data)?;
            let expected = engine.predict_participants(&features, reward)?;
            print_json(&serde_json::json!({
                "features": features,
                "reward": reward,
                "expected_participants": expected,
            }))?;
        }

        SubCommand::Recommend {
            data,
            request,
            low,
            high,
        } => {
            let request: RecommendRequest = read_json(&request)?;
            let engine = fitted_engine(config, &data)?;
            let recommendation = engine.find_best_reward(
                &request.features,
                request.target_participants,
                SearchBounds { low, high },
            )?;
            print_json(&RecommendationResponse::new(request, &recommendation))?;
        }

        SubCommand::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

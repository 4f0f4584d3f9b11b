//! Synthetic Event Log Generator
//!
//! Writes a training CSV whose attendance follows a known reward decay rate,
//! for exercising `reward-optimizer train` end to end.
//!
//! # Usage
//! ```bash
//! ./synthetic-events --rows 300 --decay 0.05 --output events.csv
//! ./reward-optimizer train --data events.csv
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use reward_optimizer::synthetic::{SyntheticConfig, SyntheticEvents};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "synthetic-events")]
#[command(about = "Synthetic event log with a known reward decay rate")]
#[command(version)]
struct Args {
    /// Number of events to generate
    #[arg(short, long, default_value = "300", value_parser = clap::value_parser!(u32).range(1..=1_000_000))]
    rows: u32,

    /// True decay rate of reward effectiveness per day
    #[arg(short, long, default_value = "0.05")]
    decay: f64,

    /// Largest reward offered
    #[arg(long, default_value = "5000")]
    max_reward: f64,

    /// Largest number of days between announcement and event
    #[arg(long, default_value = "30")]
    max_gap: u32,

    /// Standard deviation of attendance noise
    #[arg(long, default_value = "1.5")]
    noise: f64,

    /// Random seed for reproducibility
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output CSV path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if !(args.decay >= 0.0 && args.decay.is_finite()) {
        anyhow::bail!("--decay must be a non-negative rate, got {}", args.decay);
    }
    if !(args.noise >= 0.0 && args.noise.is_finite()) {
        anyhow::bail!("--noise must be >= 0, got {}", args.noise);
    }

    let generator = SyntheticEvents::new(SyntheticConfig {
        rows: args.rows as usize,
        decay_lambda: args.decay,
        max_reward: args.max_reward,
        max_gap: args.max_gap,
        noise_std: args.noise,
        seed: args.seed,
        ..SyntheticConfig::default()
    });
    let dataset = generator.dataset();

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut out = BufWriter::new(file);
            dataset.write_csv(&mut out)?;
            out.flush()?;
            eprintln!(
                "Wrote {} events (decay {}) to {}",
                dataset.len(),
                args.decay,
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            dataset.write_csv(&mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

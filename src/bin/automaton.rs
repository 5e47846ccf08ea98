//! Distributed cellular automaton runner.
//!
//! Seeds a random grid, runs the decomposed simulation across a rank mesh,
//! and writes the final grid as a PBM image.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use halogrid::{run, RunConfig, DEFAULT_REPORT_EVERY, DEFAULT_RHO, DEFAULT_SIDE};

#[derive(Parser, Debug)]
#[command(name = "automaton", about = "Cellular automaton over a 2D rank mesh")]
struct Args {
    /// Random seed for grid initialization
    seed: u64,

    /// Number of ranks in the mesh
    #[arg(short, long, default_value_t = 4)]
    processes: usize,

    /// Global grid side length
    #[arg(long, default_value_t = DEFAULT_SIDE)]
    side: usize,

    /// Target live-cell density at initialization
    #[arg(long, default_value_t = DEFAULT_RHO)]
    rho: f64,

    /// Step limit (defaults to 10x the side length)
    #[arg(long)]
    max_steps: Option<usize>,

    /// Steps between progress reports (0 disables)
    #[arg(long, default_value_t = DEFAULT_REPORT_EVERY)]
    report_every: usize,

    /// Where to write the final grid image
    #[arg(short, long, default_value = "cell.pbm")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    let mut config = RunConfig::new(args.side, args.seed, args.processes);
    config.rho = args.rho;
    config.report_every = args.report_every;
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }

    let report = run(&config).context("simulation failed")?;

    report
        .grid
        .write_pbm(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        output = %args.output.display(),
        elapsed = ?report.elapsed,
        "wrote final grid"
    );
    Ok(())
}

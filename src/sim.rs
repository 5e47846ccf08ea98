//! The simulation driver: distribution, step loop, termination, collection.

use std::time::{Duration, Instant};

use tracing::info;

use crate::comm::Communicator;
use crate::error::{Error, Result};
use crate::field::LocalField;
use crate::grid::Grid;
use crate::group::ProcessGroup;
use crate::halo::HaloExchange;
use crate::partition::Partition;
use crate::topology::CartComm;
use crate::update::{advance, StepCounts};
use crate::ReduceOp;

/// Default global grid side length.
pub const DEFAULT_SIDE: usize = 768;
/// Default target live-cell density for initialization.
pub const DEFAULT_RHO: f64 = 0.49;
/// Default progress-report interval in steps.
pub const DEFAULT_REPORT_EVERY: usize = 500;

const ROOT: usize = 0;

/// Parameters for one simulation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Global grid side length
    pub side: usize,
    /// Random seed for grid initialization
    pub seed: u64,
    /// Number of ranks in the mesh
    pub processes: usize,
    /// Target live-cell density at initialization
    pub rho: f64,
    /// Maximum number of steps before the run stops regardless of state
    pub max_steps: usize,
    /// Steps between progress reports (0 disables reporting)
    pub report_every: usize,
}

impl RunConfig {
    /// A config with the reference run's policies: density 0.49, step limit
    /// 10× the side length, report every 500 steps.
    pub fn new(side: usize, seed: u64, processes: usize) -> Self {
        RunConfig {
            side,
            seed,
            processes,
            rho: DEFAULT_RHO,
            max_steps: 10 * side,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }
}

/// Outcome of a simulation run, produced on the coordinating rank.
#[derive(Debug)]
pub struct RunReport {
    /// The collected final grid
    pub grid: Grid,
    /// Number of steps executed
    pub steps: usize,
    /// Global live-cell count after the last step
    pub live: i64,
    /// Global changed-cell count in the last step
    pub changed: i64,
    /// Whether the population bounds fired before the step limit
    pub converged: bool,
    /// Wall-clock time spent in the step loop, between barriers
    pub elapsed: Duration,
}

/// Run the distributed automaton and return the coordinating rank's report.
///
/// # Example
///
/// ```
/// use halogrid::RunConfig;
///
/// let mut config = RunConfig::new(16, 7, 2);
/// config.max_steps = 8;
/// let report = halogrid::run(&config).unwrap();
/// assert_eq!(report.grid.side(), 16);
/// assert!(report.steps <= 8);
/// ```
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let reports = ProcessGroup::run(config.processes, |comm| worker(comm, config))?;
    reports
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| Error::Internal("coordinating rank produced no report".into()))
}

/// The per-rank worker: everything between bootstrap and teardown.
fn worker(comm: Communicator, config: &RunConfig) -> Result<Option<RunReport>> {
    let cart = CartComm::new(comm)?;
    let part = Partition::new(cart.dims(), cart.coords(), config.side)?;
    let rank = cart.comm().rank();

    // The coordinating rank owns the global grid during setup; everyone
    // else receives a copy and carves out its own rectangle.
    let (mut cells, initial_live) = if rank == ROOT {
        info!(
            processes = config.processes,
            side = config.side,
            rho = config.rho,
            seed = config.seed,
            max_steps = config.max_steps,
            "automaton starting"
        );
        let (grid, live) = Grid::random(config.side, config.seed, config.rho);
        info!(
            live,
            density = live as f64 / (config.side * config.side) as f64,
            "grid initialized"
        );
        (grid.into_cells(), live)
    } else {
        (vec![0u8; config.side * config.side], 0)
    };
    cart.comm().broadcast(&mut cells, ROOT)?;
    let initial_live = cart.comm().broadcast_scalar(initial_live, ROOT)?;

    // Population bounds, fixed once from the initial count.
    let max_live = initial_live * 3 / 2;
    let min_live = initial_live * 2 / 3;

    let global = Grid::from_cells(config.side, cells)?;
    let block = global.block(part.x0, part.y0, part.lx, part.ly);
    let mut field = LocalField::from_block(&block, part.lx, part.ly)?;
    drop(global);

    let halo = HaloExchange::new(&cart, &field);

    cart.comm().barrier()?;
    let started = Instant::now();

    let mut steps = 0;
    let mut converged = false;
    let mut live = initial_live;
    let mut changed = 0;
    for step in 1..=config.max_steps {
        steps = step;
        halo.exchange(cart.comm(), &mut field)?;
        let counts: StepCounts = advance(&mut field);

        // Every rank gets the live total and evaluates the identical stop
        // predicate from it; the changed total only matters on the
        // coordinating rank, for reporting.
        live = cart.comm().allreduce_scalar(counts.live, ReduceOp::Sum)?;
        changed = cart.comm().reduce_scalar(counts.changed, ReduceOp::Sum, ROOT)?;
        if live > max_live || live < min_live {
            converged = true;
            break;
        }
        if rank == ROOT && config.report_every > 0 && step % config.report_every == 0 {
            info!(step, live, changed, "automaton progress");
        }
    }

    cart.comm().barrier()?;
    let elapsed = started.elapsed();

    // Collection: each rank contributes its interior to a zeroed staging
    // grid; summing the staging grids reassembles the global grid because
    // every cell is owned by exactly one rank.
    let mut staging = Grid::dead(config.side);
    staging.place_block(part.x0, part.y0, part.lx, part.ly, &field.interior());
    let mut collected = vec![0u8; config.side * config.side];
    cart.comm()
        .reduce(staging.cells(), &mut collected, ReduceOp::Sum, ROOT)?;

    if rank == ROOT {
        info!(steps, live, changed, converged, ?elapsed, "automaton finished");
        Ok(Some(RunReport {
            grid: Grid::from_cells(config.side, collected)?,
            steps,
            live,
            changed,
            converged,
            elapsed,
        }))
    } else {
        Ok(None)
    }
}

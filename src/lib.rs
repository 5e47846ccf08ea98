//! # halogrid
//!
//! A discrete cellular automaton run over a fixed square grid, parallelized
//! across a group of cooperating rank workers by 2D spatial domain
//! decomposition.
//!
//! Each rank owns a rectangular sub-region of the grid, exchanges a
//! one-cell-deep halo with its four spatial neighbors every step, applies
//! the local transition rule, and participates in a global convergence
//! check. Ranks share no simulation state: all coordination flows through
//! explicit message passing — point-to-point sends with completion handles
//! for the halo protocol, and sum reductions for the termination decision.
//!
//! The mesh has one periodic axis (columns wrap around, toroidal) and one
//! bounded axis (edge rows face a fixed dead boundary).
//!
//! ## Quick Start
//!
//! ```
//! use halogrid::RunConfig;
//!
//! let mut config = RunConfig::new(16, 42, 4);
//! config.max_steps = 10;
//!
//! let report = halogrid::run(&config).unwrap();
//! println!(
//!     "{} live cells after {} steps ({:?})",
//!     report.live, report.steps, report.elapsed
//! );
//! ```
//!
//! ## Building blocks
//!
//! The pieces compose bottom-up and are all public:
//!
//! - [`ProcessGroup`] / [`Communicator`] — spawn a rank group; barrier,
//!   broadcast, reduce, all-reduce, and point-to-point messaging with
//!   [`Request`] completion handles.
//! - [`dims_create`] / [`CartComm`] / [`Neighbors`] — the 2D mesh
//!   arrangement and neighbor addressing.
//! - [`Partition`] — each rank's rectangle, remainder handled.
//! - [`Grid`] — the global grid: seeded initialization, rectangle mapping,
//!   PBM serialization.
//! - [`LocalField`] / [`HaloExchange`] — the owned rectangle with its ghost
//!   frame and the per-step border exchange.
//! - [`advance`] — the transition rule with live/changed counters.
//! - [`run`] — the full driver wiring all of the above together.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

mod comm;
mod datatype;
mod error;
mod field;
mod grid;
mod group;
mod halo;
mod partition;
mod request;
mod sim;
mod topology;
mod update;

pub use comm::Communicator;
pub use datatype::{Datatype, Layout};
pub use error::{Error, Result};
pub use field::LocalField;
pub use grid::{Grid, DEAD, LIVE};
pub use group::ProcessGroup;
pub use halo::HaloExchange;
pub use partition::Partition;
pub use request::Request;
pub use sim::{run, RunConfig, RunReport, DEFAULT_REPORT_EVERY, DEFAULT_RHO, DEFAULT_SIDE};
pub use topology::{dims_create, CartComm, Neighbors};
pub use update::{advance, StepCounts};

/// Reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Sum of values
    Sum,
    /// Maximum value
    Max,
    /// Minimum value
    Min,
    /// Product of values
    Prod,
}

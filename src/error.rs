//! Error types for halogrid

use thiserror::Error;

/// Result type for halogrid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for topology, partitioning, and communication failures.
///
/// Every communication error is fatal for the whole run: after a failed
/// transfer the local grid is inconsistent with its peers, and retrying a
/// desynchronized collective risks deadlock.
#[derive(Error, Debug)]
pub enum Error {
    /// The process count cannot be arranged into a 2D mesh
    #[error("invalid topology: {0}")]
    Topology(String),

    /// The grid side is too small for the mesh extent along an axis
    #[error("invalid partition: grid side {side} is smaller than mesh extent {extent} on axis {axis}")]
    Partition {
        /// Global grid side length
        side: usize,
        /// Number of ranks along the offending axis
        extent: usize,
        /// Axis index (0 = bounded, 1 = periodic)
        axis: usize,
    },

    /// A rank outside the group was addressed
    #[error("invalid rank: {0}")]
    InvalidRank(usize),

    /// Send and receive buffers disagree on length
    #[error("buffer length mismatch: expected {expected}, got {actual}")]
    BufferMismatch {
        /// Length the operation required
        expected: usize,
        /// Length actually supplied or received
        actual: usize,
    },

    /// A message arrived with an element type other than the one expected
    #[error("datatype mismatch in message from rank {src} (tag {tag})")]
    DatatypeMismatch {
        /// Source rank of the offending message
        src: usize,
        /// Tag the message was matched under
        tag: i32,
    },

    /// A peer endpoint disappeared while communication was outstanding
    #[error("rank {rank} left the group mid-communication")]
    Disconnected {
        /// The departed rank
        rank: usize,
    },

    /// A worker thread panicked
    #[error("worker for rank {rank} panicked")]
    WorkerPanicked {
        /// Rank whose worker panicked
        rank: usize,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error while serializing the final grid
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

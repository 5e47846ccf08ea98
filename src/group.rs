//! Spawning and joining a group of cooperating rank workers.

use crossbeam_channel::unbounded;

use crate::comm::Communicator;
use crate::error::{Error, Result};

/// A group of symmetric workers, one thread per rank.
///
/// Workers share no simulation state; all coordination flows through the
/// [`Communicator`] endpoint handed to each worker. This is the crate's
/// process-group bootstrap: rank count in, per-rank results out.
pub struct ProcessGroup;

impl ProcessGroup {
    /// Run `worker` once per rank and collect the results in rank order.
    ///
    /// Blocks until every worker has finished. If any worker fails or
    /// panics, the first failure (in rank order) is returned after all
    /// workers have been joined, so no stray thread keeps running against
    /// dead peers.
    ///
    /// # Example
    ///
    /// ```
    /// use halogrid::{ProcessGroup, Result};
    ///
    /// let ranks = ProcessGroup::run(3, |comm| -> Result<usize> {
    ///     comm.barrier()?;
    ///     Ok(comm.rank())
    /// })
    /// .unwrap();
    /// assert_eq!(ranks, vec![0, 1, 2]);
    /// ```
    pub fn run<T, F>(size: usize, worker: F) -> Result<Vec<T>>
    where
        F: Fn(Communicator) -> Result<T> + Sync,
        T: Send,
    {
        if size == 0 {
            return Err(Error::Topology(
                "process group must contain at least one rank".into(),
            ));
        }

        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        let endpoints: Vec<Communicator> = receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Communicator::new(rank, senders.clone(), inbox))
            .collect();

        std::thread::scope(|scope| {
            let worker = &worker;
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|comm| scope.spawn(move || worker(comm)))
                .collect();

            let mut results = Vec::with_capacity(size);
            let mut first_error = None;
            for (rank, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(value)) => results.push(value),
                    Ok(Err(error)) => {
                        if first_error.is_none() {
                            first_error = Some(error);
                        }
                    }
                    Err(_) => {
                        if first_error.is_none() {
                            first_error = Some(Error::WorkerPanicked { rank });
                        }
                    }
                }
            }
            match first_error {
                Some(error) => Err(error),
                None => Ok(results),
            }
        })
    }
}

//! Completion handles for nonblocking send operations.

use crossbeam_channel::{Receiver, TryRecvError};

use crate::error::{Error, Result};

/// A handle to an in-flight synchronous send.
///
/// Returned by [`Communicator::issend`](crate::Communicator::issend). The
/// send completes only when the matching receive has consumed the message;
/// call [`wait()`](Request::wait) (or [`Request::wait_all`]) to confirm
/// completion before the step may proceed.
///
/// The send buffer is moved into the message at issue time, so there is no
/// buffer-reuse hazard while the request is outstanding.
pub struct Request {
    ack: Receiver<()>,
    dest: usize,
    completed: bool,
}

impl Request {
    pub(crate) fn new(ack: Receiver<()>, dest: usize) -> Self {
        Request {
            ack,
            dest,
            completed: false,
        }
    }

    /// The rank this send was addressed to.
    pub fn dest(&self) -> usize {
        self.dest
    }

    /// Check if this request has been observed complete.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Block until the matching receive has consumed the message.
    ///
    /// Fails with [`Error::Disconnected`] if the destination endpoint went
    /// away without ever receiving it.
    pub fn wait(mut self) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        self.completed = true;
        self.ack
            .recv()
            .map_err(|_| Error::Disconnected { rank: self.dest })
    }

    /// Test for completion without blocking.
    ///
    /// Returns `true` once the message has been received on the other side.
    pub fn test(&mut self) -> Result<bool> {
        if self.completed {
            return Ok(true);
        }
        match self.ack.try_recv() {
            Ok(()) => {
                self.completed = true;
                Ok(true)
            }
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => Err(Error::Disconnected { rank: self.dest }),
        }
    }

    /// Wait for every request in a collection to complete.
    pub fn wait_all(requests: Vec<Request>) -> Result<()> {
        for request in requests {
            request.wait()?;
        }
        Ok(())
    }
}

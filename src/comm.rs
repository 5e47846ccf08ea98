//! Rank endpoint: point-to-point messaging and collective operations.

use std::cell::RefCell;
use std::collections::VecDeque;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::datatype::{Datatype, Payload};
use crate::error::{Error, Result};
use crate::request::Request;
use crate::ReduceOp;

/// Control tag broadcast by an endpoint as it is dropped, so peers blocked
/// on a receive from a departed rank fail instead of hanging forever.
pub(crate) const TAG_LEAVE: i32 = i32::MIN;

// Reserved tags for the root-rooted collective algorithms. User tags are
// non-negative, so collective traffic can never match a user receive.
const TAG_BCAST: i32 = -1;
const TAG_REDUCE: i32 = -2;
const TAG_BARRIER: i32 = -3;

pub(crate) struct Envelope {
    pub(crate) src: usize,
    pub(crate) tag: i32,
    pub(crate) payload: Payload,
    /// Present on synchronous sends; signalled when the receive matches.
    pub(crate) token: Option<Sender<()>>,
}

/// One rank's communication endpoint within a [`ProcessGroup`](crate::ProcessGroup).
///
/// Provides the point-to-point and collective operations the simulation is
/// built from. Messages are matched by `(source, tag)` in FIFO order per
/// pair, so two messages sent on the same tag arrive in send order — the
/// halo exchange's periodic self-wrap relies on this.
///
/// # Example
///
/// ```
/// use halogrid::{ProcessGroup, ReduceOp, Result};
///
/// let sums = ProcessGroup::run(4, |comm| -> Result<i64> {
///     comm.allreduce_scalar(comm.rank() as i64, ReduceOp::Sum)
/// })
/// .unwrap();
/// assert_eq!(sums, vec![6, 6, 6, 6]);
/// ```
pub struct Communicator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    /// Messages received while waiting for a different `(source, tag)`.
    pending: RefCell<VecDeque<Envelope>>,
}

impl Communicator {
    pub(crate) fn new(rank: usize, peers: Vec<Sender<Envelope>>, inbox: Receiver<Envelope>) -> Self {
        Communicator {
            rank,
            peers,
            inbox,
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// The rank of the calling worker in this group.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The number of ranks in this group.
    pub fn size(&self) -> usize {
        self.peers.len()
    }

    // ========================================================================
    // Point-to-Point Communication
    // ========================================================================

    /// Send a buffered message to another rank.
    ///
    /// Completes immediately; the data is copied into the message.
    pub fn send<T: Datatype>(&self, data: &[T], dest: usize, tag: i32) -> Result<()> {
        self.post(dest, tag, T::wrap(data.to_vec()), None)
    }

    /// Start a synchronous nonblocking send.
    ///
    /// The message is issued immediately but the returned [`Request`] only
    /// completes once the matching receive has consumed it. The buffer is
    /// moved into the message, so it cannot be reused while in flight.
    pub fn issend<T: Datatype>(&self, data: Vec<T>, dest: usize, tag: i32) -> Result<Request> {
        let (ack_tx, ack_rx) = bounded(1);
        self.post(dest, tag, T::wrap(data), Some(ack_tx))?;
        Ok(Request::new(ack_rx, dest))
    }

    /// Receive a message from `src` with the given tag, blocking until one
    /// arrives.
    pub fn recv<T: Datatype>(&self, src: usize, tag: i32) -> Result<Vec<T>> {
        if src >= self.size() {
            return Err(Error::InvalidRank(src));
        }
        let envelope = self.take_matching(src, tag)?;
        if let Some(token) = envelope.token {
            // The sender may already have dropped its request handle.
            let _ = token.send(());
        }
        T::unwrap(envelope.payload).ok_or(Error::DatatypeMismatch { src, tag })
    }

    fn post(&self, dest: usize, tag: i32, payload: Payload, token: Option<Sender<()>>) -> Result<()> {
        let peer = self.peers.get(dest).ok_or(Error::InvalidRank(dest))?;
        peer.send(Envelope {
            src: self.rank,
            tag,
            payload,
            token,
        })
        .map_err(|_| Error::Disconnected { rank: dest })
    }

    /// Pull envelopes off the inbox until one matches `(src, tag)`, parking
    /// non-matching ones. FIFO order per `(src, tag)` pair is preserved.
    fn take_matching(&self, src: usize, tag: i32) -> Result<Envelope> {
        let mut pending = self.pending.borrow_mut();
        if let Some(pos) = pending.iter().position(|e| e.src == src && e.tag == tag) {
            if let Some(envelope) = pending.remove(pos) {
                return Ok(envelope);
            }
        }
        if pending.iter().any(|e| e.src == src && e.tag == TAG_LEAVE) {
            return Err(Error::Disconnected { rank: src });
        }
        loop {
            let envelope = self
                .inbox
                .recv()
                .map_err(|_| Error::Disconnected { rank: src })?;
            if envelope.src == src && envelope.tag == tag {
                return Ok(envelope);
            }
            let departed = envelope.src == src && envelope.tag == TAG_LEAVE;
            pending.push_back(envelope);
            if departed {
                return Err(Error::Disconnected { rank: src });
            }
        }
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// No rank returns until every rank in the group has entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        if self.rank == 0 {
            for src in 1..self.size() {
                self.recv::<u8>(src, TAG_BARRIER)?;
            }
            for dest in 1..self.size() {
                self.send::<u8>(&[], dest, TAG_BARRIER)?;
            }
        } else {
            self.send::<u8>(&[], 0, TAG_BARRIER)?;
            self.recv::<u8>(0, TAG_BARRIER)?;
        }
        Ok(())
    }

    // ========================================================================
    // Collectives
    // ========================================================================

    /// Broadcast a buffer from `root` to all ranks.
    ///
    /// On `root`, `data` is the input; on every other rank it is overwritten
    /// with the root's values. All ranks must pass equal-length buffers.
    pub fn broadcast<T: Datatype>(&self, data: &mut [T], root: usize) -> Result<()> {
        if root >= self.size() {
            return Err(Error::InvalidRank(root));
        }
        if self.rank == root {
            for dest in 0..self.size() {
                if dest != root {
                    self.send(data, dest, TAG_BCAST)?;
                }
            }
        } else {
            let incoming = self.recv::<T>(root, TAG_BCAST)?;
            if incoming.len() != data.len() {
                return Err(Error::BufferMismatch {
                    expected: data.len(),
                    actual: incoming.len(),
                });
            }
            data.copy_from_slice(&incoming);
        }
        Ok(())
    }

    /// Broadcast a single value from `root` to all ranks.
    pub fn broadcast_scalar<T: Datatype>(&self, value: T, root: usize) -> Result<T> {
        let mut buf = [value];
        self.broadcast(&mut buf, root)?;
        Ok(buf[0])
    }

    /// Reduce buffers elementwise onto the `root` rank.
    ///
    /// `recv` is only significant at `root`; other ranks' `recv` buffers are
    /// left untouched. Contributions are combined in rank order, so integer
    /// reductions are deterministic.
    pub fn reduce<T: Datatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        op: ReduceOp,
        root: usize,
    ) -> Result<()> {
        if root >= self.size() {
            return Err(Error::InvalidRank(root));
        }
        if send.len() != recv.len() {
            return Err(Error::BufferMismatch {
                expected: send.len(),
                actual: recv.len(),
            });
        }
        if self.rank == root {
            recv.copy_from_slice(send);
            for src in 0..self.size() {
                if src == root {
                    continue;
                }
                let part = self.recv::<T>(src, TAG_REDUCE)?;
                if part.len() != recv.len() {
                    return Err(Error::BufferMismatch {
                        expected: recv.len(),
                        actual: part.len(),
                    });
                }
                for (acc, value) in recv.iter_mut().zip(part) {
                    *acc = T::combine(op, *acc, value);
                }
            }
        } else {
            self.send(send, root, TAG_REDUCE)?;
        }
        Ok(())
    }

    /// Reduce a single value onto `root`.
    ///
    /// Returns the combined value at `root` and the caller's own value
    /// elsewhere.
    pub fn reduce_scalar<T: Datatype>(&self, value: T, op: ReduceOp, root: usize) -> Result<T> {
        let send = [value];
        let mut recv = [value];
        self.reduce(&send, &mut recv, op, root)?;
        Ok(recv[0])
    }

    /// All-reduce: reduce elementwise and distribute the result to every rank.
    pub fn allreduce<T: Datatype>(&self, send: &[T], recv: &mut [T], op: ReduceOp) -> Result<()> {
        self.reduce(send, recv, op, 0)?;
        self.broadcast(recv, 0)
    }

    /// All-reduce a single value; every rank returns the identical result.
    pub fn allreduce_scalar<T: Datatype>(&self, value: T, op: ReduceOp) -> Result<T> {
        let send = [value];
        let mut recv = [value];
        self.allreduce(&send, &mut recv, op)?;
        Ok(recv[0])
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        // Tell everyone this endpoint is gone. Peers blocked on a receive
        // from this rank fail with Disconnected instead of hanging.
        for (dest, peer) in self.peers.iter().enumerate() {
            if dest != self.rank {
                let _ = peer.send(Envelope {
                    src: self.rank,
                    tag: TAG_LEAVE,
                    payload: Payload::U8(Vec::new()),
                    token: None,
                });
            }
        }
    }
}

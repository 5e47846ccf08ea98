//! Element types and transfer-shape descriptors.
//!
//! This module provides the [`Datatype`] trait, a sealed trait that maps the
//! element types carried over the mesh onto message payloads, and [`Layout`],
//! the strided transfer descriptor used to move non-contiguous cell runs
//! (one cell per row, spaced by the local row stride) as a single message.
//!
//! # Supported Types
//!
//! | Rust Type | Used for                         |
//! |-----------|----------------------------------|
//! | `u8`      | cell states                      |
//! | `i32`     | small counters and flags         |
//! | `i64`     | live/changed cell counters       |
//! | `f64`     | timings and diagnostics          |

use crate::error::{Error, Result};
use crate::ReduceOp;

/// Internal module to seal the trait — prevents external implementations.
mod sealed {
    pub trait Sealed {}
}

/// Type-erased message payload moved between rank endpoints.
///
/// One variant per [`Datatype`] implementor; receiving with the wrong
/// element type surfaces as [`Error::DatatypeMismatch`].
#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum Payload {
    /// Cell states
    U8(Vec<u8>),
    /// 32-bit counters
    I32(Vec<i32>),
    /// 64-bit counters
    I64(Vec<i64>),
    /// Timings and diagnostics
    F64(Vec<f64>),
}

/// Trait for element types that can be carried in mesh communication.
///
/// This is a **sealed trait** — it cannot be implemented outside this crate.
/// Supported types: [`u8`], [`i32`], [`i64`], [`f64`].
pub trait Datatype: sealed::Sealed + Copy + Send + 'static {
    /// Wrap owned data into a message payload.
    #[doc(hidden)]
    fn wrap(data: Vec<Self>) -> Payload;

    /// Recover owned data from a payload, or `None` on a type mismatch.
    #[doc(hidden)]
    fn unwrap(payload: Payload) -> Option<Vec<Self>>;

    /// Combine two elements under a reduction operation.
    #[doc(hidden)]
    fn combine(op: ReduceOp, a: Self, b: Self) -> Self;
}

macro_rules! impl_datatype {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}
        impl Datatype for $ty {
            fn wrap(data: Vec<Self>) -> Payload {
                Payload::$variant(data)
            }

            fn unwrap(payload: Payload) -> Option<Vec<Self>> {
                match payload {
                    Payload::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn combine(op: ReduceOp, a: Self, b: Self) -> Self {
                match op {
                    ReduceOp::Sum => a + b,
                    ReduceOp::Prod => a * b,
                    ReduceOp::Max => {
                        if a > b {
                            a
                        } else {
                            b
                        }
                    }
                    ReduceOp::Min => {
                        if a < b {
                            a
                        } else {
                            b
                        }
                    }
                }
            }
        }
    };
}

impl_datatype!(u8, U8);
impl_datatype!(i32, I32);
impl_datatype!(i64, I64);
impl_datatype!(f64, F64);

/// Transfer-shape descriptor for moving cells between a field buffer and a
/// flat message.
///
/// A layout is `count` blocks of `block_len` elements, with block starts
/// spaced `stride` elements apart. [`Layout::contiguous`] describes a flat
/// run (a boundary row); [`Layout::vector`] describes a strided column (one
/// cell from each of `count` rows), so the halo engine's code is symmetric
/// across both axes without intermediate copy loops in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    count: usize,
    block_len: usize,
    stride: usize,
}

impl Layout {
    /// A single contiguous run of `len` elements.
    pub fn contiguous(len: usize) -> Self {
        Layout {
            count: 1,
            block_len: len,
            stride: len,
        }
    }

    /// `count` blocks of `block_len` elements, starts spaced by `stride`.
    pub fn vector(count: usize, block_len: usize, stride: usize) -> Self {
        Layout {
            count,
            block_len,
            stride,
        }
    }

    /// Total number of elements described by this layout.
    pub fn len(&self) -> usize {
        self.count * self.block_len
    }

    /// Whether the layout describes zero elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the described elements out of `buf`, starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the layout reaches past the end of `buf`.
    pub fn gather_from<T: Datatype>(&self, buf: &[T], offset: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for block in 0..self.count {
            let start = offset + block * self.stride;
            out.extend_from_slice(&buf[start..start + self.block_len]);
        }
        out
    }

    /// Copy `data` into `buf` at the described positions, starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the layout reaches past the end of `buf`.
    pub fn scatter_into<T: Datatype>(&self, buf: &mut [T], offset: usize, data: &[T]) -> Result<()> {
        if data.len() != self.len() {
            return Err(Error::BufferMismatch {
                expected: self.len(),
                actual: data.len(),
            });
        }
        for block in 0..self.count {
            let start = offset + block * self.stride;
            let from = block * self.block_len;
            buf[start..start + self.block_len].copy_from_slice(&data[from..from + self.block_len]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_matches_reduce_ops() {
        assert_eq!(i64::combine(ReduceOp::Sum, 3, 4), 7);
        assert_eq!(i64::combine(ReduceOp::Prod, 3, 4), 12);
        assert_eq!(i64::combine(ReduceOp::Max, 3, 4), 4);
        assert_eq!(i64::combine(ReduceOp::Min, 3, 4), 3);
        assert_eq!(u8::combine(ReduceOp::Sum, 1, 0), 1);
        assert!((f64::combine(ReduceOp::Max, 1.5, -2.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn wrap_unwrap_round_trip() {
        let payload = i64::wrap(vec![1, 2, 3]);
        assert_eq!(i64::unwrap(payload), Some(vec![1, 2, 3]));

        let payload = u8::wrap(vec![0, 1]);
        assert_eq!(i64::unwrap(payload), None);
    }

    #[test]
    fn contiguous_layout_is_flat() {
        let layout = Layout::contiguous(4);
        assert_eq!(layout.len(), 4);
        let buf = [9u8, 1, 2, 3, 4, 9];
        assert_eq!(layout.gather_from(&buf, 1), vec![1, 2, 3, 4]);
    }

    #[test]
    fn vector_layout_walks_strided_cells() {
        // One cell from each of three "rows" with stride 4.
        let layout = Layout::vector(3, 1, 4);
        assert_eq!(layout.len(), 3);
        let buf: Vec<u8> = (0..12).collect();
        assert_eq!(layout.gather_from(&buf, 2), vec![2, 6, 10]);
    }

    #[test]
    fn scatter_is_inverse_of_gather() {
        let layout = Layout::vector(3, 2, 5);
        let buf: Vec<i32> = (0..20).collect();
        let taken = layout.gather_from(&buf, 1);
        let mut other = vec![0i32; 20];
        layout.scatter_into(&mut other, 1, &taken).unwrap();
        assert_eq!(layout.gather_from(&other, 1), taken);
    }

    #[test]
    fn scatter_rejects_wrong_length() {
        let layout = Layout::contiguous(3);
        let mut buf = [0u8; 8];
        let result = layout.scatter_into(&mut buf, 0, &[1, 2]);
        assert!(matches!(
            result,
            Err(Error::BufferMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}

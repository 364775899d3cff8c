#![deny(missing_docs)]
#![deny(bare_trait_objects)]

//! Rusting Bitsets provides fixed size bitsets that are cheap to duplicate
//!
//! - Bits are stored in fixed size blocks shared between bitsets by reference counting
//! - Duplicating a bitset copies one pointer per block, blocks are copied on first write
//! - Union, intersection, difference and complement in place or into a new bitset
//! - Allocations are recorded against an injectable `Accounting`
//!
//! Bitsets are meant for workloads where sets are duplicated often (one per query, say)
//! but written to rarely and sparsely.
//!
//! ```
//! use rusting_bitsets::Bitset;
//!
//! let mut a = Bitset::new(200)?;
//! a.set(5)?;
//! a.set(150)?;
//!
//! let mut b = a.duplicate()?;
//! b.set(6)?;
//!
//! assert_eq!(a.cardinality(), 2);
//! assert_eq!(b.cardinality(), 3);
//!
//! a.invert()?;
//! assert_eq!(a.cardinality(), 198);
//! assert!(a.test(6)?);
//! # Ok::<(), rusting_bitsets::Error>(())
//! ```

mod accounting;
mod bitset;
mod block;
mod error;

#[cfg(test)]
mod test;

pub use accounting::{allocation_stats, Accounting, AllocationStats};
pub use bitset::Bitset;
pub use block::{BLOCK_CAPACITY, BLOCK_SIZE_IN_WORDS};
pub use error::{Error, ErrorKind, Result};

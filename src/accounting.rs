use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::{Error, Result};
/// A snapshot of allocation counters, from an [`Accounting`] or from [`allocation_stats`]
/// A snapshot of the allocation counters of an [`Accounting`]
///
/// Both counters are cumulative. Freeing a block or a bitset never decrements them,
/// so two snapshots taken around an operation tell how much that operation allocated.
///
/// The counted events are the slot array of every created or duplicated bitset and every
/// block allocation (materializing an empty or full block, or copying a shared block before
/// a write). The `Bitset` value itself lives wherever its owner puts it and is not counted.
/// Sharing a block is free.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationStats {
    /// Number of allocation events, one per slot array and one per block
    pub allocations: usize,

    /// Number of bytes requested by those allocations
    pub bytes: usize,
}

impl AllocationStats {
    /// Get the allocations made between `earlier` and `self`
    ///
    /// Snapshots passed in the wrong order yield zero rather than wrapping.
    pub fn since(&self, earlier: &AllocationStats) -> AllocationStats {
        AllocationStats {
            allocations: self.allocations.saturating_sub(earlier.allocations),
            bytes: self.bytes.saturating_sub(earlier.bytes),
        }
    }
}

struct Counters {
    allocations: Cell<usize>,
    bytes: Cell<usize>,
    byte_limit: Option<usize>,
}

/// Tracks allocations made on behalf of a group of bitsets
///
/// The handle is cheap to clone and all clones share the same counters. Every bitset
/// holds one; bitsets produced by `duplicate` and the result-producing set operations
/// inherit the accounting of their source.
///
/// An optional byte limit turns the accounting into a budget. Once the cumulative number
/// of bytes would exceed the limit, allocations are refused with [`Error::BudgetExceeded`].
///
/// Every charge an accounting accepts is also added to the process-wide counters reported
/// by [`allocation_stats`].
#[derive(Clone)]
pub struct Accounting {
    counters: Rc<Counters>,
}

thread_local! {
    static THREAD_ACCOUNTING: Accounting = Accounting::new();
}

/// Allocation events recorded by every accounting of the process
static PROCESS_ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

/// Bytes recorded by every accounting of the process
static PROCESS_BYTES: AtomicUsize = AtomicUsize::new(0);

impl Accounting {
    /// Create accounting with no byte limit
    pub fn new() -> Self {
        Self::from_limit(None)
    }

    /// Create accounting that refuses allocations past `limit` cumulative bytes
    pub fn with_byte_limit(limit: usize) -> Self {
        Self::from_limit(Some(limit))
    }

    fn from_limit(byte_limit: Option<usize>) -> Self {
        Self {
            counters: Rc::new(Counters {
                allocations: Cell::new(0),
                bytes: Cell::new(0),
                byte_limit,
            }),
        }
    }

    /// Get the default accounting of the current thread
    ///
    /// This is the accounting used by `Bitset::new`. Its counters only cover the current
    /// thread; use [`allocation_stats`] for the whole process.
    pub fn thread_default() -> Self {
        THREAD_ACCOUNTING.with(Clone::clone)
    }

    /// Get a snapshot of the counters
    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            allocations: self.counters.allocations.get(),
            bytes: self.counters.bytes.get(),
        }
    }

    /// The cumulative byte limit, if any
    #[inline]
    pub fn byte_limit(&self) -> Option<usize> {
        self.counters.byte_limit
    }

    /// Check whether two handles share the same counters
    #[inline]
    pub fn ptr_eq(&self, other: &Accounting) -> bool {
        Rc::ptr_eq(&self.counters, &other.counters)
    }

    /// Record `allocations` events totalling `bytes`, or refuse them if the limit would be passed
    ///
    /// Nothing is recorded when the charge is refused.
    pub(crate) fn charge(&self, allocations: usize, bytes: usize) -> Result<()> {
        let used = self.counters.bytes.get();

        if let Some(limit) = self.counters.byte_limit {
            let available = limit.saturating_sub(used);

            if bytes > available {
                debug!(requested = bytes, available = available, "allocation refused by byte limit");

                return Err(Error::BudgetExceeded {
                    requested: bytes,
                    available,
                });
            }
        }

        let counters = &self.counters;
        counters.allocations.set(counters.allocations.get().saturating_add(allocations));
        counters.bytes.set(used.saturating_add(bytes));

        PROCESS_ALLOCATIONS.fetch_add(allocations, Ordering::Relaxed);
        PROCESS_BYTES.fetch_add(bytes, Ordering::Relaxed);

        Ok(())
    }
}

impl Default for Accounting {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Accounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accounting")
            .field("stats", &self.stats())
            .field("byte_limit", &self.counters.byte_limit)
            .finish()
    }
}

/// Get the allocation counters of the whole process
///
/// Counts every allocation made since the process started, on any thread and through
/// any accounting.
pub fn allocation_stats() -> AllocationStats {
    AllocationStats {
        allocations: PROCESS_ALLOCATIONS.load(Ordering::Relaxed),
        bytes: PROCESS_BYTES.load(Ordering::Relaxed),
    }
}

use thiserror::Error;

/// Errors returned by bitset operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A bit index outside of `[0, bit_capacity)` was supplied
    #[error("bit index {index} is out of range for a bitset of {bit_capacity} bits")]
    IndexOutOfRange {
        /// The rejected index
        index: usize,
        /// The number of addressable bits
        bit_capacity: usize,
    },

    /// The operands of a binary set operation cover different universes
    #[error("bitsets of {left} and {right} bits cannot be combined")]
    CapacityMismatch {
        /// Capacity of the bitset being written or read first
        left: usize,
        /// Capacity of the other operand
        right: usize,
    },

    /// The allocation would push the accounting past its byte limit
    #[error("allocating {requested} bytes exceeds the remaining budget of {available} bytes")]
    BudgetExceeded {
        /// Bytes the operation needed
        requested: usize,
        /// Bytes left under the limit
        available: usize,
    },

    /// Storage for the block slots could not be reserved
    #[error("failed to allocate storage for {slots} block slots")]
    SlotAllocation {
        /// Number of slots requested
        slots: usize,
    },
}

/// The broad category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed an argument the operation cannot accept
    InvalidInput,

    /// Memory for the result could not be obtained
    OutOfMemory,
}

impl Error {
    /// Get the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IndexOutOfRange { .. } | Error::CapacityMismatch { .. } => ErrorKind::InvalidInput,
            Error::BudgetExceeded { .. } | Error::SlotAllocation { .. } => ErrorKind::OutOfMemory,
        }
    }
}

/// A specialized Result type for bitset operations
pub type Result<T> = std::result::Result<T, Error>;

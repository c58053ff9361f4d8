//! Error types for pool allocation

/// Result type for pool operations.
pub type AllocResult<T> = Result<T, MemoryError>;

/// Memory operation errors.
///
/// [`MemoryError::OutOfPoolMemory`] is the one recoverable variant: it is the
/// signal the migration engine relies on to detect that the active pool is
/// too small and a new one must be grown. Everything else indicates misuse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The pool's remaining capacity cannot satisfy the request.
    #[error(
        "pool out of memory: requested {requested} bytes ({align}-aligned), {remaining} remaining"
    )]
    OutOfPoolMemory {
        /// Requested allocation size in bytes.
        requested: usize,
        /// Requested alignment.
        align: usize,
        /// Unused bytes left in the pool before this request.
        remaining: usize,
    },

    /// Size/alignment combination that cannot be served.
    #[error("invalid layout: size {size}, alignment {align}")]
    InvalidLayout {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment.
        align: usize,
    },

    /// Failure reported by the operating system.
    #[error("system error: {message}")]
    System {
        /// OS-level diagnostic.
        message: String,
    },
}

impl MemoryError {
    /// Whether this error is the pool-exhaustion signal.
    pub fn is_out_of_pool_memory(&self) -> bool {
        matches!(self, Self::OutOfPoolMemory { .. })
    }
}

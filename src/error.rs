use thiserror::Error;

/// Recoverable allocation failures shared by every allocator variant.
///
/// Precondition violations (zero-sized requests, non-power-of-two alignment)
/// are not represented here: they panic at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("out of memory: requested {requested} bytes aligned to {align}, {remaining} bytes remaining")]
    OutOfMemory {
        requested: usize,
        align: usize,
        remaining: usize,
    },
}

impl AllocError {
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

//! Linear scratch allocation.
//!
//! [`Arena`] hands out zeroed, aligned ranges from one fixed region and
//! reclaims all of them at once with [`Arena::reset`]. The [`Allocator`]
//! trait lets callers hold either an arena or a heap-backed
//! [`SystemAllocator`] through [`AnyAllocator`].

#![forbid(unsafe_code)]

pub mod allocator;
pub mod arena;
pub mod config;
pub mod error;
pub mod shared;
pub mod snapshot;
pub mod system;

mod block;

pub use allocator::{Allocation, Allocator, AnyAllocator};
pub use arena::{Arena, ArenaRange, ArenaState, DEFAULT_ALIGNMENT};
pub use block::{BLOCK_ALIGN, align_forward};
pub use config::{AllocatorConfig, AllocatorKind, ConfigError};
pub use error::AllocError;
pub use shared::{ArenaPool, PooledArena, SharedArena};
pub use snapshot::{ArenaSnapshot, SnapshotError};
pub use system::{HeapAllocation, HeapKey, SystemAllocator};

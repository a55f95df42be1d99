use std::mem::{align_of, size_of};

use bytemuck::Pod;

use crate::block::{Storage, align_forward};
use crate::error::AllocError;

/// Two machine words, the alignment used when a caller does not ask for one.
pub const DEFAULT_ALIGNMENT: usize = 2 * size_of::<usize>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaState {
    /// Some capacity is left.
    Active,
    /// The cursor sits at capacity; every request fails until a reset.
    Exhausted,
}

/// Handle to a range handed out by an [`Arena`].
///
/// Ranges remember the arena generation they were issued in, so lookups made
/// after a reset resolve to `None` instead of aliasing newer allocations.
///
/// A range is only meaningful to the arena that issued it. Another arena at
/// the same generation will resolve it against its own bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaRange {
    start: usize,
    len: usize,
    generation: u64,
}

impl ArenaRange {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// `Arena` is a linear bump allocator over one fixed region.
///
/// Allocation advances `offset`; the whole region is reclaimed in O(1) by
/// [`Arena::reset`]. Individual allocations are never freed.
#[derive(Debug)]
pub struct Arena {
    storage: Storage,
    capacity: usize,
    offset: usize,
    peak: usize,
    generation: u64,
}

impl Arena {
    /// Binds a caller-supplied buffer. The buffer's current contents are kept
    /// until each range is handed out, at which point it is zero-filled.
    pub fn from_buffer(buffer: impl Into<Box<[u8]>>) -> Result<Self, AllocError> {
        let buffer = buffer.into();
        if buffer.is_empty() {
            return Err(AllocError::InvalidArgument("arena buffer must not be empty"));
        }

        let capacity = buffer.len();
        log::debug!("arena bound to caller buffer of {capacity} bytes");
        Ok(Self::from_storage(Storage::Bytes(buffer), capacity))
    }

    /// Allocates a fresh zeroed region of `capacity` bytes from the heap.
    ///
    /// The base of the region is 64-byte aligned, so the first request of any
    /// alignment up to 64 starts at offset 0.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        if capacity == 0 {
            return Err(AllocError::InvalidArgument("arena capacity must be non-zero"));
        }

        let storage = Storage::zeroed(capacity, DEFAULT_ALIGNMENT)?;
        log::debug!("arena allocated {capacity} bytes");
        Ok(Self::from_storage(storage, capacity))
    }

    fn from_storage(storage: Storage, capacity: usize) -> Self {
        Self {
            storage,
            capacity,
            offset: 0,
            peak: 0,
            generation: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current cursor in bytes from the start of the region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn used(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.offset
    }

    /// Highest cursor position reached since creation; survives resets.
    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> ArenaState {
        if self.offset == self.capacity {
            ArenaState::Exhausted
        } else {
            ArenaState::Active
        }
    }

    /// O(1) reclaim of the whole region.
    ///
    /// The buffer is left as is; ranges are zeroed when they are handed out
    /// again. Resetting an empty arena does nothing.
    pub fn reset(&mut self) {
        if self.offset == 0 {
            return;
        }

        log::trace!(
            "arena reset: reclaimed {} bytes (generation {})",
            self.offset,
            self.generation
        );
        self.offset = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Reserves `size` zeroed bytes whose address is a multiple of `align`.
    ///
    /// On failure the cursor is left untouched.
    ///
    /// # Panics
    ///
    /// If `size` is zero or `align` is not a power of two.
    pub fn reserve(&mut self, size: usize, align: usize) -> Result<ArenaRange, AllocError> {
        assert!(size > 0, "arena allocation size must be non-zero");
        assert!(
            align.is_power_of_two(),
            "arena alignment must be a power of two, got {align}"
        );

        let base = self.storage.base_addr();
        let out_of_memory = AllocError::OutOfMemory {
            requested: size,
            align,
            remaining: self.remaining(),
        };

        let start = align_forward(base + self.offset, align)
            .map(|aligned| aligned - base)
            .ok_or_else(|| out_of_memory.clone())?;
        let end = match start.checked_add(size) {
            Some(end) if end <= self.capacity => end,
            _ => {
                log::debug!("arena exhausted: {out_of_memory}");
                return Err(out_of_memory);
            }
        };

        self.storage.as_bytes_mut()[start..end].fill(0);
        self.offset = end;
        self.peak = self.peak.max(end);

        Ok(ArenaRange {
            start,
            len: size,
            generation: self.generation,
        })
    }

    /// Aligned, zero-filled byte allocation from the bump region.
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<&mut [u8], AllocError> {
        let range = self.reserve(size, align)?;
        Ok(&mut self.storage.as_bytes_mut()[range.start..range.end()])
    }

    pub fn alloc_default(&mut self, size: usize) -> Result<&mut [u8], AllocError> {
        self.alloc(size, DEFAULT_ALIGNMENT)
    }

    /// Allocates `len` zeroed values of a plain-old-data type.
    ///
    /// A byte size that overflows `usize` is reported as out of memory.
    ///
    /// # Panics
    ///
    /// If `len` is zero or `T` is zero-sized.
    pub fn alloc_slice<T: Pod>(&mut self, len: usize) -> Result<&mut [T], AllocError> {
        assert!(size_of::<T>() > 0, "cannot allocate zero-sized types from an arena");
        let size = len
            .checked_mul(size_of::<T>())
            .ok_or(AllocError::OutOfMemory {
                requested: usize::MAX,
                align: align_of::<T>(),
                remaining: self.remaining(),
            })?;
        let bytes = self.alloc(size, align_of::<T>())?;
        Ok(bytemuck::cast_slice_mut(bytes))
    }

    /// Individual frees are not supported; only [`Arena::reset`] reclaims memory.
    pub fn free(&mut self, range: ArenaRange) {
        log::trace!("arena free of {} bytes ignored", range.len);
    }

    /// Resolves a range issued by this arena since the last reset.
    pub fn get(&self, range: &ArenaRange) -> Option<&[u8]> {
        if !self.is_live(range) {
            return None;
        }
        self.storage.as_bytes().get(range.start..range.end())
    }

    pub fn get_mut(&mut self, range: &ArenaRange) -> Option<&mut [u8]> {
        if !self.is_live(range) {
            return None;
        }
        self.storage.as_bytes_mut().get_mut(range.start..range.end())
    }

    fn is_live(&self, range: &ArenaRange) -> bool {
        range.generation == self.generation && range.end() <= self.offset
    }

    /// Returns the currently used byte region.
    pub fn used_bytes(&self) -> &[u8] {
        &self.storage.as_bytes()[..self.offset]
    }

    /// Rebuilds an arena from its used bytes and cursor.
    pub(crate) fn restore(
        capacity: usize,
        used: &[u8],
        peak: usize,
        generation: u64,
    ) -> Result<Self, AllocError> {
        if used.len() > capacity {
            return Err(AllocError::InvalidArgument(
                "used bytes exceed arena capacity",
            ));
        }

        let mut arena = Self::with_capacity(capacity)?;
        arena.storage.as_bytes_mut()[..used.len()].copy_from_slice(used);
        arena.offset = used.len();
        arena.peak = peak.clamp(used.len(), capacity);
        arena.generation = generation;
        Ok(arena)
    }
}

use slotmap::{SlotMap, new_key_type};

use crate::block::{BLOCK_ALIGN, Storage, align_forward};
use crate::error::AllocError;

new_key_type! {
    pub struct HeapKey;
}

/// Handle to a block owned by a [`SystemAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapAllocation {
    key: HeapKey,
    len: usize,
}

impl HeapAllocation {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
struct HeapBlock {
    storage: Storage,
    start: usize,
    len: usize,
}

/// Heap-backed allocator with real per-allocation frees.
///
/// Every live block is tracked in a slot map, so stale or foreign handles are
/// detected rather than dereferenced.
#[derive(Debug, Default)]
pub struct SystemAllocator {
    live: SlotMap<HeapKey, HeapBlock>,
    live_bytes: usize,
}

impl SystemAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// If `size` is zero or `align` is not a power of two.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<HeapAllocation, AllocError> {
        assert!(size > 0, "heap allocation size must be non-zero");
        assert!(
            align.is_power_of_two(),
            "heap alignment must be a power of two, got {align}"
        );

        let out_of_memory = AllocError::OutOfMemory {
            requested: size,
            align,
            remaining: 0,
        };
        // Blocks already start on a BLOCK_ALIGN boundary; wider alignments need slack.
        let slack = align.saturating_sub(BLOCK_ALIGN);
        let total = size.checked_add(slack).ok_or_else(|| out_of_memory.clone())?;
        let storage = Storage::zeroed(total, align)?;

        let base = storage.base_addr();
        let start = align_forward(base, align).ok_or(out_of_memory)? - base;

        let key = self.live.insert(HeapBlock {
            storage,
            start,
            len: size,
        });
        self.live_bytes += size;
        Ok(HeapAllocation { key, len: size })
    }

    /// Releases a block. Returns `false` for handles that were already freed.
    pub fn free(&mut self, allocation: HeapAllocation) -> bool {
        match self.live.remove(allocation.key) {
            Some(block) => {
                self.live_bytes -= block.len;
                true
            }
            None => {
                log::trace!("ignoring free of stale heap allocation {:?}", allocation.key);
                false
            }
        }
    }

    pub fn get(&self, allocation: &HeapAllocation) -> Option<&[u8]> {
        let block = self.live.get(allocation.key)?;
        block.storage.as_bytes().get(block.start..block.start + block.len)
    }

    pub fn get_mut(&mut self, allocation: &HeapAllocation) -> Option<&mut [u8]> {
        let block = self.live.get_mut(allocation.key)?;
        let (start, len) = (block.start, block.len);
        block.storage.as_bytes_mut().get_mut(start..start + len)
    }

    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }
}

use bytemuck::{Pod, Zeroable};

use crate::error::AllocError;

/// Alignment guaranteed for the base of allocator-supplied storage.
pub const BLOCK_ALIGN: usize = 64;

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
pub(crate) struct Block([u8; BLOCK_ALIGN]);

/// Backing bytes for an arena or a heap allocation.
#[derive(Debug)]
pub(crate) enum Storage {
    /// Allocated here; base address is a multiple of [`BLOCK_ALIGN`].
    Blocks(Box<[Block]>),
    /// Handed over by the caller; base alignment is whatever it happens to be.
    Bytes(Box<[u8]>),
}

impl Storage {
    /// Reserves at least `len` zeroed bytes, surfacing heap exhaustion instead of aborting.
    pub(crate) fn zeroed(len: usize, align: usize) -> Result<Self, AllocError> {
        let out_of_memory = AllocError::OutOfMemory {
            requested: len,
            align,
            remaining: 0,
        };
        let blocks = len.div_ceil(BLOCK_ALIGN);
        let mut memory = Vec::new();
        memory
            .try_reserve_exact(blocks)
            .map_err(|_| out_of_memory)?;
        memory.resize(blocks, Block::zeroed());
        Ok(Self::Blocks(memory.into_boxed_slice()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Blocks(blocks) => bytemuck::cast_slice(blocks),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Blocks(blocks) => bytemuck::cast_slice_mut(blocks),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub(crate) fn base_addr(&self) -> usize {
        self.as_bytes().as_ptr() as usize
    }
}

/// Rounds `addr` up to the next multiple of `align`.
///
/// Returns `None` if the rounded address does not fit in a `usize`.
pub fn align_forward(addr: usize, align: usize) -> Option<usize> {
    assert!(
        align.is_power_of_two(),
        "alignment must be a power of two, got {align}"
    );
    let modulo = addr & (align - 1);
    if modulo == 0 {
        return Some(addr);
    }
    addr.checked_add(align - modulo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_sanity() {
        assert_eq!(align_forward(3, 4), Some(4));
        assert_eq!(align_forward(4, 4), Some(4));
        assert_eq!(align_forward(5, 4), Some(8));
        assert_eq!(align_forward(0, 16), Some(0));
        assert_eq!(align_forward(usize::MAX, 2), None);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn align_rejects_non_power_of_two() {
        let _ = align_forward(8, 12);
    }

    #[test]
    fn zeroed_storage_is_block_aligned() {
        let storage = Storage::zeroed(100, 8).unwrap();
        assert_eq!(storage.base_addr() % BLOCK_ALIGN, 0);
        assert_eq!(storage.as_bytes().len(), 128);
        assert!(storage.as_bytes().iter().all(|&byte| byte == 0));
    }
}

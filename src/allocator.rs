use crate::arena::{Arena, ArenaRange, DEFAULT_ALIGNMENT};
use crate::error::AllocError;
use crate::system::{HeapAllocation, SystemAllocator};

/// A handle produced by any [`Allocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allocation {
    Heap(HeapAllocation),
    Arena(ArenaRange),
}

impl Allocation {
    pub fn len(&self) -> usize {
        match self {
            Self::Heap(heap) => heap.len(),
            Self::Arena(range) => range.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The allocate/free capability set shared by every allocator variant.
///
/// Allocations are zero-filled. A handle from a different variant never
/// resolves and freeing it has no effect. Handles are tied to the instance
/// that issued them; passing one to another instance of the same variant is
/// not detected for arenas.
pub trait Allocator {
    fn allocate(&mut self, size: usize, align: usize) -> Result<Allocation, AllocError>;

    fn allocate_default(&mut self, size: usize) -> Result<Allocation, AllocError> {
        self.allocate(size, DEFAULT_ALIGNMENT)
    }

    fn free(&mut self, allocation: Allocation);

    fn bytes(&self, allocation: &Allocation) -> Option<&[u8]>;

    fn bytes_mut(&mut self, allocation: &Allocation) -> Option<&mut [u8]>;
}

impl Allocator for Arena {
    fn allocate(&mut self, size: usize, align: usize) -> Result<Allocation, AllocError> {
        self.reserve(size, align).map(Allocation::Arena)
    }

    fn free(&mut self, allocation: Allocation) {
        if let Allocation::Arena(range) = allocation {
            Arena::free(self, range);
        }
    }

    fn bytes(&self, allocation: &Allocation) -> Option<&[u8]> {
        match allocation {
            Allocation::Arena(range) => self.get(range),
            Allocation::Heap(_) => None,
        }
    }

    fn bytes_mut(&mut self, allocation: &Allocation) -> Option<&mut [u8]> {
        match allocation {
            Allocation::Arena(range) => self.get_mut(range),
            Allocation::Heap(_) => None,
        }
    }
}

impl Allocator for SystemAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Result<Allocation, AllocError> {
        SystemAllocator::allocate(self, size, align).map(Allocation::Heap)
    }

    fn free(&mut self, allocation: Allocation) {
        match allocation {
            Allocation::Heap(heap) => {
                SystemAllocator::free(self, heap);
            }
            Allocation::Arena(range) => {
                log::warn!("system allocator asked to free arena range {range:?}; ignoring");
            }
        }
    }

    fn bytes(&self, allocation: &Allocation) -> Option<&[u8]> {
        match allocation {
            Allocation::Heap(heap) => self.get(heap),
            Allocation::Arena(_) => None,
        }
    }

    fn bytes_mut(&mut self, allocation: &Allocation) -> Option<&mut [u8]> {
        match allocation {
            Allocation::Heap(heap) => self.get_mut(heap),
            Allocation::Arena(_) => None,
        }
    }
}

/// An allocator whose variant is fixed when it is built.
#[derive(Debug)]
pub enum AnyAllocator {
    System(SystemAllocator),
    Arena(Arena),
}

impl AnyAllocator {
    /// Reclaims everything an arena handed out. The system variant has
    /// nothing to reset, so this is a no-op there.
    pub fn reset(&mut self) {
        if let Self::Arena(arena) = self {
            arena.reset();
        }
    }

    pub fn as_arena(&self) -> Option<&Arena> {
        match self {
            Self::Arena(arena) => Some(arena),
            Self::System(_) => None,
        }
    }
}

impl From<Arena> for AnyAllocator {
    fn from(arena: Arena) -> Self {
        Self::Arena(arena)
    }
}

impl From<SystemAllocator> for AnyAllocator {
    fn from(system: SystemAllocator) -> Self {
        Self::System(system)
    }
}

impl Allocator for AnyAllocator {
    fn allocate(&mut self, size: usize, align: usize) -> Result<Allocation, AllocError> {
        match self {
            Self::System(system) => Allocator::allocate(system, size, align),
            Self::Arena(arena) => Allocator::allocate(arena, size, align),
        }
    }

    fn free(&mut self, allocation: Allocation) {
        match self {
            Self::System(system) => Allocator::free(system, allocation),
            Self::Arena(arena) => Allocator::free(arena, allocation),
        }
    }

    fn bytes(&self, allocation: &Allocation) -> Option<&[u8]> {
        match self {
            Self::System(system) => system.bytes(allocation),
            Self::Arena(arena) => arena.bytes(allocation),
        }
    }

    fn bytes_mut(&mut self, allocation: &Allocation) -> Option<&mut [u8]> {
        match self {
            Self::System(system) => system.bytes_mut(allocation),
            Self::Arena(arena) => arena.bytes_mut(allocation),
        }
    }
}

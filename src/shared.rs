use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::arena::Arena;
use crate::error::AllocError;

/// An arena behind a caller-owned lock, for callers that must share one region
/// across threads.
#[derive(Debug, Clone)]
pub struct SharedArena {
    inner: Arc<Mutex<Arena>>,
}

impl SharedArena {
    pub fn new(arena: Arena) -> Self {
        Self {
            inner: Arc::new(Mutex::new(arena)),
        }
    }

    /// Runs `f` with exclusive access to the arena.
    pub fn with<R>(&self, f: impl FnOnce(&mut Arena) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Copies `bytes` into a fresh allocation and returns its offset.
    ///
    /// An empty `bytes` is rejected as an invalid argument.
    ///
    /// # Panics
    ///
    /// If `align` is not a power of two.
    pub fn alloc_copy(&self, bytes: &[u8], align: usize) -> Result<usize, AllocError> {
        if bytes.is_empty() {
            return Err(AllocError::InvalidArgument("cannot copy an empty slice into an arena"));
        }

        self.with(|arena| {
            let range = arena.reserve(bytes.len(), align)?;
            arena
                .get_mut(&range)
                .expect("range was just reserved under the same lock")
                .copy_from_slice(bytes);
            Ok(range.start())
        })
    }
}

/// Per-task arenas: each lease owns a whole arena, so no allocation ever
/// contends on a lock.
#[derive(Debug)]
pub struct ArenaPool {
    idle: Mutex<Vec<Arena>>,
    arena_capacity: usize,
}

impl ArenaPool {
    pub fn new(arena_capacity: usize) -> Result<Self, AllocError> {
        if arena_capacity == 0 {
            return Err(AllocError::InvalidArgument("pool arena capacity must be non-zero"));
        }

        Ok(Self {
            idle: Mutex::new(Vec::new()),
            arena_capacity,
        })
    }

    pub fn arena_capacity(&self) -> usize {
        self.arena_capacity
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Leases an idle arena, creating one if none is free.
    pub fn checkout(&self) -> Result<PooledArena<'_>, AllocError> {
        let reused = self.idle.lock().pop();
        let arena = match reused {
            Some(arena) => arena,
            None => {
                log::debug!("arena pool growing by one {}-byte arena", self.arena_capacity);
                Arena::with_capacity(self.arena_capacity)?
            }
        };

        Ok(PooledArena {
            pool: self,
            arena: Some(arena),
        })
    }

    /// Maps `items` in parallel, giving each call a freshly reset arena.
    pub fn par_map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, AllocError>
    where
        T: Sync,
        R: Send,
        F: Fn(&mut Arena, &T) -> R + Sync + Send,
    {
        #[cfg(not(target_arch = "wasm32"))]
        let results: Result<Vec<R>, AllocError> = items
            .par_iter()
            .map_init(
                || self.checkout(),
                |lease, item| match lease {
                    Ok(arena) => {
                        arena.reset();
                        Ok(f(&mut **arena, item))
                    }
                    Err(err) => Err(err.clone()),
                },
            )
            .collect();
        #[cfg(target_arch = "wasm32")]
        let results: Result<Vec<R>, AllocError> = self.checkout().map(|mut arena| {
            items
                .iter()
                .map(|item| {
                    arena.reset();
                    f(&mut *arena, item)
                })
                .collect()
        });

        results
    }

    fn give_back(&self, mut arena: Arena) {
        arena.reset();
        self.idle.lock().push(arena);
    }
}

/// An arena leased from an [`ArenaPool`]; reset and returned on drop.
#[derive(Debug)]
pub struct PooledArena<'a> {
    pool: &'a ArenaPool,
    arena: Option<Arena>,
}

impl Deref for PooledArena<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        self.arena.as_ref().expect("pooled arena is present until drop")
    }
}

impl DerefMut for PooledArena<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        self.arena.as_mut().expect("pooled arena is present until drop")
    }
}

impl Drop for PooledArena<'_> {
    fn drop(&mut self) {
        if let Some(arena) = self.arena.take() {
            self.pool.give_back(arena);
        }
    }
}

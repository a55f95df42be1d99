use std::fs;
use std::path::Path;

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::Arena;
use crate::error::AllocError;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] EncodeError),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] DecodeError),

    #[error("snapshot does not describe a valid arena: {0}")]
    Alloc(#[from] AllocError),
}

/// The used byte-state of an arena, for post-mortem dumps and replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub capacity: usize,
    pub peak: usize,
    pub generation: u64,
    pub used: Vec<u8>,
}

impl ArenaSnapshot {
    pub fn capture(arena: &Arena) -> Self {
        Self {
            capacity: arena.capacity(),
            peak: arena.peak(),
            generation: arena.generation(),
            used: arena.used_bytes().to_vec(),
        }
    }

    /// Rebuilds an arena holding the captured bytes with its cursor at the
    /// end of them.
    pub fn restore(&self) -> Result<Arena, SnapshotError> {
        Ok(Arena::restore(
            self.capacity,
            &self.used,
            self.peak,
            self.generation,
        )?)
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(encode_to_vec(self, standard())?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (snapshot, _) = decode_from_slice(bytes, standard())?;
        Ok(snapshot)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.encode()?)?;
        log::debug!(
            "wrote {}-byte arena snapshot to `{}`",
            self.used.len(),
            path.display()
        );
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::decode(&fs::read(path)?)
    }
}

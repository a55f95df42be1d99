//! Process-start allocator configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::AnyAllocator;
use crate::arena::Arena;
use crate::error::AllocError;
use crate::system::SystemAllocator;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values that parse but cannot describe an allocator
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The configured allocator could not be constructed
    #[error("Allocator construction failed: {0}")]
    Build(#[from] AllocError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
    #[default]
    System,
    Arena,
}

/// Which allocator to construct and how large its arena is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    pub kind: AllocatorKind,
    /// Arena size in bytes; ignored by the system allocator.
    pub arena_capacity: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            kind: AllocatorKind::System,
            arena_capacity: 1024 * 1024,
        }
    }
}

impl AllocatorConfig {
    pub fn arena(capacity: usize) -> Self {
        Self {
            kind: AllocatorKind::Arena,
            arena_capacity: capacity,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == AllocatorKind::Arena && self.arena_capacity == 0 {
            return Err(ConfigError::Invalid(
                "arena_capacity must be non-zero for an arena allocator".to_owned(),
            ));
        }
        Ok(())
    }

    /// Builds the configured allocator. Call once at process start and pass
    /// the result to whoever needs it.
    pub fn build(&self) -> Result<AnyAllocator, ConfigError> {
        self.validate()?;
        let allocator = match self.kind {
            AllocatorKind::System => AnyAllocator::System(SystemAllocator::new()),
            AllocatorKind::Arena => AnyAllocator::Arena(Arena::with_capacity(self.arena_capacity)?),
        };
        log::info!("built {:?} allocator", self.kind);
        Ok(allocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AllocatorConfig::from_toml_str("kind = \"arena\"").unwrap();
        assert_eq!(config, AllocatorConfig::arena(1024 * 1024));

        let config = AllocatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, AllocatorConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let config = AllocatorConfig::arena(4096);
        let parsed = AllocatorConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn serialized_config_names_its_fields() {
        let text = AllocatorConfig::default().to_toml_string().unwrap();
        assert!(text.contains("kind = \"system\""));
        assert!(text.contains("arena_capacity = 1048576"));
    }

    #[test]
    fn zero_capacity_arena_is_rejected() {
        let err = AllocatorConfig::from_toml_str("kind = \"arena\"\narena_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = AllocatorConfig::from_toml_str("kind = \"slab\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builds_selected_variant() {
        let allocator = AllocatorConfig::arena(256).build().unwrap();
        assert_eq!(allocator.as_arena().map(Arena::capacity), Some(256));

        let allocator = AllocatorConfig::default().build().unwrap();
        assert!(matches!(allocator, AnyAllocator::System(_)));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("scratch_arena_{}.toml", std::process::id()));
        std::fs::write(&path, "kind = \"arena\"\narena_capacity = 512\n").unwrap();
        let config = AllocatorConfig::load_from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.unwrap(), AllocatorConfig::arena(512));
    }
}

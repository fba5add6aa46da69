//! Headless backend configuration
//!
//! Stored as RON. Missing fields fall back to their defaults so older files
//! keep loading after new settings are added.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Current configuration format version
pub const CURRENT_VERSION: u32 = 1;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
    /// Error during deserialization
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
}

/// Settings of a [`crate::HeadlessScene`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Configuration format version
    pub version: u32,
    /// `unique` flag used when a scene description entry leaves it out
    pub unique_materials: bool,
    /// Advance animated material parameters on every frame
    pub animate_materials: bool,
    /// Time step of one frame, in seconds
    pub frame_time: f32,
    /// Infix of clone names (`<name>_<suffix>_<n>`)
    pub clone_suffix: String,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            unique_materials: true,
            animate_materials: true,
            frame_time: 1.0 / 60.0,
            clone_suffix: "clone".to_string(),
        }
    }
}

impl HeadlessConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Serializes the configuration as pretty RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}

/// Loads, edits and saves a [`HeadlessConfig`] file.
pub struct ConfigManager {
    config: HeadlessConfig,
    config_path: PathBuf,
    dirty: bool,
}

impl ConfigManager {
    /// Loads the configuration at `path`, or defaults if it is missing or malformed.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let config = Self::load_from_path(&config_path).unwrap_or_default();

        Self {
            config,
            config_path,
            dirty: false,
        }
    }

    fn load_from_path(path: &Path) -> Option<HeadlessConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {:?}, using defaults", path);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, e);
                return None;
            }
        };

        match HeadlessConfig::from_ron(&content) {
            Ok(config) => {
                if config.version > CURRENT_VERSION {
                    tracing::warn!(
                        "Config version {} is newer than supported version {}",
                        config.version,
                        CURRENT_VERSION
                    );
                }
                tracing::info!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    }

    /// Get a reference to the current configuration
    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration (marks as dirty)
    pub fn config_mut(&mut self) -> &mut HeadlessConfig {
        self.dirty = true;
        &mut self.config
    }

    /// Check if the configuration has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the configuration back to its file if it changed.
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.config_path, self.config.to_ron()?)?;

        tracing::info!("Saved config to {:?}", self.config_path);
        self.dirty = false;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset_to_defaults(&mut self) {
        self.config = HeadlessConfig::default();
        self.dirty = true;
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Consumes the manager, returning the configuration.
    pub fn into_config(self) -> HeadlessConfig {
        self.config
    }
}

//! TOML configuration loading for combat tuning and weapon presets.
//!
//! Both files are optional. A missing file keeps the compiled defaults; a
//! file that fails to parse or validate is reported and ignored.
//!
//! ```toml
//! # combat.toml
//! player_hit_radius = 0.6
//! corpse_display_secs = 5.0
//! ```
//!
//! ```toml
//! # weapons.toml
//! [[weapons]]
//! name = "revolver"
//! damage = 60.0
//! cooldown = 0.9
//! mode = { type = "single" }
//! projectile = { speed = 90.0, lifespan = 2.0 }
//! ```

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use crate::resources::{CombatConfig, WeaponPreset, WeaponPresets};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
    #[error("weapon preset `{0}` is defined more than once")]
    DuplicatePreset(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Paths of the optional configuration files read at startup.
#[derive(Resource, Clone, Debug, Default)]
pub struct CombatConfigFile {
    pub config: Option<PathBuf>,
    pub presets: Option<PathBuf>,
}

impl CombatConfigFile {
    pub fn new(config: impl Into<PathBuf>, presets: impl Into<PathBuf>) -> Self {
        Self {
            config: Some(config.into()),
            presets: Some(presets.into()),
        }
    }
}

#[derive(Deserialize)]
struct PresetFile {
    weapons: Vec<WeaponPreset>,
}

impl CombatConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path)?)
    }
}

impl WeaponPresets {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: PresetFile = toml::from_str(contents)?;
        let presets = WeaponPresets {
            weapons: file.weapons,
        };
        presets.validate()?;
        Ok(presets)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path)?)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Startup system: replaces the defaults with the configured files.
pub fn load_combat_config(
    file: Option<Res<CombatConfigFile>>,
    mut config: ResMut<CombatConfig>,
    mut presets: ResMut<WeaponPresets>,
) {
    let Some(file) = file else {
        debug!("No combat config file configured; using compiled defaults");
        return;
    };

    if let Some(path) = &file.config {
        match CombatConfig::load(path) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded combat config from {}", path.display());
            }
            Err(ConfigError::Io { .. }) if !path.exists() => {
                info!("No {} found; using compiled defaults", path.display());
            }
            Err(e) => warn!("{e}; keeping default combat config"),
        }
    }

    if let Some(path) = &file.presets {
        match WeaponPresets::load(path) {
            Ok(loaded) => {
                info!("Loaded {} weapon presets from {}", loaded.weapons.len(), path.display());
                *presets = loaded;
            }
            Err(ConfigError::Io { .. }) if !path.exists() => {
                info!("No {} found; using built-in weapon presets", path.display());
            }
            Err(e) => warn!("{e}; keeping built-in weapon presets"),
        }
    }
}

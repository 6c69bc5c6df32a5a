//! SimulationConfig: все tuning параметры симуляции в одном resource
//!
//! Каждая секция: `Default` struct (значения из геймдизайна). TOML файл
//! переопределяет любое подмножество полей:
//!
//! ```toml
//! log_level = "info"
//!
//! [stamina]
//! sprint_cost = 30.0
//!
//! [monster]
//! chase_duration = 12.0
//! ```

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::LifecycleConfig;
use crate::logger::LogLevel;
use crate::monster::MonsterConfig;
use crate::player::{ClimbConfig, GroundProbeConfig, LocomotionConfig};
use crate::survival::StaminaConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct SimulationConfig {
    pub stamina: StaminaConfig,
    pub locomotion: LocomotionConfig,
    pub grounding: GroundProbeConfig,
    pub climbing: ClimbConfig,
    pub monster: MonsterConfig,
    pub lifecycle: LifecycleConfig,
    /// "debug" | "info" | "warning" | "error"
    pub log_level: Option<String>,
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Загружает файл; при ошибке: defaults + warning (симуляция не падает из-за конфига)
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                crate::log_warning(&format!("⚠️ {}, using defaults", err));
                Self::default()
            }
        }
    }

    /// Уровень логов из конфига (неизвестное значение → None + warning)
    pub fn log_level(&self) -> Option<LogLevel> {
        let raw = self.log_level.as_deref()?;
        let level = LogLevel::parse(raw);
        if level.is_none() {
            crate::log_warning(&format!("Unknown log_level '{}', keeping current", raw));
        }
        level
    }
}

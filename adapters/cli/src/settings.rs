//! Optional TOML overrides for tuning and preset tables.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use hive_defence_core::{GameConfig, Presets};
use serde::Deserialize;

/// Tuning and presets for a run. Omitted tables keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Simulation tuning, read from the `[game]` table.
    pub(crate) game: GameConfig,
    /// Difficulty, mission and insect tables, read from the `[presets]` table.
    pub(crate) presets: Presets,
}

impl Settings {
    /// Reads settings from `path`, or returns the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

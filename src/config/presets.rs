//! Operator-facing presets loaded from config.toml.
//!
//! The chat wizards offer fixed keyboards instead of free-form input: the
//! duration buttons and the sales-channel buttons both come from here. The
//! file is optional; without it the built-in defaults apply.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Preset structure representing the entire config.toml file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Presets {
    /// Subscription lengths offered by the duration keyboard, in days
    #[serde(default = "default_durations")]
    pub duration_days: Vec<i64>,
    /// Sales channels offered when creating an order
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

fn default_durations() -> Vec<i64> {
    vec![7, 30, 90, 180, 365]
}

fn default_channels() -> Vec<String> {
    ["Shopee", "Website", "Telegram"]
        .map(ToString::to_string)
        .to_vec()
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            duration_days: default_durations(),
            channels: default_channels(),
        }
    }
}

/// Loads presets from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Presets> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads presets from the default location (./config.toml), falling back to
/// the built-in defaults when the file does not exist.
pub fn load_default_config() -> Result<Presets> {
    if Path::new("config.toml").exists() {
        load_config("config.toml")
    } else {
        Ok(Presets::default())
    }
}

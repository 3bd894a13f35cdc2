//! Application configuration: spreadsheet bridge credentials from the
//! environment plus operator presets from config.toml.

/// Wizard preset loading from config.toml
pub mod presets;

use crate::errors::{Error, Result};
use presets::Presets;
use std::env;
use tracing::{info, warn};

/// Everything the process needs to start, resolved once at boot.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Web-app endpoint of the spreadsheet bridge
    pub bridge_url: String,
    /// Shared secret sent with every bridge request
    pub bridge_secret: String,
    /// Username that authenticates as OWNER even without an admin row
    pub owner_username: Option<String>,
    /// Duration and channel keyboards for the chat wizards
    pub presets: Presets,
}

/// Loads the full application configuration from the environment and the
/// optional config.toml.
///
/// # Errors
/// Returns [`Error::Config`] when `SHEET_BRIDGE_URL` or
/// `SHEET_BRIDGE_SECRET` is missing, or when config.toml exists but cannot
/// be parsed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let bridge_url = require_env("SHEET_BRIDGE_URL")?;
    let bridge_secret = require_env("SHEET_BRIDGE_SECRET")?;
    let owner_username = env::var("OWNER_USERNAME").ok().filter(|v| !v.is_empty());
    if owner_username.is_none() {
        warn!("OWNER_USERNAME not set; only listed admins can operate");
    }

    let presets = presets::load_default_config()?;
    info!(
        durations = presets.duration_days.len(),
        channels = presets.channels.len(),
        "configuration loaded"
    );

    Ok(AppConfig {
        bridge_url,
        bridge_secret,
        owner_username,
        presets,
    })
}

fn require_env(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config {
            message: format!("required environment variable {name} is not set"),
        })
}

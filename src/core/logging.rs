//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the settings store and remote provider configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs where settings live and whether the remote provider is enabled
pub fn log_settings_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Settings Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("📁 CONFIG_DIR: {}", config::CONFIG_DIR.display());
    log::info!("🔌 Control endpoint port: {}", *config::PORT);

    match (config::remote::APP_NAME.as_deref(), config::remote::API_KEY.is_some()) {
        (Some(app), true) => {
            log::info!("✅ Remote config provider enabled for app '{}'", app);
            log::info!("   API: {}", config::remote::API_URL.as_str());
        }
        (Some(_), false) => {
            log::warn!("⚠️  HEROKU_APP_NAME is set but HEROKU_API_KEY is missing");
            log::warn!("   Settings will be stored locally only");
        }
        (None, _) => {
            log::info!("ℹ️  Remote config provider not configured, settings are local only");
        }
    }
}

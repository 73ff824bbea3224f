use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Reads an environment variable, treating an empty value as unset.
pub fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Settings directory (holds settings.json and backups/)
/// Read from CONFIG_DIR environment variable
/// Default: config
pub static CONFIG_DIR: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from(env_non_empty("CONFIG_DIR").unwrap_or_else(|| "config".to_string())));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: hybridbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env_non_empty("LOG_FILE_PATH").unwrap_or_else(|| "hybridbot.log".to_string()));

/// Port of the local control endpoint (/health, /settings, /restart)
/// Read from PORT environment variable
/// Default: 3000
pub static PORT: Lazy<u16> = Lazy::new(|| {
    env_non_empty("PORT")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000)
});

/// Remote config provider configuration
pub mod remote {
    use super::env_non_empty;
    use once_cell::sync::Lazy;

    /// Application identifier on the remote platform
    pub static APP_NAME: Lazy<Option<String>> = Lazy::new(|| env_non_empty("HEROKU_APP_NAME"));

    /// API credential for the remote platform
    pub static API_KEY: Lazy<Option<String>> = Lazy::new(|| env_non_empty("HEROKU_API_KEY"));

    /// Base URL of the platform API
    pub static API_URL: Lazy<String> =
        Lazy::new(|| env_non_empty("HEROKU_API_URL").unwrap_or_else(|| "https://api.heroku.com".to_string()));
}

/// Third-party download API used by the `download` command
pub mod download_api {
    use super::env_non_empty;
    use once_cell::sync::Lazy;

    /// Base URL, one path segment per platform endpoint is appended
    /// Read from DOWNLOAD_API_URL environment variable
    pub static BASE_URL: Lazy<String> = Lazy::new(|| {
        env_non_empty("DOWNLOAD_API_URL").unwrap_or_else(|| "https://api.giftedtech.co.ke/api/download".to_string())
    });

    /// API key sent as the `apikey` query parameter
    /// Read from DOWNLOAD_API_KEY environment variable
    pub static API_KEY: Lazy<Option<String>> = Lazy::new(|| env_non_empty("DOWNLOAD_API_KEY"));
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for remote config provider calls (in seconds)
    pub const REMOTE_TIMEOUT_SECS: u64 = 10;

    /// Timeout for third-party download API calls (in seconds)
    pub const DOWNLOAD_API_TIMEOUT_SECS: u64 = 15;

    /// Timeout for the local restart signal (in seconds)
    pub const LOCAL_SIGNAL_TIMEOUT_SECS: u64 = 5;

    pub fn remote_timeout() -> Duration {
        Duration::from_secs(REMOTE_TIMEOUT_SECS)
    }

    pub fn download_api_timeout() -> Duration {
        Duration::from_secs(DOWNLOAD_API_TIMEOUT_SECS)
    }

    pub fn local_signal_timeout() -> Duration {
        Duration::from_secs(LOCAL_SIGNAL_TIMEOUT_SECS)
    }
}

/// Restart fallback chain timing
pub mod restart {
    use super::Duration;

    /// Delay before the soft (local endpoint) restart attempt
    pub const LOCAL_DELAY_MS: u64 = 500;

    /// Delay before each fallback step (remote dyno restart, process exit)
    pub const FALLBACK_DELAY_MS: u64 = 1000;

    pub fn local_delay() -> Duration {
        Duration::from_millis(LOCAL_DELAY_MS)
    }

    pub fn fallback_delay() -> Duration {
        Duration::from_millis(FALLBACK_DELAY_MS)
    }
}

/// Snapshot backup configuration
pub mod backup {
    /// Number of backups kept in the backups directory
    pub const MAX_BACKUPS: usize = 7;

    /// Filename prefix of every backup
    pub const FILE_PREFIX: &str = "config_backup_";
}

/// Media extractor limits
pub mod extractor {
    /// Maximum nesting depth visited in a download API response
    pub const MAX_DEPTH: usize = 64;
}

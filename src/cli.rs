use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hybridbot")]
#[command(author, version, about = "Media-URL extraction and hybrid settings store for download bots", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the local control endpoint (default)
    Serve,

    /// Print one setting
    Get {
        key: String,

        /// Printed when the key is not set
        #[arg(long, default_value = "")]
        fallback: String,
    },

    /// Change one setting (persisted, then mirrored to the remote provider)
    Set { key: String, value: String },

    /// Print all settings as JSON
    List,

    /// Pull changed values from the remote provider
    Sync,

    /// Restart the bot (local signal, then platform restart, then exit)
    Restart,

    /// List settings backups, newest first
    Backups,

    /// Restore settings from a backup file
    Restore { backup: PathBuf },

    /// Resolve a social-media link through the download API and list the media
    Download {
        /// Link to a post on a supported platform
        url: String,
    },

    /// Extract media URLs from a saved download API response
    Extract {
        /// JSON file with the API response
        file: PathBuf,

        /// Return only the single best download link
        #[arg(long)]
        single: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

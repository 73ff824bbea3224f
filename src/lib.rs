//! Hybridbot - media-URL extraction and hybrid settings storage for chat bots
//!
//! This library provides the reusable core of a download bot: deciding which
//! links in a third-party API response are playable media, and keeping the
//! bot's behavior flags in a cached, durable, optionally remote-mirrored store.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, and the local control endpoint
//! - `download`: Media extraction, platform detection, download API client
//! - `storage`: Settings snapshot, backups, remote provider, settings store

pub mod cli;
pub mod core;
pub mod download;
pub mod storage;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use download::{extract_download_url, extract_media, ExtractionResult, MediaKind, Platform};
pub use storage::{SettingKey, SettingsStore};

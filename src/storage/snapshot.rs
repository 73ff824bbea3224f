//! On-disk settings document and the recognized option keys.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Schema version written into new snapshots
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Signature constant stamped into every snapshot's metadata
pub const SECURITY_SIGNATURE: &str = ".dev";

/// Flat key → value settings map, sorted for stable file output.
pub type SettingsMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub version: String,
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub session_id: String,
    pub security: SecurityInfo,
}

impl SnapshotMetadata {
    pub fn new(session_id: &str) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            created: now_iso(),
            last_updated: None,
            session_id: session_id.to_string(),
            security: SecurityInfo {
                signature: SECURITY_SIGNATURE.to_string(),
            },
        }
    }
}

/// The full persisted settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    #[serde(default)]
    pub settings: SettingsMap,
}

impl Snapshot {
    /// First-run snapshot: every recognized key with its override or default.
    pub fn with_defaults(session_id: &str, overrides: &HashMap<String, String>) -> Self {
        let settings = SettingKey::iter()
            .map(|key| {
                let value = overrides
                    .get(key.name())
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .unwrap_or_else(|| key.default_value().to_string());
                (key.name().to_string(), value)
            })
            .collect();
        Self {
            metadata: SnapshotMetadata::new(session_id),
            settings,
        }
    }
}

/// Option keys recognized at first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SettingKey {
    AudioChatbot,
    AutoBio,
    AutoDownloadStatus,
    AutoReact,
    AutoReactStatus,
    AutoRead,
    AutoReadStatus,
    Chatbot,
    PublicMode,
    StartingBotMessage,
    Presence,
    AntideleteRecoverConvention,
    AntideleteSentInbox,
    GoodbyeMessage,
    AutoRejectCall,
    WelcomeMessage,
    #[strum(serialize = "GROUPANTILINK")]
    GroupAntilink,
    AutoReplyStatus,
}

impl SettingKey {
    /// Wire name, e.g. `AUTO_READ_STATUS`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn default_value(self) -> &'static str {
        match self {
            SettingKey::AutoBio
            | SettingKey::AutoReactStatus
            | SettingKey::AutoRead
            | SettingKey::AutoReadStatus
            | SettingKey::PublicMode
            | SettingKey::StartingBotMessage
            | SettingKey::AntideleteSentInbox => "yes",
            SettingKey::Presence => "",
            _ => "no",
        }
    }

    /// Reads first-run overrides for every recognized key from the environment.
    pub fn overrides_from_env() -> HashMap<String, String> {
        SettingKey::iter()
            .filter_map(|key| crate::core::config::env_non_empty(key.name()).map(|v| (key.name().to_string(), v)))
            .collect()
    }
}

/// Current UTC time as ISO-8601 with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `session_<unix-millis>_<9 random chars>`, regenerated each process start.
pub fn generate_session_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}

//! Settings storage: snapshot file, backups, remote mirror and the store itself.

pub mod persistence;
pub mod remote;
pub mod restart;
pub mod settings;
pub mod snapshot;

pub use persistence::{JsonFilePersistence, LocalPersistence};
pub use remote::{HerokuConfigProvider, RemoteConfigProvider};
pub use restart::{RestartCoordinator, RestartMethod};
pub use settings::SettingsStore;
pub use snapshot::{SettingKey, SettingsMap, Snapshot};

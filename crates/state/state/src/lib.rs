pub mod connection;
pub mod error;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod testing;

pub use connection::{Connection, ConnectionStatus};
pub use error::{SnapshotError, StoreError};
pub use settings::{
    CallIntelligenceSettings, CommunicationSettings, ConnectionSettings, CrmSettings,
    DocumentSettings, SettingsKind,
};
pub use snapshot::{DEFAULT_STORAGE_KEY, SNAPSHOT_VERSION, SnapshotBackend, StoreSnapshot};
pub use store::{ConnectMode, ConnectionStore};

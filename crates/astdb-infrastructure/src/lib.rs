//! Adapters that have no business logic of their own: the `.astdb/` file
//! layout, watch-state persistence, snapshot archives, layered config
//! loading and logging setup.

pub mod config;
pub mod layout;
pub mod logging;
pub mod snapshot;
pub mod watch_state;

pub use config::{load_config, AstdbConfig, NodeEnv, QueryServerConfig, TransportType};
pub use layout::{atomic_write_file, ensure_gitignore_entry, AstdbLayout, WorkspaceLock, ASTDB_DIR};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use snapshot::{sort_and_filter_snapshots, HttpRemoteSnapshotStorage, SnapshotSortKey, SortDirection, TarSnapshotEngine};
pub use watch_state::{JsonWatchStateManager, WatchConfig};

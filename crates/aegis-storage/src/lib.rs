//! Local-first persistence for aegis: conversation sessions, Captain's-Log
//! reflections, and host metrics history. No external database collaborator
//! is required for the core to run; these stores read and write plain JSON
//! under a single root directory (`$AEGIS_DIR`, default `~/.aegis`).

pub mod error;
pub mod local_store;
pub mod metrics;
pub mod paths;
pub mod reflection;
pub mod session;

pub use error::{Result, StorageError};
pub use local_store::LocalStore;
pub use metrics::MetricsHistoryStore;
pub use paths::{ensure_aegis_dir, resolve_aegis_dir};
pub use reflection::ReflectionStore;
pub use session::LocalSessionStore;

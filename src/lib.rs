//! TrackPulse analytics server library.
//!
//! Exposes the internal modules for testing and potential reuse.

pub mod analytics;
pub mod music_store;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use analytics::AnalyticsStore;
pub use music_store::{MusicStore, SqliteMusicStore};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserManager, UserRole, UserStore};

pub mod core;
pub mod engine;
pub mod extract;
pub mod normalize;
pub mod persistence;
pub mod scraping;

// --- Primary exports ---
pub use crate::core::types::*;
pub use crate::core::{ScoutConfig, ScoutError, ScoutResult};
pub use engine::ScoutEngine;
pub use persistence::{PersistenceOrchestrator, SnapshotStore, SqliteStore};
pub use scraping::{ScoutSession, SessionContext};

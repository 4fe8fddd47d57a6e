//! Tutor Server Library
//!
//! Music-theory tutoring backend: a pure theory engine (scales, intervals,
//! enharmonic normalization, answer checking) plus per-user progress
//! tracking over SQLite. Exposed as a library for the end-to-end tests.

pub mod config;
pub mod progress;
pub mod server;
pub mod sqlite_persistence;
pub mod theory;
pub mod user;

// Re-export commonly used types for convenience
pub use progress::{SqliteTrainingStore, TrainingStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserStore};

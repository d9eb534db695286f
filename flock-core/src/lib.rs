//! Flock Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other Flock crates:
//! - Application configuration (database, messaging provider, schedule)
//! - The error taxonomy shared by the store, query layer, and job
//! - Structured logging with tracing
//! - Platform directory resolution
//! - Common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{FlockError, FlockResult};
pub use logging::init_logging;
pub use platform::Platform;

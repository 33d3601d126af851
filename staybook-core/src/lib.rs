//! Staybook Core - shared foundation for the Staybook crates
//!
//! Error handling, logging, configuration and the role primitives every
//! access decision is built on.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;

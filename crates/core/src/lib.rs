//! PermToggle Core - shared types
//! 
//! This crate provides configuration, error handling and the event bus
//! shared by the permission toggle crates.

pub mod config;
pub mod events;
pub mod error;

pub use config::{AppConfig, LoggingConfig, ToggleConfig};
pub use events::{Event, EventBus, EventSubscription};
pub use error::{PermToggleError, Result};

/// PermToggle version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "PermToggle";

//! PermToggle - permission group toggle reconciliation
//! 
//! Models the switch logic of an Android app permissions screen: which
//! grants and revokes a switch change performs, when the user must confirm,
//! and how the rest of the screen stays consistent afterwards.
//! 
//! ## Architecture
//! 
//! PermToggle is organized into specialized crates:
//! 
//! - `permtoggle-core`: configuration, errors and the event bus
//! - `permtoggle-permissions`: permission model, catalog and grant backend
//!   contracts, toggle controller and screen row model

#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use permtoggle_core as core;
pub use permtoggle_permissions as permissions;

/// Prelude module for convenient imports
pub mod prelude {
    pub use permtoggle_core::config::{AppConfig, ToggleConfig};
    pub use permtoggle_permissions::{
        AppPermissionsScreen, InMemoryBackend, InMemoryCatalog, PermissionToggleController,
        TargetState, ToggleRequest, ToggleSession, TracingAuditLogger,
    };
}

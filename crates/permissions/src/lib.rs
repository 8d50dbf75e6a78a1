//! PermToggle Permissions
//! 
//! Permission group model and the toggle reconciliation behind an app
//! permissions screen: which grant or revoke a switch change performs, when
//! the user has to confirm it first, and which controls need refreshing
//! afterwards.

pub mod model;
pub mod catalog;
pub mod backend;
pub mod audit;
pub mod toggled;
pub mod summary;
pub mod session;
pub mod controller;
pub mod screen;

#[cfg(test)]
mod fixtures;

pub use model::{GrantState, Permission, PermissionGroup, ProtectionLevel};
pub use catalog::{CatalogSnapshot, InMemoryCatalog, PermissionGroupCatalog};
pub use backend::{BackendError, GrantBackend, InMemoryBackend, PermissionFilter};
pub use audit::{AuditLogger, MemoryAuditLogger, TracingAuditLogger};
pub use toggled::ToggledGroupsLog;
pub use summary::RevocationSummary;
pub use session::{PendingConfirmation, ToggleSession};
pub use controller::{
    AppliedResult, ApplyAction, ConfirmationReason, ControlState, GroupState,
    PermissionToggleController, RejectReason, TargetState, ToggleOutcome, ToggleRequest,
    ToggleResponse,
};
pub use screen::{AppPermissionsScreen, Navigation, Row, RowKind, RowSummary, SwitchResponse};

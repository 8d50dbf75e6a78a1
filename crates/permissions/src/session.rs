//! Toggle Session
//!
//! State scoped to one app permissions screen: whether the user already
//! accepted the legacy-app revoke warning, the toggled groups log and the
//! confirmation currently waiting for an answer. Each screen (or window)
//! owns its own session.

use uuid::Uuid;

use crate::controller::{ApplyAction, ConfirmationReason};
use crate::toggled::ToggledGroupsLog;

/// Toggle waiting for the user to confirm or cancel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub reason: ConfirmationReason,
    pub action: ApplyAction,
}

#[derive(Debug, Clone)]
pub struct ToggleSession {
    id: Uuid,
    app: String,
    pub(crate) has_confirmed_revoke: bool,
    pub(crate) toggled: ToggledGroupsLog,
    pub(crate) pending: Option<PendingConfirmation>,
}

impl ToggleSession {
    /// Open a session for `app`
    pub fn new(app: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            app: app.to_string(),
            has_confirmed_revoke: false,
            toggled: ToggledGroupsLog::new(),
            pending: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Package name of the app being configured
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Set once the legacy-app revoke warning was accepted; never reset
    pub fn has_confirmed_revoke(&self) -> bool {
        self.has_confirmed_revoke
    }

    pub fn toggled(&self) -> &ToggledGroupsLog {
        &self.toggled
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }
}

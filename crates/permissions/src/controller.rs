//! Permission Toggle Controller
//!
//! Maps a switch change on the app permissions screen to a grant or revoke,
//! decides when the user must confirm first, and recomputes the state of
//! every control affected by an executed change.
//!
//! The pipeline is:
//! 1. [`PermissionToggleController::decide`] (pure) turns a [`ToggleRequest`]
//!    into a [`ToggleOutcome`].
//! 2. `Apply` outcomes run through [`PermissionToggleController::apply_confirmed`].
//! 3. `RequireConfirmation` suspends the session until
//!    [`PermissionToggleController::confirm`] or
//!    [`PermissionToggleController::cancel`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use permtoggle_core::{Event, EventBus, PermToggleError, Result, ToggleConfig};

use crate::audit::AuditLogger;
use crate::backend::{BackendError, GrantBackend, PermissionFilter};
use crate::catalog::PermissionGroupCatalog;
use crate::model::{GrantState, PermissionGroup, ProtectionLevel};
use crate::session::{PendingConfirmation, ToggleSession};
use crate::summary::RevocationSummary;

/// Requested switch position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    Granted,
    Revoked,
}

impl TargetState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            TargetState::Granted
        } else {
            TargetState::Revoked
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, TargetState::Granted)
    }
}

/// A switch change on a group row or a single permission row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleRequest {
    Group { group: String, state: TargetState },
    Permission { permission: String, state: TargetState },
}

impl ToggleRequest {
    pub fn group(group: &str, state: TargetState) -> Self {
        ToggleRequest::Group { group: group.to_string(), state }
    }

    pub fn permission(permission: &str, state: TargetState) -> Self {
        ToggleRequest::Permission { permission: permission.to_string(), state }
    }

    /// Key of the control that issued the request
    pub fn key(&self) -> &str {
        match self {
            ToggleRequest::Group { group, .. } => group,
            ToggleRequest::Permission { permission, .. } => permission,
        }
    }

    pub fn state(&self) -> TargetState {
        match self {
            ToggleRequest::Group { state, .. } | ToggleRequest::Permission { state, .. } => *state,
        }
    }
}

/// Fully resolved grant or revoke, ready for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyAction {
    /// Group the backend call targets
    pub group: String,
    pub filter: PermissionFilter,
    pub state: TargetState,
    /// Key of the originating control
    pub control: String,
}

impl ApplyAction {
    fn is_group_control(&self) -> bool {
        self.control == self.group
    }
}

/// Why a revoke needs explicit confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationReason {
    /// The group holds permissions the platform granted by default
    GrantedByDefault,
    /// The app predates runtime permissions and may break
    LegacyApp,
}

impl fmt::Display for ConfirmationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationReason::GrantedByDefault => write!(f, "granted by default"),
            ConfirmationReason::LegacyApp => write!(f, "legacy app"),
        }
    }
}

/// Why a toggle is not executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The group or permission is not in the catalog
    NotFound(String),
    /// The group is fixed by device policy
    PolicyFixed,
    /// The caller must show the location settings dialog instead
    RequiresLocationSettingsDialog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Apply(ApplyAction),
    RequireConfirmation {
        reason: ConfirmationReason,
        on_confirm: ApplyAction,
    },
    Rejected(RejectReason),
}

/// Displayed checked state of one control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub key: String,
    pub checked: bool,
}

/// Derived state of one group after a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupState {
    pub group: String,
    pub state: GrantState,
    /// Present for individually controlled groups
    pub summary: Option<RevocationSummary>,
}

impl GroupState {
    fn of(group: &PermissionGroup) -> Self {
        Self {
            group: group.name.clone(),
            state: group.grant_state(),
            summary: group
                .individually_controlled
                .then(|| RevocationSummary::for_group(group)),
        }
    }
}

/// Result of running an [`ApplyAction`] through the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedResult {
    Applied {
        /// Target group first, then every other group touched by the rescan
        groups: Vec<GroupState>,
        /// Individual permission controls to refresh
        permissions: Vec<ControlState>,
    },
    Failed {
        reason: BackendError,
        /// Pre-toggle state of the originating control
        restore: ControlState,
    },
}

impl AppliedResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, AppliedResult::Applied { .. })
    }

    pub fn group_state(&self, group: &str) -> Option<&GroupState> {
        match self {
            AppliedResult::Applied { groups, .. } => groups.iter().find(|g| g.group == group),
            AppliedResult::Failed { .. } => None,
        }
    }
}

/// What the toggle pipeline did with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleResponse {
    Executed(AppliedResult),
    AwaitingConfirmation(ConfirmationReason),
    Rejected(RejectReason),
}

pub struct PermissionToggleController {
    config: ToggleConfig,
    catalog: Arc<dyn PermissionGroupCatalog>,
    backend: Arc<dyn GrantBackend>,
    group_locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
    events: Option<Arc<EventBus>>,
}

impl PermissionToggleController {
    pub fn new(
        config: ToggleConfig,
        catalog: Arc<dyn PermissionGroupCatalog>,
        backend: Arc<dyn GrantBackend>,
    ) -> Self {
        Self {
            config,
            catalog,
            backend,
            group_locks: Mutex::new(HashMap::new()),
            events: None,
        }
    }

    /// Publish session events on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &ToggleConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn PermissionGroupCatalog> {
        &self.catalog
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }

    /// Open a toggle session for `app`
    pub fn start_session(&self, app: &str) -> ToggleSession {
        let session = ToggleSession::new(app);
        debug!("Toggle session {} started for {}", session.id(), app);
        self.emit(Event::SessionStarted { app: app.to_string() });
        session
    }

    /// Decide what a request does, without side effects
    pub fn decide(&self, session: &ToggleSession, request: &ToggleRequest) -> ToggleOutcome {
        let app = session.app();
        let (group, filter) = match request {
            ToggleRequest::Group { group, .. } => {
                (self.catalog.group(app, group), PermissionFilter::All)
            }
            ToggleRequest::Permission { permission, .. } => (
                self.catalog.find_group(app, permission),
                PermissionFilter::single(permission),
            ),
        };

        let Some(group) = group else {
            debug!("Toggle of {} rejected: not in catalog", request.key());
            return ToggleOutcome::Rejected(RejectReason::NotFound(request.key().to_string()));
        };

        if group.policy_fixed {
            debug!("Toggle of {} rejected: {} is fixed by policy", request.key(), group.name);
            return ToggleOutcome::Rejected(RejectReason::PolicyFixed);
        }

        if self.config.is_location_group_and_provider(&group.name, app) {
            return ToggleOutcome::Rejected(RejectReason::RequiresLocationSettingsDialog);
        }

        let action = ApplyAction {
            group: group.name.clone(),
            filter,
            state: request.state(),
            control: request.key().to_string(),
        };

        let state = action.state;
        let outcome = match state {
            TargetState::Granted => ToggleOutcome::Apply(action),
            TargetState::Revoked if group.has_granted_by_default_permission => {
                ToggleOutcome::RequireConfirmation {
                    reason: ConfirmationReason::GrantedByDefault,
                    on_confirm: action,
                }
            }
            TargetState::Revoked
                if !group.supports_runtime_permissions && !session.has_confirmed_revoke() =>
            {
                ToggleOutcome::RequireConfirmation {
                    reason: ConfirmationReason::LegacyApp,
                    on_confirm: action,
                }
            }
            TargetState::Revoked => ToggleOutcome::Apply(action),
        };

        debug!("Toggle of {} decided: {:?}", request.key(), outcome);
        outcome
    }

    /// Run a request through the pipeline.
    ///
    /// Fails with [`PermToggleError::InvalidState`] while a confirmation is
    /// pending.
    pub fn toggle(
        &self,
        session: &mut ToggleSession,
        request: &ToggleRequest,
    ) -> Result<ToggleResponse> {
        if let Some(pending) = session.pending() {
            return Err(PermToggleError::InvalidState(format!(
                "confirmation pending for {}",
                pending.action.control
            )));
        }

        match self.decide(session, request) {
            ToggleOutcome::Apply(action) => {
                Ok(ToggleResponse::Executed(self.apply_confirmed(session, &action)))
            }
            ToggleOutcome::RequireConfirmation { reason, on_confirm } => {
                self.emit(Event::ConfirmationRequested {
                    app: session.app().to_string(),
                    group: on_confirm.group.clone(),
                    reason: reason.to_string(),
                });
                session.pending = Some(PendingConfirmation { reason, action: on_confirm });
                Ok(ToggleResponse::AwaitingConfirmation(reason))
            }
            ToggleOutcome::Rejected(reason) => {
                warn!("Toggle of {} for {} rejected: {:?}", request.key(), session.app(), reason);
                Ok(ToggleResponse::Rejected(reason))
            }
        }
    }

    /// Accept the pending confirmation and execute it
    pub fn confirm(&self, session: &mut ToggleSession) -> Result<AppliedResult> {
        let pending = session
            .pending
            .take()
            .ok_or_else(|| PermToggleError::InvalidState("no confirmation pending".into()))?;

        if pending.reason == ConfirmationReason::LegacyApp {
            session.has_confirmed_revoke = true;
        }

        Ok(self.apply_confirmed(session, &pending.action))
    }

    /// Dismiss the pending confirmation; returns the state the originating
    /// control must show again. The backend is not called.
    pub fn cancel(&self, session: &mut ToggleSession) -> Result<ControlState> {
        let pending = session
            .pending
            .take()
            .ok_or_else(|| PermToggleError::InvalidState("no confirmation pending".into()))?;

        self.emit(Event::ConfirmationCancelled {
            app: session.app().to_string(),
            group: pending.action.group.clone(),
        });
        Ok(self.control_state(session.app(), &pending.action))
    }

    /// Execute `action` through the grant backend and recompute every
    /// affected group. Changes to the same group are serialized across
    /// sessions.
    pub fn apply_confirmed(
        &self,
        session: &mut ToggleSession,
        action: &ApplyAction,
    ) -> AppliedResult {
        let app = session.app().to_string();
        let lock = self.group_lock(&app, &action.group);
        let _guard = lock.lock();

        let result = match action.state {
            TargetState::Granted => self.backend.grant(&app, &action.group, &action.filter),
            TargetState::Revoked => self.backend.revoke(&app, &action.group, &action.filter),
        };

        if let Err(reason) = result {
            warn!("Failed to change {} ({}) for {}: {}", action.group, action.filter, app, reason);
            self.emit(Event::ToggleFailed {
                app: app.clone(),
                group: action.group.clone(),
                message: reason.to_string(),
            });
            return AppliedResult::Failed {
                reason,
                restore: self.control_state(&app, action),
            };
        }

        session.toggled.record(&action.group);
        info!(
            "{} {} ({}) for {}",
            if action.state.is_granted() { "Granted" } else { "Revoked" },
            action.group,
            action.filter,
            app
        );
        self.emit(Event::PermissionToggled {
            app: app.clone(),
            group: action.group.clone(),
            granted: action.state.is_granted(),
        });

        self.refresh_affected(&app, action)
    }

    /// Close the session: drop any pending prompt and flush the toggled
    /// groups log to `logger`.
    pub fn end_session(&self, mut session: ToggleSession, logger: &dyn AuditLogger) -> Vec<String> {
        if let Some(pending) = session.pending.take() {
            debug!("Dropping pending confirmation for {}", pending.action.control);
        }

        let toggled = session.toggled.take();
        logger.log_toggled(session.app(), &toggled);
        self.emit(Event::SessionEnded {
            app: session.app().to_string(),
            toggled: toggled.clone(),
        });
        toggled
    }

    fn group_lock(&self, app: &str, group: &str) -> Arc<Mutex<()>> {
        self.group_locks
            .lock()
            .entry((app.to_string(), group.to_string()))
            .or_default()
            .clone()
    }

    /// Current displayed state of the control behind `action`
    fn control_state(&self, app: &str, action: &ApplyAction) -> ControlState {
        let checked = self
            .catalog
            .group(app, &action.group)
            .map(|group| {
                if action.is_group_control() {
                    group.grant_state().is_checked()
                } else {
                    group.are_granted(&[action.control.as_str()])
                }
            })
            .unwrap_or(false);

        ControlState {
            key: action.control.clone(),
            checked,
        }
    }

    /// Whether strict per-permission rows exist for `group`
    pub fn has_permission_rows(&self, group: &PermissionGroup) -> bool {
        self.config.strict_mode
            && group.declaring_package_is_platform
            && group.name != self.config.storage_group
    }

    /// Recompute the target group and, for groups with per-permission rows,
    /// each member permission's owning group.
    fn refresh_affected(&self, app: &str, action: &ApplyAction) -> AppliedResult {
        let mut groups = Vec::new();
        let mut permissions: Vec<ControlState> = Vec::new();

        let Some(target) = self.catalog.group(app, &action.group) else {
            return AppliedResult::Applied { groups, permissions };
        };
        groups.push(GroupState::of(&target));

        if !action.is_group_control() {
            permissions.push(ControlState {
                key: action.control.clone(),
                checked: target.are_granted(&[action.control.as_str()]),
            });
        }

        if self.has_permission_rows(&target) {
            for permission in &target.permissions {
                if permission.protection_level == ProtectionLevel::Normal {
                    continue;
                }
                let Some(owner) = self.catalog.find_group(app, &permission.name) else {
                    continue;
                };

                if !groups.iter().any(|g| g.group == owner.name) {
                    groups.push(GroupState::of(&owner));
                }
                if !permissions.iter().any(|p| p.key == permission.name) {
                    permissions.push(ControlState {
                        key: permission.name.clone(),
                        checked: owner.are_granted(&[permission.name.as_str()]),
                    });
                }
            }
        }

        AppliedResult::Applied { groups, permissions }
    }
}

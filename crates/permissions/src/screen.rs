//! App Permissions Screen
//!
//! Row model of the screen listing an app's permission groups. Platform
//! groups go on the main list, groups declared by other packages on the
//! additional permissions list. Rows bind two independent handlers: a click
//! handler that only navigates and a switch handler that runs the toggle
//! pipeline.

use std::fmt;

use tracing::debug;

use permtoggle_core::Result;

use crate::catalog::PermissionGroupCatalog;
use crate::controller::{
    AppliedResult, ControlState, PermissionToggleController, TargetState, ToggleRequest,
    ToggleResponse,
};
use crate::model::{PermissionGroup, ProtectionLevel};
use crate::session::ToggleSession;
use crate::summary::RevocationSummary;

/// Key of the entry row leading to the additional permissions list
pub const ADDITIONAL_PERMISSIONS_KEY: &str = "additional_permissions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Group,
    /// Single permission row, only present in strict mode
    Permission { group: String },
    AdditionalPermissions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSummary {
    DisabledByAdmin(String),
    EnforcedByPolicy,
    Revocation(RevocationSummary),
    MoreGroups(usize),
}

impl fmt::Display for RowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSummary::DisabledByAdmin(admin) => write!(f, "disabled by admin ({})", admin),
            RowSummary::EnforcedByPolicy => write!(f, "enforced by policy"),
            RowSummary::Revocation(summary) => write!(f, "{}", summary),
            RowSummary::MoreGroups(count) => write!(f, "{} more", count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub title: String,
    pub kind: RowKind,
    pub checked: bool,
    pub enabled: bool,
    pub summary: Option<RowSummary>,
    /// Clicking the row opens the per-permission detail view
    pub opens_details: bool,
}

impl Row {
    fn for_group(group: &PermissionGroup) -> Self {
        let summary = if group.policy_fixed {
            Some(match &group.enforcing_admin {
                Some(admin) => RowSummary::DisabledByAdmin(admin.clone()),
                None => RowSummary::EnforcedByPolicy,
            })
        } else if group.individually_controlled {
            Some(RowSummary::Revocation(RevocationSummary::for_group(group)))
        } else {
            None
        };

        Self {
            key: group.name.clone(),
            title: group.label.clone(),
            kind: RowKind::Group,
            checked: group.grant_state().is_checked(),
            enabled: !group.policy_fixed,
            summary,
            opens_details: group.individually_controlled,
        }
    }
}

/// Where a row click leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Every permission of the app, optionally filtered to one group
    AllPermissions { group: Option<String> },
    AdditionalPermissions,
}

/// What a switch change did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchResponse {
    /// The row is disabled by policy; nothing happened
    Disabled,
    Toggled(ToggleResponse),
}

#[derive(Debug, Clone)]
pub struct AppPermissionsScreen {
    app: String,
    rows: Vec<Row>,
    additional: Vec<Row>,
}

impl AppPermissionsScreen {
    /// Build the rows for `app` from the controller's catalog
    pub fn build(controller: &PermissionToggleController, app: &str) -> Self {
        let catalog = controller.catalog();
        let mut rows: Vec<Row> = Vec::new();
        let mut additional = Vec::new();

        for group in catalog.list_groups(app) {
            if !group.is_user_facing() {
                continue;
            }

            let row = Row::for_group(&group);
            if group.declaring_package_is_platform {
                rows.push(row);
            } else {
                additional.push(row);
            }

            if !controller.has_permission_rows(&group) {
                continue;
            }

            for permission in &group.permissions {
                if permission.protection_level != ProtectionLevel::Dangerous
                    || rows.iter().any(|r| r.key == permission.name)
                {
                    continue;
                }

                let owner = catalog
                    .find_group(app, &permission.name)
                    .unwrap_or_else(|| group.clone());
                rows.push(Row {
                    key: permission.name.clone(),
                    title: permission.short_name().to_string(),
                    kind: RowKind::Permission { group: owner.name.clone() },
                    checked: owner.are_granted(&[permission.name.as_str()]),
                    enabled: true,
                    summary: None,
                    opens_details: false,
                });
            }
        }

        if !additional.is_empty() {
            rows.push(Row {
                key: ADDITIONAL_PERMISSIONS_KEY.to_string(),
                title: "Additional permissions".to_string(),
                kind: RowKind::AdditionalPermissions,
                checked: false,
                enabled: true,
                summary: Some(RowSummary::MoreGroups(additional.len())),
                opens_details: true,
            });
        }

        debug!("Built {} rows (+{} additional) for {}", rows.len(), additional.len(), app);
        Self {
            app: app.to_string(),
            rows,
            additional,
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn additional_rows(&self) -> &[Row] {
        &self.additional
    }

    pub fn row(&self, key: &str) -> Option<&Row> {
        self.rows.iter().chain(self.additional.iter()).find(|r| r.key == key)
    }

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut().chain(self.additional.iter_mut())
    }

    fn set_checked(&mut self, key: &str, checked: bool) {
        for row in self.rows_mut().filter(|r| r.key == key) {
            row.checked = checked;
        }
    }

    fn restore(&mut self, key: &str, previous: Option<bool>) {
        if let Some(previous) = previous {
            self.set_checked(key, previous);
        }
    }

    /// Row click handler. Never changes grant state.
    pub fn click(&self, key: &str) -> Option<Navigation> {
        let row = self.row(key)?;
        match row.kind {
            RowKind::AdditionalPermissions => Some(Navigation::AdditionalPermissions),
            RowKind::Group if row.opens_details => Some(Navigation::AllPermissions {
                group: Some(row.key.clone()),
            }),
            _ => None,
        }
    }

    /// Menu entry listing every permission of the app
    pub fn all_permissions(&self) -> Navigation {
        Navigation::AllPermissions { group: None }
    }

    /// Switch handler: show the new position and run the toggle pipeline
    pub fn switch(
        &mut self,
        controller: &PermissionToggleController,
        session: &mut ToggleSession,
        key: &str,
        checked: bool,
    ) -> Result<SwitchResponse> {
        let state = TargetState::from_checked(checked);
        let request = match self.row(key).map(|r| (&r.kind, r.enabled)) {
            Some((_, false)) => return Ok(SwitchResponse::Disabled),
            Some((RowKind::Permission { .. }, true)) => ToggleRequest::permission(key, state),
            _ => ToggleRequest::group(key, state),
        };

        let previous = self.row(key).map(|r| r.checked);
        self.set_checked(key, checked);

        let response = match controller.toggle(session, &request) {
            Ok(response) => response,
            Err(err) => {
                self.restore(key, previous);
                return Err(err);
            }
        };
        match &response {
            ToggleResponse::Executed(result) => self.apply_result(result),
            ToggleResponse::AwaitingConfirmation(_) => {}
            ToggleResponse::Rejected(_) => self.restore(key, previous),
        }

        Ok(SwitchResponse::Toggled(response))
    }

    /// Confirm the pending prompt and update the affected rows
    pub fn confirm(
        &mut self,
        controller: &PermissionToggleController,
        session: &mut ToggleSession,
    ) -> Result<AppliedResult> {
        let result = controller.confirm(session)?;
        self.apply_result(&result);
        Ok(result)
    }

    /// Dismiss the pending prompt and put the switch back
    pub fn cancel(
        &mut self,
        controller: &PermissionToggleController,
        session: &mut ToggleSession,
    ) -> Result<ControlState> {
        let restore = controller.cancel(session)?;
        self.set_checked(&restore.key, restore.checked);
        Ok(restore)
    }

    /// Push a backend result into the rows
    pub fn apply_result(&mut self, result: &AppliedResult) {
        match result {
            AppliedResult::Applied { groups, permissions } => {
                for state in groups {
                    for row in self.rows_mut().filter(|r| r.key == state.group) {
                        row.checked = state.state.is_checked();
                        if let (Some(summary), true) = (state.summary, row.enabled) {
                            row.summary = Some(RowSummary::Revocation(summary));
                        }
                    }
                }
                for control in permissions {
                    self.set_checked(&control.key, control.checked);
                }
            }
            AppliedResult::Failed { restore, .. } => {
                self.set_checked(&restore.key, restore.checked);
            }
        }
    }

    /// Re-derive every row from the live catalog, e.g. when the screen resumes
    pub fn refresh(&mut self, controller: &PermissionToggleController) {
        let catalog = controller.catalog();
        let app = self.app.clone();

        for row in self.rows_mut() {
            match row.kind.clone() {
                RowKind::Group => {
                    if let Some(group) = catalog.group(&app, &row.key) {
                        *row = Row::for_group(&group);
                    }
                }
                RowKind::Permission { group } => {
                    if let Some(group) = catalog.group(&app, &group) {
                        row.checked = group.are_granted(&[row.key.as_str()]);
                    }
                }
                RowKind::AdditionalPermissions => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use permtoggle_core::ToggleConfig;

    use crate::backend::{GrantBackend, InMemoryBackend, PermissionFilter};
    use crate::catalog::InMemoryCatalog;
    use crate::controller::ConfirmationReason;
    use crate::fixtures::{
        self, APP, CALL_LOG, CAMERA, MICROPHONE, NETWORK, PHONE, READ_CALL_LOG, SMS, STORAGE,
        VENDOR,
    };

    fn controller(
        strict_mode: bool,
    ) -> (PermissionToggleController, Arc<InMemoryCatalog>, Arc<InMemoryBackend>) {
        let catalog = fixtures::catalog();
        let backend = Arc::new(InMemoryBackend::new(catalog.clone()));
        let config = ToggleConfig {
            strict_mode,
            ..ToggleConfig::default()
        };
        let controller = PermissionToggleController::new(config, catalog.clone(), backend.clone());
        (controller, catalog, backend)
    }

    #[test]
    fn test_build_splits_platform_and_additional() {
        let (controller, _, _) = controller(false);
        let screen = AppPermissionsScreen::build(&controller, APP);

        assert!(screen.row(CAMERA).is_some());
        assert!(screen.row(NETWORK).is_none());
        assert_eq!(screen.additional_rows().len(), 1);
        assert_eq!(screen.additional_rows()[0].key, VENDOR);

        let entry = screen.rows().last().unwrap();
        assert_eq!(entry.key, ADDITIONAL_PERMISSIONS_KEY);
        assert_eq!(entry.summary.as_ref().unwrap().to_string(), "1 more");
        assert_eq!(
            screen.click(ADDITIONAL_PERMISSIONS_KEY),
            Some(Navigation::AdditionalPermissions)
        );

        // No permission rows outside strict mode
        assert!(screen.row(READ_CALL_LOG).is_none());
    }

    #[test]
    fn test_policy_fixed_row_is_disabled() {
        let (controller, _, backend) = controller(false);
        let mut screen = AppPermissionsScreen::build(&controller, APP);
        let mut session = controller.start_session(APP);

        let row = screen.row(MICROPHONE).unwrap();
        assert!(!row.enabled);
        assert_eq!(row.summary, Some(RowSummary::DisabledByAdmin("Example MDM".into())));

        let response = screen.switch(&controller, &mut session, MICROPHONE, false).unwrap();
        assert_eq!(response, SwitchResponse::Disabled);
        assert!(screen.row(MICROPHONE).unwrap().checked);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_individually_controlled_row_has_two_targets() {
        let (controller, catalog, _) = controller(false);
        let mut screen = AppPermissionsScreen::build(&controller, APP);
        let mut session = controller.start_session(APP);

        assert_eq!(
            screen.row(SMS).unwrap().summary,
            Some(RowSummary::Revocation(RevocationSummary::Revoked(2)))
        );

        // Click only navigates
        assert_eq!(
            screen.click(SMS),
            Some(Navigation::AllPermissions { group: Some(SMS.to_string()) })
        );
        assert!(catalog.group(APP, SMS).unwrap().partially_granted());
        assert_eq!(screen.click(CAMERA), None);

        // Switch toggles and recomputes the summary
        screen.switch(&controller, &mut session, SMS, false).unwrap();
        let row = screen.row(SMS).unwrap();
        assert!(!row.checked);
        assert_eq!(row.summary.as_ref().unwrap().to_string(), "all revoked");

        screen.switch(&controller, &mut session, SMS, true).unwrap();
        assert_eq!(screen.row(SMS).unwrap().summary.as_ref().unwrap().to_string(), "none revoked");
    }

    #[test]
    fn test_storage_prompt_cancel_and_confirm() {
        let (controller, _, backend) = controller(false);
        let mut screen = AppPermissionsScreen::build(&controller, APP);
        let mut session = controller.start_session(APP);

        let response = screen.switch(&controller, &mut session, STORAGE, false).unwrap();
        assert_eq!(
            response,
            SwitchResponse::Toggled(ToggleResponse::AwaitingConfirmation(
                ConfirmationReason::GrantedByDefault
            ))
        );
        assert!(!screen.row(STORAGE).unwrap().checked);

        screen.cancel(&controller, &mut session).unwrap();
        assert!(screen.row(STORAGE).unwrap().checked);
        assert!(backend.calls().is_empty());

        screen.switch(&controller, &mut session, STORAGE, false).unwrap();
        screen.confirm(&controller, &mut session).unwrap();
        assert!(!screen.row(STORAGE).unwrap().checked);
        assert!(session.toggled().contains(STORAGE));
    }

    #[test]
    fn test_switch_while_prompt_pending_keeps_row() {
        let (controller, _, backend) = controller(false);
        let mut screen = AppPermissionsScreen::build(&controller, APP);
        let mut session = controller.start_session(APP);

        screen.switch(&controller, &mut session, STORAGE, false).unwrap();
        assert!(screen.switch(&controller, &mut session, CAMERA, false).is_err());

        assert!(screen.row(CAMERA).unwrap().checked);
        assert!(backend.calls().is_empty());
        assert!(session.is_suspended());
    }

    #[test]
    fn test_backend_failure_reverts_switch() {
        let (controller, _, backend) = controller(false);
        backend.fail_group(CAMERA);
        let mut screen = AppPermissionsScreen::build(&controller, APP);
        let mut session = controller.start_session(APP);

        screen.switch(&controller, &mut session, CAMERA, false).unwrap();
        assert!(screen.row(CAMERA).unwrap().checked);
    }

    #[test]
    fn test_strict_mode_permission_rows() {
        let (controller, _, _) = controller(true);
        let mut screen = AppPermissionsScreen::build(&controller, APP);
        let mut session = controller.start_session(APP);

        let row = screen.row(READ_CALL_LOG).unwrap();
        assert_eq!(row.kind, RowKind::Permission { group: CALL_LOG.to_string() });
        assert!(row.checked);
        assert!(screen.row("android.permission.MODIFY_PHONE_STATE").is_none());
        assert!(screen.row("android.permission.READ_EXTERNAL_STORAGE").is_none());
        assert_eq!(screen.rows().iter().filter(|r| r.key == READ_CALL_LOG).count(), 1);

        // Revoking PHONE refreshes its permission rows and the CALL_LOG group row.
        screen.switch(&controller, &mut session, PHONE, false).unwrap();
        assert!(!screen.row(READ_CALL_LOG).unwrap().checked);
        assert!(!screen.row("android.permission.CALL_PHONE").unwrap().checked);
        assert!(screen.row(CALL_LOG).unwrap().checked);

        // A single permission row toggles through its owning group.
        screen.switch(&controller, &mut session, READ_CALL_LOG, true).unwrap();
        assert!(screen.row(READ_CALL_LOG).unwrap().checked);
        assert!(session.toggled().contains(CALL_LOG));
    }

    #[test]
    fn test_refresh_picks_up_external_changes() {
        let (controller, catalog, backend) = controller(false);
        let mut screen = AppPermissionsScreen::build(&controller, APP);

        backend.revoke(APP, CAMERA, &PermissionFilter::All).unwrap();
        assert!(screen.row(CAMERA).unwrap().checked);

        screen.refresh(&controller);
        assert!(!screen.row(CAMERA).unwrap().checked);
        assert!(catalog.group(APP, CAMERA).unwrap().none_granted());
        assert_eq!(screen.all_permissions(), Navigation::AllPermissions { group: None });
    }
}

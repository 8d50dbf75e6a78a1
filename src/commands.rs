//! CLI commands for PermToggle
//! 
//! Drive the toggle pipeline against a catalog snapshot stored as JSON.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use permtoggle_core::{PermToggleError, ToggleConfig};
use permtoggle_permissions::{
    AppPermissionsScreen, AppliedResult, ControlState, InMemoryBackend, InMemoryCatalog,
    PermissionToggleController, RejectReason, RowKind, TargetState, ToggleRequest,
    ToggleResponse, TracingAuditLogger,
};

fn open_controller(catalog: &Path, config: &ToggleConfig) -> Result<PermissionToggleController> {
    let catalog = Arc::new(InMemoryCatalog::load(catalog)?);
    let backend = Arc::new(InMemoryBackend::new(catalog.clone()));
    Ok(PermissionToggleController::new(config.clone(), catalog, backend))
}

/// Render the screen rows as plain text
pub fn render_screen(screen: &AppPermissionsScreen) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Permissions for {}", screen.app());

    let sections = [
        ("", screen.rows()),
        ("Additional permissions", screen.additional_rows()),
    ];
    for (heading, rows) in sections {
        if rows.is_empty() {
            continue;
        }
        if !heading.is_empty() {
            let _ = writeln!(out, "\n{}", heading);
        }
        for row in rows {
            let indent = if matches!(row.kind, RowKind::Permission { .. }) { "    " } else { "  " };
            let switch = match row.kind {
                RowKind::AdditionalPermissions => "   ",
                _ if row.checked => "[x]",
                _ => "[ ]",
            };
            let _ = write!(out, "{}{} {}", indent, switch, row.title);
            if let Some(summary) = &row.summary {
                let _ = write!(out, " - {}", summary);
            }
            if !row.enabled {
                let _ = write!(out, " (disabled)");
            }
            out.push('\n');
        }
    }
    out
}

/// Show command options
pub struct ShowCommand {
    pub catalog: PathBuf,
    pub app: String,
}

impl ShowCommand {
    /// Build the permissions screen for the app
    pub fn execute(&self, config: &ToggleConfig) -> Result<AppPermissionsScreen> {
        let controller = open_controller(&self.catalog, config)?;
        let screen = AppPermissionsScreen::build(&controller, &self.app);
        if screen.rows().is_empty() && screen.additional_rows().is_empty() {
            let what = format!("permission groups of {}", self.app);
            return Err(PermToggleError::NotFound(what).into());
        }
        Ok(screen)
    }
}

/// What the toggle command targets
pub enum ToggleTarget {
    Group(String),
    Permission(String),
}

/// How a confirmation prompt was answered
#[derive(Debug)]
pub enum Resolution {
    NotPrompted,
    Confirmed(AppliedResult),
    Cancelled(ControlState),
}

/// Outcome of a toggle command
#[derive(Debug)]
pub struct ToggleReport {
    pub response: ToggleResponse,
    pub resolution: Resolution,
    /// Groups flushed to the audit log
    pub toggled: Vec<String>,
    pub screen: AppPermissionsScreen,
}

/// Toggle command options
pub struct ToggleCommand {
    pub catalog: PathBuf,
    pub app: String,
    pub target: ToggleTarget,
    pub grant: bool,
    /// Answer confirmation prompts with "deny anyway" instead of cancel
    pub confirm: bool,
}

impl ToggleCommand {
    /// Run one toggle session
    pub fn execute(&self, config: &ToggleConfig) -> Result<ToggleReport> {
        let controller = open_controller(&self.catalog, config)?;
        let mut session = controller.start_session(&self.app);

        let state = TargetState::from_checked(self.grant);
        let request = match &self.target {
            ToggleTarget::Group(group) => ToggleRequest::group(group, state),
            ToggleTarget::Permission(permission) => ToggleRequest::permission(permission, state),
        };

        let response = controller.toggle(&mut session, &request)?;
        let resolution = match &response {
            ToggleResponse::AwaitingConfirmation(reason) if self.confirm => {
                info!("Confirming revoke of {} ({})", request.key(), reason);
                Resolution::Confirmed(controller.confirm(&mut session)?)
            }
            ToggleResponse::AwaitingConfirmation(reason) => {
                info!("Cancelling revoke of {} ({})", request.key(), reason);
                Resolution::Cancelled(controller.cancel(&mut session)?)
            }
            _ => Resolution::NotPrompted,
        };

        let toggled = controller.end_session(session, &TracingAuditLogger);
        if let Some(err) = failure(&response, &resolution) {
            return Err(err.into());
        }
        let screen = AppPermissionsScreen::build(&controller, &self.app);

        Ok(ToggleReport {
            response,
            resolution,
            toggled,
            screen,
        })
    }
}

/// Error for a toggle that targeted nothing or that the backend refused
fn failure(response: &ToggleResponse, resolution: &Resolution) -> Option<PermToggleError> {
    match (response, resolution) {
        (ToggleResponse::Rejected(RejectReason::NotFound(key)), _) => {
            Some(PermToggleError::NotFound(key.clone()))
        }
        (ToggleResponse::Executed(AppliedResult::Failed { reason, .. }), _)
        | (_, Resolution::Confirmed(AppliedResult::Failed { reason, .. })) => {
            Some(reason.clone().into())
        }
        _ => None,
    }
}

//! Grant Backend
//!
//! Contract for the privileged service that actually grants and revokes
//! runtime permissions, plus an in-memory implementation over
//! [`InMemoryCatalog`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use permtoggle_core::PermToggleError;

use crate::catalog::{InMemoryCatalog, PermissionGroupCatalog};

/// Which permissions of a group a toggle touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionFilter {
    /// Every permission listed in the group
    All,
    /// Only the named permissions
    Only(BTreeSet<String>),
}

impl PermissionFilter {
    pub fn single(permission: &str) -> Self {
        PermissionFilter::Only(BTreeSet::from([permission.to_string()]))
    }

    pub fn matches(&self, permission: &str) -> bool {
        match self {
            PermissionFilter::All => true,
            PermissionFilter::Only(names) => names.contains(permission),
        }
    }
}

impl fmt::Display for PermissionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionFilter::All => write!(f, "all"),
            PermissionFilter::Only(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, "{}", names.join(","))
            }
        }
    }
}

/// Grant backend failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("permission change denied: {0}")]
    Denied(String),

    #[error("grant service unavailable: {0}")]
    Unavailable(String),

    #[error("unknown permission group: {0}")]
    UnknownGroup(String),
}

impl From<BackendError> for PermToggleError {
    fn from(err: BackendError) -> Self {
        PermToggleError::Backend(err.to_string())
    }
}

/// Performs grants and revokes. Both operations must be idempotent.
pub trait GrantBackend: Send + Sync {
    fn grant(&self, app: &str, group: &str, filter: &PermissionFilter) -> Result<(), BackendError>;

    fn revoke(&self, app: &str, group: &str, filter: &PermissionFilter) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Grant,
    Revoke,
}

/// Backend mutating an [`InMemoryCatalog`]
pub struct InMemoryBackend {
    catalog: Arc<InMemoryCatalog>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<BackendCall>>,
}

/// Record of one backend invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub app: String,
    pub group: String,
    pub filter: PermissionFilter,
    pub granted: bool,
}

impl InMemoryBackend {
    pub fn new(catalog: Arc<InMemoryCatalog>) -> Self {
        Self {
            catalog,
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every call for `group` fail with [`BackendError::Denied`]
    pub fn fail_group(&self, group: &str) {
        self.failing.lock().insert(group.to_string());
    }

    /// Invocations received so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    fn apply(
        &self,
        app: &str,
        group: &str,
        filter: &PermissionFilter,
        change: Change,
    ) -> Result<(), BackendError> {
        self.calls.lock().push(BackendCall {
            app: app.to_string(),
            group: group.to_string(),
            filter: filter.clone(),
            granted: change == Change::Grant,
        });

        if self.failing.lock().contains(group) {
            return Err(BackendError::Denied(group.to_string()));
        }

        let target = self
            .catalog
            .group(app, group)
            .ok_or_else(|| BackendError::UnknownGroup(group.to_string()))?;

        let names: Vec<String> = target
            .permissions
            .iter()
            .filter(|p| filter.matches(&p.name))
            .map(|p| p.name.clone())
            .collect();

        let legacy = !target.supports_runtime_permissions;
        let touched = self.catalog.update_permissions(app, &names, |permission| match change {
            Change::Grant => {
                permission.granted = true;
                permission.app_op_allowed = true;
                if legacy {
                    permission.review_required = false;
                }
            }
            Change::Revoke => {
                if legacy {
                    permission.app_op_allowed = false;
                } else {
                    permission.granted = false;
                }
            }
        });

        debug!("{:?} {} in {} for {}: {} listings", change, filter, group, app, touched);
        Ok(())
    }
}

impl GrantBackend for InMemoryBackend {
    fn grant(&self, app: &str, group: &str, filter: &PermissionFilter) -> Result<(), BackendError> {
        self.apply(app, group, filter, Change::Grant)
    }

    fn revoke(
        &self,
        app: &str,
        group: &str,
        filter: &PermissionFilter,
    ) -> Result<(), BackendError> {
        self.apply(app, group, filter, Change::Revoke)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, APP, CALL_LOG, CAMERA, CONTACTS, PHONE, READ_CALL_LOG};

    #[test]
    fn test_revoke_then_grant_group() {
        let catalog = fixtures::catalog();
        let backend = InMemoryBackend::new(catalog.clone());

        backend.revoke(APP, CAMERA, &PermissionFilter::All).unwrap();
        assert!(catalog.group(APP, CAMERA).unwrap().none_granted());

        // Idempotent
        backend.revoke(APP, CAMERA, &PermissionFilter::All).unwrap();
        backend.grant(APP, CAMERA, &PermissionFilter::All).unwrap();
        assert!(catalog.group(APP, CAMERA).unwrap().all_granted());
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn test_filter_reaches_every_listing() {
        let catalog = fixtures::catalog();
        let backend = InMemoryBackend::new(catalog.clone());

        backend
            .revoke(APP, CALL_LOG, &PermissionFilter::single(READ_CALL_LOG))
            .unwrap();

        let phone = catalog.group(APP, PHONE).unwrap();
        assert!(!phone.permission(READ_CALL_LOG).unwrap().granted);
        assert!(phone.partially_granted());
        assert!(catalog.group(APP, CALL_LOG).unwrap().partially_granted());
    }

    #[test]
    fn test_legacy_revoke_clears_app_op() {
        let catalog = fixtures::catalog();
        let backend = InMemoryBackend::new(catalog.clone());

        backend.revoke(APP, CONTACTS, &PermissionFilter::All).unwrap();
        let contacts = catalog.group(APP, CONTACTS).unwrap();
        assert!(!contacts.permissions[0].app_op_allowed);
        assert!(contacts.none_granted());
    }

    #[test]
    fn test_injected_failure_leaves_state() {
        let catalog = fixtures::catalog();
        let backend = InMemoryBackend::new(catalog.clone());
        backend.fail_group(CAMERA);

        let err = backend.revoke(APP, CAMERA, &PermissionFilter::All).unwrap_err();
        assert_eq!(err, BackendError::Denied(CAMERA.to_string()));
        assert!(catalog.group(APP, CAMERA).unwrap().all_granted());

        let err = backend.grant(APP, "missing", &PermissionFilter::All).unwrap_err();
        assert!(matches!(err, BackendError::UnknownGroup(_)));
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(PermissionFilter::All.to_string(), "all");
        assert_eq!(PermissionFilter::single("a").to_string(), "a");
    }
}

//! Permission Model
//!
//! Snapshots of an app's permission groups as reported by the catalog.
//! Aggregate grant state is always derived from the member permissions.

use serde::{Deserialize, Serialize};

/// Runtime permission granted to one app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Full permission name (e.g., "android.permission.CAMERA")
    pub name: String,

    /// Group the platform assigns this permission to. May differ from the
    /// group that lists it.
    pub group: String,

    #[serde(default)]
    pub protection_level: ProtectionLevel,

    #[serde(default)]
    pub granted: bool,

    #[serde(default)]
    pub app_op_allowed: bool,

    #[serde(default)]
    pub review_required: bool,
}

impl Permission {
    /// Create a new dangerous permission owned by `group`
    pub fn new(name: &str, group: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            protection_level: ProtectionLevel::Dangerous,
            granted: false,
            app_op_allowed: false,
            review_required: false,
        }
    }

    pub fn with_protection_level(mut self, level: ProtectionLevel) -> Self {
        self.protection_level = level;
        self
    }

    /// Mark the permission as granted (runtime grant and app op)
    pub fn granted(mut self) -> Self {
        self.granted = true;
        self.app_op_allowed = true;
        self
    }

    pub fn with_review_required(mut self, review_required: bool) -> Self {
        self.review_required = review_required;
        self
    }

    /// Get the short name without android.permission prefix
    pub fn short_name(&self) -> &str {
        self.name
            .strip_prefix("android.permission.")
            .unwrap_or(&self.name)
    }
}

/// Permission protection level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProtectionLevel {
    Normal,
    #[default]
    Dangerous,
    Signature,
    SignatureOrSystem,
}

impl ProtectionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionLevel::Normal => "normal",
            ProtectionLevel::Dangerous => "dangerous",
            ProtectionLevel::Signature => "signature",
            ProtectionLevel::SignatureOrSystem => "signatureOrSystem",
        }
    }
}

/// Aggregate grant state of a group, derived from its permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantState {
    AllGranted,
    NoneGranted,
    PartiallyGranted,
}

impl GrantState {
    /// Whether a switch bound to this state shows as checked
    pub fn is_checked(&self) -> bool {
        !matches!(self, GrantState::NoneGranted)
    }
}

/// Permission group as granted to one app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub permissions: Vec<Permission>,

    #[serde(default)]
    pub declaring_package_is_platform: bool,

    #[serde(default)]
    pub policy_fixed: bool,

    /// Device or profile owner enforcing a fixed policy, if known
    #[serde(default)]
    pub enforcing_admin: Option<String>,

    #[serde(default = "default_true")]
    pub supports_runtime_permissions: bool,

    #[serde(default)]
    pub has_granted_by_default_permission: bool,

    #[serde(default)]
    pub individually_controlled: bool,
}

fn default_true() -> bool {
    true
}

impl PermissionGroup {
    /// Create a new platform-declared runtime group
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.rsplit('.').next().unwrap_or(name).to_string(),
            permissions: Vec::new(),
            declaring_package_is_platform: true,
            policy_fixed: false,
            enforcing_admin: None,
            supports_runtime_permissions: true,
            has_granted_by_default_permission: false,
            individually_controlled: false,
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn permission(&self, name: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.permission(name).is_some()
    }

    /// Grant predicate for one member permission.
    ///
    /// Runtime groups look at the runtime grant; legacy groups at the app op
    /// and the pending permission review.
    pub fn is_permission_granted(&self, permission: &Permission) -> bool {
        if self.supports_runtime_permissions {
            permission.granted
        } else {
            permission.app_op_allowed && !permission.review_required
        }
    }

    /// Number of member permissions failing the grant predicate
    pub fn revoked_count(&self) -> usize {
        self.permissions
            .iter()
            .filter(|p| !self.is_permission_granted(p))
            .count()
    }

    /// Derived aggregate state. An empty group counts as not granted.
    pub fn grant_state(&self) -> GrantState {
        let granted = self
            .permissions
            .iter()
            .filter(|p| self.is_permission_granted(p))
            .count();

        if granted == 0 {
            GrantState::NoneGranted
        } else if granted == self.permissions.len() {
            GrantState::AllGranted
        } else {
            GrantState::PartiallyGranted
        }
    }

    pub fn all_granted(&self) -> bool {
        self.grant_state() == GrantState::AllGranted
    }

    pub fn none_granted(&self) -> bool {
        self.grant_state() == GrantState::NoneGranted
    }

    pub fn partially_granted(&self) -> bool {
        self.grant_state() == GrantState::PartiallyGranted
    }

    /// Whether any of the named permissions passes the grant predicate
    pub fn are_granted(&self, names: &[&str]) -> bool {
        self.permissions
            .iter()
            .filter(|p| names.contains(&p.name.as_str()))
            .any(|p| self.is_permission_granted(p))
    }

    /// Groups without a single user-facing permission get no row
    pub fn is_user_facing(&self) -> bool {
        self.permissions
            .iter()
            .any(|p| p.protection_level != ProtectionLevel::Normal)
    }
}

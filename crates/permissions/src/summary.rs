//! Summary text for individually controlled groups

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::PermissionGroup;

/// How many permissions of an individually controlled group are revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationSummary {
    NoneRevoked,
    AllRevoked,
    Revoked(usize),
}

impl RevocationSummary {
    /// Count the permissions failing the group's grant predicate
    pub fn for_group(group: &PermissionGroup) -> Self {
        let revoked = group.revoked_count();

        if revoked == 0 {
            RevocationSummary::NoneRevoked
        } else if revoked == group.permissions.len() {
            RevocationSummary::AllRevoked
        } else {
            RevocationSummary::Revoked(revoked)
        }
    }
}

impl fmt::Display for RevocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevocationSummary::NoneRevoked => write!(f, "none revoked"),
            RevocationSummary::AllRevoked => write!(f, "all revoked"),
            RevocationSummary::Revoked(count) => write!(f, "{} revoked", count),
        }
    }
}

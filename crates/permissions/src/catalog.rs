//! Permission Group Catalog
//!
//! Read-only view of the permission groups an app requests, with live grant
//! state. Every call re-reads the current state; callers must not cache.

use std::path::Path;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use permtoggle_core::Result;

use crate::model::PermissionGroup;

/// Source of permission group snapshots
pub trait PermissionGroupCatalog: Send + Sync {
    /// All groups requested by `app`, in catalog order
    fn list_groups(&self, app: &str) -> Vec<PermissionGroup>;

    /// Group owning `permission` for `app`
    fn find_group(&self, app: &str, permission: &str) -> Option<PermissionGroup>;

    /// Group by name
    fn group(&self, app: &str, group: &str) -> Option<PermissionGroup> {
        self.list_groups(app).into_iter().find(|g| g.name == group)
    }
}

/// Serialized form of an in-memory catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Groups per app package name
    pub apps: IndexMap<String, Vec<PermissionGroup>>,
}

/// Catalog kept in memory, shared with [`crate::backend::InMemoryBackend`]
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    apps: RwLock<IndexMap<String, IndexMap<String, PermissionGroup>>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a snapshot
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let catalog = Self::new();
        for (app, groups) in snapshot.apps {
            for group in groups {
                catalog.insert_group(&app, group);
            }
        }
        catalog
    }

    /// Parse a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a JSON snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading permission catalog from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Current contents as a snapshot
    pub fn snapshot(&self) -> CatalogSnapshot {
        let apps = self.apps.read();
        CatalogSnapshot {
            apps: apps
                .iter()
                .map(|(app, groups)| (app.clone(), groups.values().cloned().collect()))
                .collect(),
        }
    }

    /// Add or replace a group for `app`
    pub fn insert_group(&self, app: &str, group: PermissionGroup) {
        self.apps
            .write()
            .entry(app.to_string())
            .or_default()
            .insert(group.name.clone(), group);
    }

    /// Mutate every listing of the named permissions for `app`.
    ///
    /// Returns the number of listings touched.
    pub(crate) fn update_permissions<F>(&self, app: &str, names: &[String], mut update: F) -> usize
    where
        F: FnMut(&mut crate::model::Permission),
    {
        let mut apps = self.apps.write();
        let Some(groups) = apps.get_mut(app) else {
            return 0;
        };

        let mut touched = 0;
        for permission in groups
            .values_mut()
            .flat_map(|g| g.permissions.iter_mut())
            .filter(|p| names.contains(&p.name))
        {
            update(permission);
            touched += 1;
        }
        touched
    }
}

impl PermissionGroupCatalog for InMemoryCatalog {
    fn list_groups(&self, app: &str) -> Vec<PermissionGroup> {
        self.apps
            .read()
            .get(app)
            .map(|groups| groups.values().cloned().collect())
            .unwrap_or_default()
    }

    fn find_group(&self, app: &str, permission: &str) -> Option<PermissionGroup> {
        let apps = self.apps.read();
        let groups = apps.get(app)?;

        let listed_in = groups.values().find(|g| g.contains(permission))?;
        let owner = listed_in.permission(permission).map(|p| p.group.as_str())?;

        Some(groups.get(owner).unwrap_or(listed_in).clone())
    }

    fn group(&self, app: &str, group: &str) -> Option<PermissionGroup> {
        self.apps.read().get(app)?.get(group).cloned()
    }
}

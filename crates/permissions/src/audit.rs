//! Audit logging of toggled permission groups

use parking_lot::Mutex;
use tracing::info;

/// Receives the net set of toggled groups once per session end.
/// Fire-and-forget: implementations must not fail the caller.
pub trait AuditLogger: Send + Sync {
    fn log_toggled(&self, app: &str, groups: &[String]);
}

/// Audit logger writing one structured tracing record per session
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log_toggled(&self, app: &str, groups: &[String]) {
        info!(
            target: "permtoggle::audit",
            app = app,
            count = groups.len(),
            groups = ?groups,
            "Permission groups toggled"
        );
    }
}

/// Audit logger keeping every flushed session in memory
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    entries: Mutex<Vec<(String, Vec<String>)>>,
}

impl MemoryAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Vec<String>)> {
        self.entries.lock().clone()
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log_toggled(&self, app: &str, groups: &[String]) {
        self.entries.lock().push((app.to_string(), groups.to_vec()));
    }
}

//! Toggled groups log
//!
//! Net set of groups changed during one session. Toggling a group a second
//! time takes it back to its initial state, so it drops out of the log.

use indexmap::IndexSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggledGroupsLog {
    groups: IndexSet<String>,
}

impl ToggledGroupsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an executed toggle of `group`
    pub fn record(&mut self, group: &str) {
        if !self.groups.shift_remove(group) {
            self.groups.insert(group.to_string());
        }
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Take the current contents, leaving the log empty
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.groups).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_toggle_cancels_out() {
        let mut log = ToggledGroupsLog::new();
        log.record("CAMERA");
        log.record("CAMERA");
        assert!(log.is_empty());
    }

    #[test]
    fn test_parity_across_groups() {
        let mut log = ToggledGroupsLog::new();
        log.record("A");
        log.record("B");
        log.record("A");

        assert_eq!(log.groups().collect::<Vec<_>>(), vec!["B"]);
        assert!(!log.contains("A"));
    }

    #[test]
    fn test_take_clears() {
        let mut log = ToggledGroupsLog::new();
        log.record("A");
        log.record("B");

        assert_eq!(log.take(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(log.len(), 0);
    }
}

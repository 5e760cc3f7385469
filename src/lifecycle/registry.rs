// src/lifecycle/registry.rs

//! Per-run record of each stack's state before the backup.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::StackState;

/// Mapping from stack name to the state observed when it was stored.
///
/// Only [`Registry::record`] writes; lookups of names that were never
/// recorded yield [`StackState::Unknown`]. Entries are never removed.
///
/// Not synchronised: callers that share a coordinator across tasks must
/// guard it with a lock.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    states: BTreeMap<String, StackState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, state: StackState) {
        if let Some(previous) = self.states.insert(name.to_string(), state) {
            debug!(stack = name, %previous, %state, "replacing stored stack state");
        }
    }

    pub fn get(&self, name: &str) -> StackState {
        self.states.get(name).copied().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_name_is_unknown() {
        let registry = Registry::new();
        assert_eq!(registry.get("web"), StackState::Unknown);
        assert!(!registry.contains("web"));
    }

    #[test]
    fn record_then_get() {
        let mut registry = Registry::new();
        registry.record("web", StackState::Running);
        registry.record("db", StackState::Stopped);

        assert_eq!(registry.get("web"), StackState::Running);
        assert_eq!(registry.get("db"), StackState::Stopped);
        assert_eq!(registry.len(), 2);
    }
}

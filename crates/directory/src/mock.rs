//! In-memory [`Directory`] for testing reconciliation without HTTP.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use crate::Directory;
use crate::error::{Error, Result};
use crate::types::Method;

/// A call made against a [`MockDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list_groups`
    ListGroups,
    /// `create_group(name)`
    CreateGroup(String),
    /// `list_variable_names(group_id)`
    ListVariables(String),
    /// `upsert_variable(group_id, name, value)`
    Upsert(String, String, String),
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<String, String>,
    variables: BTreeMap<String, BTreeMap<String, String>>,
    next_id: usize,
    calls: Vec<Call>,
}

/// In-memory contexts store with failure injection and a call log.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<State>>,
    fail_listing: bool,
    fail_create: HashSet<String>,
    fail_list_variables: HashSet<String>,
    fail_upsert: HashSet<String>,
}

impl MockDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing group.
    pub fn add_group(&mut self, name: &str, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.groups.insert(name.to_string(), id.to_string());
        state.variables.entry(id.to_string()).or_default();
    }

    /// Add an existing variable to a group id.
    pub fn add_variable(&mut self, group_id: &str, name: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .variables
            .entry(group_id.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    /// Make `list_groups` fail.
    pub fn fail_listing(&mut self) {
        self.fail_listing = true;
    }

    /// Make `create_group` fail for this name.
    pub fn fail_create(&mut self, name: &str) {
        self.fail_create.insert(name.to_string());
    }

    /// Make `list_variable_names` fail for this group id.
    pub fn fail_list_variables(&mut self, group_id: &str) {
        self.fail_list_variables.insert(group_id.to_string());
    }

    /// Make `upsert_variable` fail for this variable name (in any group).
    pub fn fail_upsert(&mut self, name: &str) {
        self.fail_upsert.insert(name.to_string());
    }

    /// Every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of `create_group` calls.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateGroup(_)))
    }

    /// Number of `upsert_variable` calls.
    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Upsert(..)))
    }

    /// Current groups, name to id.
    #[must_use]
    pub fn groups(&self) -> BTreeMap<String, String> {
        self.state.lock().unwrap().groups.clone()
    }

    /// Current value of a variable, looked up by group name.
    #[must_use]
    pub fn value(&self, group: &str, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        let id = state.groups.get(group)?;
        state.variables.get(id)?.get(name).cloned()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }
}

fn rejected(method: Method, endpoint: String) -> Error {
    Error::Api {
        method,
        endpoint,
        status: 500,
        message: "injected failure".to_string(),
        retry_after: None,
    }
}

impl Directory for MockDirectory {
    fn list_groups(&self) -> Result<BTreeMap<String, String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListGroups);
        if self.fail_listing {
            return Err(rejected(Method::Get, "context".to_string()));
        }
        Ok(state.groups.clone())
    }

    fn create_group(&self, name: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateGroup(name.to_string()));
        if self.fail_create.contains(name) {
            return Err(rejected(Method::Post, "context".to_string()));
        }

        state.next_id += 1;
        let id = format!("ctx-{}", state.next_id);
        state.groups.insert(name.to_string(), id.clone());
        state.variables.entry(id.clone()).or_default();
        Ok(id)
    }

    fn list_variable_names(&self, group_id: &str) -> Result<BTreeSet<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListVariables(group_id.to_string()));
        if self.fail_list_variables.contains(group_id) {
            return Err(rejected(
                Method::Get,
                format!("context/{group_id}/environment-variable"),
            ));
        }
        Ok(state
            .variables
            .get(group_id)
            .map(|vars| vars.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn upsert_variable(&self, group_id: &str, name: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Upsert(
            group_id.to_string(),
            name.to_string(),
            value.to_string(),
        ));
        if self.fail_upsert.contains(name) {
            return Err(rejected(
                Method::Put,
                format!("context/{group_id}/environment-variable/{name}"),
            ));
        }
        state
            .variables
            .entry(group_id.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_directory_create_then_list() {
        let mock = MockDirectory::new();
        let id = mock.create_group("deploy").unwrap();
        assert_eq!(mock.list_groups().unwrap()["deploy"], id);
        assert_eq!(mock.create_calls(), 1);
    }

    #[test]
    fn test_mock_directory_upsert_overwrites() {
        let mut mock = MockDirectory::new();
        mock.add_group("deploy", "ctx-a");
        mock.add_variable("ctx-a", "A", "old");

        mock.upsert_variable("ctx-a", "A", "new").unwrap();

        assert_eq!(mock.value("deploy", "A").as_deref(), Some("new"));
        assert_eq!(
            mock.list_variable_names("ctx-a").unwrap(),
            BTreeSet::from(["A".to_string()])
        );
    }

    #[test]
    fn test_mock_directory_injected_failures() {
        let mut mock = MockDirectory::new();
        mock.fail_create("broken");
        mock.fail_upsert("BAD");

        assert!(mock.create_group("broken").is_err());
        assert!(mock.upsert_variable("ctx-1", "BAD", "x").is_err());
        assert!(mock.groups().is_empty());
        assert_eq!(mock.calls().len(), 2);
    }
}

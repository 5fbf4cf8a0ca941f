//! Core types for declarative context management

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single desired variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Already coerced to text
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A desired resource group (context) and its variables, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub variables: Vec<Variable>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, variables: Vec<Variable>) -> Self {
        Self {
            name: name.into(),
            variables,
        }
    }
}

/// The full desired state, immutable once built
///
/// Group order and variable order decide processing order only.
/// Repeated variable names are kept as-is and upserted twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    groups: Vec<GroupSpec>,
}

impl DesiredState {
    pub fn new(groups: Vec<GroupSpec>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[GroupSpec] {
        &self.groups
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    pub fn total_variables(&self) -> usize {
        self.groups.iter().map(|g| g.variables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Observed name -> id table for the groups of one scope
///
/// Owned by a single reconciliation run. The reconciler is its only writer
/// and inserts only after a successful creation; ids are never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    entries: BTreeMap<String, String>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Record a newly created group. An existing entry is kept.
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.entries.entry(name.into()).or_insert_with(|| id.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for GroupTable {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

/// What is known about the variables already present in a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// Listing succeeded (or degraded to empty)
    Known(BTreeSet<String>),
    /// Not queried (dry run)
    Unknown,
}

impl Membership {
    /// Classify an upsert of `name` against this membership
    pub fn classify(&self, name: &str) -> VariableAction {
        match self {
            Self::Known(names) if names.contains(name) => VariableAction::Updated,
            Self::Known(_) => VariableAction::Created,
            Self::Unknown => VariableAction::Ensured,
        }
    }

    /// Number of known names, if known
    pub fn known_len(&self) -> Option<usize> {
        match self {
            Self::Known(names) => Some(names.len()),
            Self::Unknown => None,
        }
    }
}

/// Label for a variable upsert. Every action issues the same call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableAction {
    /// Name was not in the observed set
    Created,
    /// Name was in the observed set
    Updated,
    /// Membership unknown; the variable will be set either way
    Ensured,
}

impl VariableAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Ensured => "Would ensure set",
        }
    }
}

/// Summary of a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub groups_processed: usize,
    pub groups_created: usize,
    pub groups_reused: usize,
    pub groups_skipped: usize,
    pub variables_created: usize,
    pub variables_updated: usize,
    pub variables_ensured: usize,
    pub variables_failed: usize,
    /// Groups whose variable listing failed and was treated as empty
    pub listings_degraded: usize,
}

impl SyncSummary {
    /// Record a successful upsert
    pub fn add_variable(&mut self, action: VariableAction) {
        match action {
            VariableAction::Created => self.variables_created += 1,
            VariableAction::Updated => self.variables_updated += 1,
            VariableAction::Ensured => self.variables_ensured += 1,
        }
    }

    /// Successful upserts, whatever their label
    pub fn variables_applied(&self) -> usize {
        self.variables_created + self.variables_updated + self.variables_ensured
    }

    /// Item-level failures: skipped groups plus failed upserts
    pub fn failures(&self) -> usize {
        self.groups_skipped + self.variables_failed
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_classify() {
        let known = Membership::Known(BTreeSet::from(["A".to_string()]));
        assert_eq!(known.classify("A"), VariableAction::Updated);
        assert_eq!(known.classify("B"), VariableAction::Created);
        assert_eq!(Membership::Unknown.classify("A"), VariableAction::Ensured);
        assert_eq!(Membership::Unknown.known_len(), None);
    }

    #[test]
    fn test_group_table_keeps_first_id() {
        let mut table = GroupTable::new();
        table.insert("deploy", "id-1");
        table.insert("deploy", "id-2");
        assert_eq!(table.get("deploy"), Some("id-1"));
        assert_eq!(table.len(), 1);
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = SyncSummary::default();
        summary.add_variable(VariableAction::Created);
        summary.add_variable(VariableAction::Updated);
        summary.add_variable(VariableAction::Ensured);
        summary.variables_failed = 1;
        summary.groups_skipped = 1;

        assert_eq!(summary.variables_applied(), 3);
        assert_eq!(summary.failures(), 2);
        assert!(!summary.is_success());
        assert!(SyncSummary::default().is_success());
    }

    #[test]
    fn test_desired_state_totals() {
        let desired = DesiredState::new(vec![
            GroupSpec::new("a", vec![Variable::new("X", "1"), Variable::new("Y", "2")]),
            GroupSpec::new("b", vec![]),
        ]);
        assert_eq!(desired.total_variables(), 2);
        assert_eq!(desired.group_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!desired.is_empty());
    }
}

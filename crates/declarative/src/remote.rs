//! Remote capabilities used by the reconciler
//!
//! The reconciler reads through [`RemoteState`] and writes through
//! [`Mutator`]. Two implementations exist:
//!
//! - [`LiveRemote`]: delegates to a [`Directory`] (real API or mock)
//! - [`Simulator`]: the dry run; synthesizes observations and performs no
//!   calls at all
//!
//! Because the dry run is just another capability object, the algorithm in
//! [`crate::reconciler`] has no dry-run branches.

use crate::types::{DesiredState, GroupTable, Membership};
use directory::Directory;
use std::collections::BTreeSet;

/// Read side: observe what already exists
pub trait RemoteState {
    /// Snapshot of every group in the scope
    fn list_groups(&self) -> directory::Result<GroupTable>;

    /// Variable names already present in a group
    fn list_variable_names(&self, group_id: &str) -> directory::Result<Membership>;

    /// Whether observations are synthesized rather than fetched
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Write side: the only operations that change remote state
pub trait Mutator {
    /// Create a group, returning its id
    fn create_group(&self, name: &str) -> directory::Result<String>;

    /// Create-or-overwrite a variable
    fn upsert_variable(&self, group_id: &str, name: &str, value: &str) -> directory::Result<()>;
}

/// Both capabilities together
pub trait Remote: RemoteState + Mutator {}

impl<T: RemoteState + Mutator + ?Sized> Remote for T {}

/// Live remote backed by a [`Directory`]
pub struct LiveRemote<'a> {
    directory: &'a dyn Directory,
}

impl<'a> LiveRemote<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }
}

impl RemoteState for LiveRemote<'_> {
    fn list_groups(&self) -> directory::Result<GroupTable> {
        self.directory.list_groups().map(GroupTable::from)
    }

    fn list_variable_names(&self, group_id: &str) -> directory::Result<Membership> {
        self.directory
            .list_variable_names(group_id)
            .map(Membership::Known)
    }
}

impl Mutator for LiveRemote<'_> {
    fn create_group(&self, name: &str) -> directory::Result<String> {
        self.directory.create_group(name)
    }

    fn upsert_variable(&self, group_id: &str, name: &str, value: &str) -> directory::Result<()> {
        self.directory.upsert_variable(group_id, name, value)
    }
}

/// Dry-run remote
///
/// Reports every desired group as already existing under a synthetic id and
/// leaves variable membership unknown, so every variable is labelled
/// [`crate::VariableAction::Ensured`]. No network access, no credentials'
/// write scope needed.
pub struct Simulator {
    groups: BTreeSet<String>,
}

impl Simulator {
    pub fn new(desired: &DesiredState) -> Self {
        Self {
            groups: desired.group_names().map(str::to_string).collect(),
        }
    }

    /// Synthetic id for a group assumed to exist
    pub fn existing_id(name: &str) -> String {
        format!("dry-run-id-{name}")
    }

    /// Synthetic id for a group that would be created
    pub fn created_id(name: &str) -> String {
        format!("dry-run-new-id-{name}")
    }
}

impl RemoteState for Simulator {
    fn list_groups(&self) -> directory::Result<GroupTable> {
        let mut table = GroupTable::new();
        for name in &self.groups {
            table.insert(name.clone(), Self::existing_id(name));
        }
        Ok(table)
    }

    fn list_variable_names(&self, _group_id: &str) -> directory::Result<Membership> {
        Ok(Membership::Unknown)
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

impl Mutator for Simulator {
    fn create_group(&self, name: &str) -> directory::Result<String> {
        Ok(Self::created_id(name))
    }

    fn upsert_variable(&self, _group_id: &str, _name: &str, _value: &str) -> directory::Result<()> {
        Ok(())
    }
}

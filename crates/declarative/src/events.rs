//! Structured reconciliation events and the sink that receives them
//!
//! The reconciler never prints or logs. Every decision point emits a
//! [`SyncEvent`] to an injected [`EventSink`], so a CLI can render them as
//! log lines and tests can assert on them directly.

use crate::types::{SyncSummary, VariableAction};
use serde::{Deserialize, Serialize};

/// A decision or outcome during reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    RunStarted {
        groups: usize,
        variables: usize,
        simulated: bool,
    },
    GroupsListed {
        count: usize,
    },
    GroupFound {
        group: String,
        id: String,
    },
    /// About to attempt creation
    GroupMissing {
        group: String,
    },
    GroupCreated {
        group: String,
        id: String,
    },
    /// Creation failed; the group's variables are not processed
    GroupSkipped {
        group: String,
        reason: String,
    },
    /// `existing` is `None` when membership was not queried
    VariablesListed {
        group: String,
        existing: Option<usize>,
    },
    /// Listing failed; every variable will be reported as created
    VariableListingDegraded {
        group: String,
        reason: String,
    },
    VariableApplied {
        group: String,
        variable: String,
        action: VariableAction,
    },
    VariableFailed {
        group: String,
        variable: String,
        action: VariableAction,
        reason: String,
    },
    RunFinished {
        summary: SyncSummary,
    },
}

/// Receiver for reconciliation events
pub trait EventSink {
    fn record(&mut self, event: SyncEvent);
}

/// Sink that keeps every event in order
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SyncEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SyncEvent] {
        &self.events
    }

    /// `(group, variable, action)` for every successful upsert
    pub fn applied(&self) -> Vec<(&str, &str, VariableAction)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::VariableApplied {
                    group,
                    variable,
                    action,
                } => Some((group.as_str(), variable.as_str(), *action)),
                _ => None,
            })
            .collect()
    }

    /// Groups that were resolved to an id (found or created)
    pub fn resolved_groups(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::GroupFound { group, .. } | SyncEvent::GroupCreated { group, .. } => {
                    Some(group.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: SyncEvent) {
        self.events.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: SyncEvent) {
        (**self).record(event);
    }
}

//! Reconciliation engine - converges remote contexts to the desired state
//!
//! Per run:
//! 1. Snapshot existing groups once. Failure here aborts the run.
//! 2. For each desired group, in order: reuse or create it (skip the group if
//!    creation fails), observe its variables (degrade to "none exist" on
//!    failure), then upsert every desired variable, recording each outcome.
//! 3. Report a [`SyncSummary`].
//!
//! Failures below step 1 are isolated to their group or variable.

use crate::events::{EventSink, SyncEvent};
use crate::remote::Remote;
use crate::types::{DesiredState, GroupSpec, GroupTable, Membership, SyncSummary};
use std::collections::BTreeSet;

/// A failure that stops the whole run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not list existing contexts: {0}")]
    GroupListing(#[source] directory::Error),
}

impl SyncError {
    /// What the operator can do about it
    pub fn advice(&self) -> &'static str {
        match self {
            Self::GroupListing(e) => e.category().advice(),
        }
    }
}

/// Apply `desired` through `remote`, reporting every decision to `sink`
///
/// Returns `Err` only when the initial group listing fails; every other
/// failure is counted in the summary.
pub fn reconcile(
    desired: &DesiredState,
    remote: &dyn Remote,
    sink: &mut dyn EventSink,
) -> Result<SyncSummary, SyncError> {
    sink.record(SyncEvent::RunStarted {
        groups: desired.groups().len(),
        variables: desired.total_variables(),
        simulated: remote.is_simulated(),
    });

    let mut table = remote.list_groups().map_err(SyncError::GroupListing)?;
    sink.record(SyncEvent::GroupsListed { count: table.len() });

    let mut summary = SyncSummary::default();
    for group in desired.groups() {
        reconcile_group(group, &mut table, remote, sink, &mut summary);
    }

    sink.record(SyncEvent::RunFinished {
        summary: summary.clone(),
    });
    Ok(summary)
}

/// Converge a single group
fn reconcile_group(
    group: &GroupSpec,
    table: &mut GroupTable,
    remote: &dyn Remote,
    sink: &mut dyn EventSink,
    summary: &mut SyncSummary,
) {
    let Some(id) = resolve_group(&group.name, table, remote, sink, summary) else {
        summary.groups_skipped += 1;
        return;
    };
    summary.groups_processed += 1;

    let existing = match remote.list_variable_names(&id) {
        Ok(membership) => {
            sink.record(SyncEvent::VariablesListed {
                group: group.name.clone(),
                existing: membership.known_len(),
            });
            membership
        }
        Err(e) => {
            sink.record(SyncEvent::VariableListingDegraded {
                group: group.name.clone(),
                reason: e.to_string(),
            });
            summary.listings_degraded += 1;
            Membership::Known(BTreeSet::new())
        }
    };

    for variable in &group.variables {
        let action = existing.classify(&variable.name);
        match remote.upsert_variable(&id, &variable.name, &variable.value) {
            Ok(()) => {
                summary.add_variable(action);
                sink.record(SyncEvent::VariableApplied {
                    group: group.name.clone(),
                    variable: variable.name.clone(),
                    action,
                });
            }
            Err(e) => {
                summary.variables_failed += 1;
                sink.record(SyncEvent::VariableFailed {
                    group: group.name.clone(),
                    variable: variable.name.clone(),
                    action,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Find the group's id, creating the group if the snapshot lacks it
///
/// `table` is written only here, and only after a successful creation.
fn resolve_group(
    name: &str,
    table: &mut GroupTable,
    remote: &dyn Remote,
    sink: &mut dyn EventSink,
    summary: &mut SyncSummary,
) -> Option<String> {
    if let Some(id) = table.get(name) {
        summary.groups_reused += 1;
        sink.record(SyncEvent::GroupFound {
            group: name.to_string(),
            id: id.to_string(),
        });
        return Some(id.to_string());
    }

    sink.record(SyncEvent::GroupMissing {
        group: name.to_string(),
    });
    match remote.create_group(name) {
        Ok(id) => {
            table.insert(name, id.clone());
            summary.groups_created += 1;
            sink.record(SyncEvent::GroupCreated {
                group: name.to_string(),
                id: id.clone(),
            });
            Some(id)
        }
        Err(e) => {
            sink.record(SyncEvent::GroupSkipped {
                group: name.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::remote::{LiveRemote, Simulator};
    use crate::types::{GroupSpec, Variable, VariableAction};
    use directory::MockDirectory;
    use directory::mock::Call;

    fn desired() -> DesiredState {
        DesiredState::new(vec![
            GroupSpec::new(
                "deploy",
                vec![Variable::new("AWS_REGION", "eu-west-1"), Variable::new("REPLICAS", "3")],
            ),
            GroupSpec::new("slack", vec![Variable::new("SLACK_WEBHOOK", "https://hooks")]),
        ])
    }

    fn run(desired: &DesiredState, mock: &MockDirectory) -> (Result<SyncSummary, SyncError>, EventLog) {
        let mut log = EventLog::new();
        let result = reconcile(desired, &LiveRemote::new(mock), &mut log);
        (result, log)
    }

    #[test]
    fn test_first_run_creates_everything() {
        let mock = MockDirectory::new();
        let (result, log) = run(&desired(), &mock);
        let summary = result.unwrap();

        assert_eq!(summary.groups_created, 2);
        assert_eq!(summary.variables_created, 3);
        assert_eq!(summary.variables_updated, 0);
        assert_eq!(mock.value("deploy", "REPLICAS").as_deref(), Some("3"));
        assert_eq!(log.resolved_groups(), vec!["deploy", "slack"]);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let mock = MockDirectory::new();
        run(&desired(), &mock).0.unwrap();
        let creates_after_first = mock.create_calls();
        let upserts_after_first = mock.upsert_calls();

        let summary = run(&desired(), &mock).0.unwrap();

        assert_eq!(mock.create_calls(), creates_after_first);
        assert_eq!(mock.upsert_calls() - upserts_after_first, 3);
        assert_eq!(summary.groups_created, 0);
        assert_eq!(summary.groups_reused, 2);
        assert_eq!(summary.variables_updated, 3);
        assert_eq!(summary.variables_created, 0);
        assert_eq!(mock.groups().len(), 2);
    }

    #[test]
    fn test_classification_uses_existing_names() {
        let mut mock = MockDirectory::new();
        mock.add_group("ci", "ctx-ci");
        mock.add_variable("ctx-ci", "A", "old");
        let desired = DesiredState::new(vec![GroupSpec::new(
            "ci",
            vec![Variable::new("A", "x"), Variable::new("B", "y")],
        )]);

        let (result, log) = run(&desired, &mock);
        result.unwrap();

        assert_eq!(
            log.applied(),
            vec![
                ("ci", "A", VariableAction::Updated),
                ("ci", "B", VariableAction::Created),
            ]
        );
        assert_eq!(mock.upsert_calls(), 2);
        assert_eq!(mock.value("ci", "A").as_deref(), Some("x"));
    }

    #[test]
    fn test_failed_creation_skips_only_that_group() {
        let mut mock = MockDirectory::new();
        mock.fail_create("deploy");

        let (result, log) = run(&desired(), &mock);
        let summary = result.unwrap();

        assert_eq!(summary.groups_skipped, 1);
        assert_eq!(summary.groups_created, 1);
        assert_eq!(summary.variables_created, 1);
        assert_eq!(mock.value("slack", "SLACK_WEBHOOK").as_deref(), Some("https://hooks"));
        assert!(log.events().iter().any(|e| matches!(
            e,
            SyncEvent::GroupSkipped { group, .. } if group == "deploy"
        )));
        assert!(
            mock.calls()
                .iter()
                .all(|c| !matches!(c, Call::Upsert(_, name, _) if name == "AWS_REGION"))
        );
    }

    #[test]
    fn test_initial_listing_failure_is_fatal() {
        let mut mock = MockDirectory::new();
        mock.fail_listing();

        let (result, _) = run(&desired(), &mock);

        let err = result.unwrap_err();
        assert!(matches!(err, SyncError::GroupListing(_)));
        assert_eq!(err.advice(), directory::ErrorCategory::Server.advice());
        assert_eq!(mock.calls(), vec![Call::ListGroups]);
    }

    #[test]
    fn test_variable_listing_failure_degrades_to_created() {
        let mut mock = MockDirectory::new();
        mock.add_group("deploy", "ctx-d");
        mock.add_variable("ctx-d", "AWS_REGION", "us-east-1");
        mock.fail_list_variables("ctx-d");

        let (result, log) = run(&desired(), &mock);
        let summary = result.unwrap();

        assert_eq!(summary.listings_degraded, 1);
        assert!(log.applied().contains(&("deploy", "AWS_REGION", VariableAction::Created)));
        assert_eq!(mock.value("deploy", "AWS_REGION").as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_upsert_failure_does_not_stop_siblings() {
        let mut mock = MockDirectory::new();
        mock.fail_upsert("AWS_REGION");

        let (result, log) = run(&desired(), &mock);
        let summary = result.unwrap();

        assert_eq!(summary.variables_failed, 1);
        assert_eq!(summary.variables_created, 2);
        assert_eq!(summary.failures(), 1);
        assert_eq!(mock.upsert_calls(), 3);
        assert!(log.events().iter().any(|e| matches!(
            e,
            SyncEvent::VariableFailed { variable, .. } if variable == "AWS_REGION"
        )));
    }

    #[test]
    fn test_duplicate_names_upserted_twice() {
        let mock = MockDirectory::new();
        let desired = DesiredState::new(vec![GroupSpec::new(
            "ci",
            vec![Variable::new("A", "first"), Variable::new("A", "second")],
        )]);

        run(&desired, &mock).0.unwrap();

        assert_eq!(mock.upsert_calls(), 2);
        assert_eq!(mock.value("ci", "A").as_deref(), Some("second"));
    }

    #[test]
    fn test_dry_run_reports_everything() {
        let desired = desired();
        let mut log = EventLog::new();

        let summary = reconcile(&desired, &Simulator::new(&desired), &mut log).unwrap();

        assert_eq!(summary.groups_created, 0);
        assert_eq!(summary.groups_reused, 2);
        assert_eq!(summary.variables_ensured, 3);
        assert_eq!(log.resolved_groups(), vec!["deploy", "slack"]);
        assert_eq!(
            log.applied(),
            vec![
                ("deploy", "AWS_REGION", VariableAction::Ensured),
                ("deploy", "REPLICAS", VariableAction::Ensured),
                ("slack", "SLACK_WEBHOOK", VariableAction::Ensured),
            ]
        );
        assert!(matches!(
            log.events()[0],
            SyncEvent::RunStarted { simulated: true, groups: 2, variables: 3 }
        ));
    }

    #[test]
    fn test_events_bracket_the_run() {
        let mock = MockDirectory::new();
        let (result, log) = run(&desired(), &mock);
        let summary = result.unwrap();

        assert!(matches!(log.events().first(), Some(SyncEvent::RunStarted { .. })));
        assert_eq!(
            log.events().last(),
            Some(&SyncEvent::RunFinished { summary })
        );
    }
}

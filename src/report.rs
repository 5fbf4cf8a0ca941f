//! Turns reconciliation events and retry notices into log records

use declarative::{EventSink, SyncEvent, VariableAction};
use directory::RetryCallback;
use log::Level;
use std::time::Duration;

/// Event sink that writes one log record per decision
pub struct LogSink {
    dry_run: bool,
}

impl LogSink {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl EventSink for LogSink {
    fn record(&mut self, event: SyncEvent) {
        if let Some((level, message)) = render(&event) {
            if self.dry_run {
                log::log!(level, "[dry run] {message}");
            } else {
                log::log!(level, "{message}");
            }
        }
    }
}

/// Log level and message for an event, `None` for events not worth a line
pub fn render(event: &SyncEvent) -> Option<(Level, String)> {
    let rendered = match event {
        SyncEvent::RunStarted {
            groups, variables, ..
        } => (
            Level::Info,
            format!("Processing {groups} contexts with {variables} variables"),
        ),
        SyncEvent::GroupsListed { count } => {
            (Level::Debug, format!("Found {count} existing contexts"))
        }
        SyncEvent::GroupFound { group, id } => (
            Level::Info,
            format!("Context '{group}' already exists with ID: {id}"),
        ),
        SyncEvent::GroupMissing { group } => (
            Level::Info,
            format!("Context '{group}' not found, creating it"),
        ),
        SyncEvent::GroupCreated { group, id } => (
            Level::Info,
            format!("Created context '{group}' with ID: {id}"),
        ),
        SyncEvent::GroupSkipped { group, reason } => (
            Level::Warn,
            format!("Skipping context '{group}': could not create it: {reason}"),
        ),
        SyncEvent::VariablesListed {
            group,
            existing: Some(count),
        } => (
            Level::Debug,
            format!("Context '{group}' has {count} existing variables"),
        ),
        SyncEvent::VariablesListed { existing: None, .. } | SyncEvent::RunFinished { .. } => {
            return None;
        }
        SyncEvent::VariableListingDegraded { group, reason } => (
            Level::Warn,
            format!(
                "Could not list variables in context '{group}', treating all as new: {reason}"
            ),
        ),
        SyncEvent::VariableApplied {
            group,
            variable,
            action,
        } => (Level::Info, applied_message(group, variable, *action)),
        SyncEvent::VariableFailed {
            group,
            variable,
            reason,
            ..
        } => (
            Level::Error,
            format!("  -> Failed to set '{variable}' in context '{group}': {reason}"),
        ),
    };
    Some(rendered)
}

fn applied_message(group: &str, variable: &str, action: VariableAction) -> String {
    match action {
        VariableAction::Ensured => {
            format!("  -> Would ensure '{variable}' is set in context '{group}'")
        }
        VariableAction::Created | VariableAction::Updated => {
            format!("  -> {} '{variable}' in context '{group}'", action.label())
        }
    }
}

/// Retry notices as warnings
pub struct LogRetry;

impl RetryCallback for LogRetry {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &directory::Error, delay: Duration) {
        log::warn!(
            "Attempt {attempt}/{max_attempts} failed: {error}. Retrying in {:.1}s...",
            delay.as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::SyncSummary;

    #[test]
    fn test_failures_are_errors() {
        let (level, message) = render(&SyncEvent::VariableFailed {
            group: "deploy".into(),
            variable: "TOKEN".into(),
            action: VariableAction::Created,
            reason: "HTTP 500".into(),
        })
        .unwrap();

        assert_eq!(level, Level::Error);
        assert!(message.contains("'TOKEN'"));
        assert!(message.contains("HTTP 500"));
    }

    #[test]
    fn test_skips_and_degradation_are_warnings() {
        let skipped = render(&SyncEvent::GroupSkipped {
            group: "deploy".into(),
            reason: "forbidden".into(),
        });
        let degraded = render(&SyncEvent::VariableListingDegraded {
            group: "deploy".into(),
            reason: "timeout".into(),
        });

        assert_eq!(skipped.map(|(level, _)| level), Some(Level::Warn));
        assert_eq!(degraded.map(|(level, _)| level), Some(Level::Warn));
    }

    #[test]
    fn test_ensured_reads_as_would() {
        let (level, message) = render(&SyncEvent::VariableApplied {
            group: "deploy".into(),
            variable: "AWS_REGION".into(),
            action: VariableAction::Ensured,
        })
        .unwrap();

        assert_eq!(level, Level::Info);
        assert!(message.contains("Would ensure 'AWS_REGION'"));
    }

    #[test]
    fn test_silent_events() {
        assert!(
            render(&SyncEvent::VariablesListed {
                group: "deploy".into(),
                existing: None,
            })
            .is_none()
        );
        assert!(
            render(&SyncEvent::RunFinished {
                summary: SyncSummary::default(),
            })
            .is_none()
        );
    }
}

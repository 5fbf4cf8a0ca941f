use colored::Colorize;
use declarative::SyncSummary;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print the end-of-run summary
pub fn summary(summary: &SyncSummary, dry_run: bool) {
    header(if dry_run { "Dry run summary" } else { "Sync summary" });
    for (key, value) in summary_rows(summary) {
        kv(key, &value);
    }
    println!();

    if summary.is_success() {
        success(&format!("{} variables applied", summary.variables_applied()));
    } else {
        warn(&format!(
            "{} failures ({} contexts skipped, {} variables failed)",
            summary.failures(),
            summary.groups_skipped,
            summary.variables_failed
        ));
    }
}

/// Labelled counts shown in the summary; zero counts other than the totals are omitted
fn summary_rows(summary: &SyncSummary) -> Vec<(&'static str, String)> {
    let rows = [
        ("Contexts processed", summary.groups_processed, true),
        ("Contexts created", summary.groups_created, false),
        ("Contexts reused", summary.groups_reused, false),
        ("Contexts skipped", summary.groups_skipped, false),
        ("Variables created", summary.variables_created, false),
        ("Variables updated", summary.variables_updated, false),
        ("Variables ensured", summary.variables_ensured, false),
        ("Variables failed", summary.variables_failed, false),
        ("Degraded listings", summary.listings_degraded, false),
    ];

    rows.into_iter()
        .filter(|(_, count, always)| *always || *count > 0)
        .map(|(label, count, _)| (label, count.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rows_skip_zero_counts() {
        let summary = SyncSummary {
            groups_processed: 2,
            groups_created: 1,
            groups_reused: 1,
            variables_updated: 4,
            ..SyncSummary::default()
        };

        let labels: Vec<_> = summary_rows(&summary).into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            labels,
            vec![
                "Contexts processed",
                "Contexts created",
                "Contexts reused",
                "Variables updated"
            ]
        );
    }

    #[test]
    fn test_summary_rows_always_show_processed() {
        let rows = summary_rows(&SyncSummary::default());
        assert_eq!(rows, vec![("Contexts processed", "0".to_string())]);
    }
}

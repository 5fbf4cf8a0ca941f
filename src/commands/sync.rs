//! `ctxsync sync`: converge CircleCI contexts to the YAML document

use anyhow::{Context as _, Result, bail};
use declarative::{DesiredState, LiveRemote, Remote, Simulator, SyncSummary, reconcile};
use directory::{DirectoryClient, HttpTransport, RetryConfig};

use crate::Context;
use crate::cli::SyncArgs;
use crate::config;
use crate::report::{LogRetry, LogSink};
use crate::ui;

/// Credentials and client arguments are checked in every mode, so a dry run
/// fails the same way a live run would. Only the live run sends requests.
pub fn run(ctx: &Context, args: SyncArgs) -> Result<()> {
    let client = connect(&args)?;
    let desired = config::load_document(&args.config)?;

    let summary = if args.dry_run {
        log::warn!("Dry run: no changes will be made to CircleCI");
        apply(&desired, &Simulator::new(&desired))?
    } else {
        apply(&desired, &LiveRemote::new(&client))?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !ctx.quiet {
        ui::summary(&summary, args.dry_run);
    }

    check_strict(&summary, args.strict)
}

fn connect(args: &SyncArgs) -> Result<DirectoryClient> {
    let credentials = config::load_credentials(args.cli_config.as_deref())?;
    log::debug!("Using CircleCI API token from {}", credentials.source);

    let transport = HttpTransport::with_api_base(credentials.token, &args.api_url)
        .context("Failed to initialize CircleCI client")?;
    let client = DirectoryClient::with_transport(transport, &args.org_id)
        .context("Failed to initialize CircleCI client")?
        .with_retry(RetryConfig::with_attempts(args.retries.saturating_add(1)))
        .with_retry_callback(LogRetry);
    Ok(client)
}

/// Reconcile through `remote`, logging every decision
fn apply(desired: &DesiredState, remote: &dyn Remote) -> Result<SyncSummary> {
    let mut sink = LogSink::new(remote.is_simulated());
    reconcile(desired, remote, &mut sink).map_err(|e| {
        let advice = e.advice();
        anyhow::Error::new(e).context(format!("Aborting, nothing was changed. {advice}"))
    })
}

/// Item failures only fail the command in strict mode
fn check_strict(summary: &SyncSummary, strict: bool) -> Result<()> {
    if strict && !summary.is_success() {
        bail!(
            "{} item(s) failed ({} contexts skipped, {} variables failed)",
            summary.failures(),
            summary.groups_skipped,
            summary.variables_failed
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{GroupSpec, Variable};
    use directory::MockDirectory;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const QUIET: Context = Context {
        verbose: 0,
        quiet: true,
    };

    fn sync_args(dir: &Path, org_id: &str) -> SyncArgs {
        let cli_config = dir.join("cli.yml");
        fs::write(&cli_config, "token: file-token\n").unwrap();
        let document = dir.join("contexts.yml");
        fs::write(&document, "deploy:\n  - AWS_REGION: eu-west-1\n").unwrap();

        SyncArgs {
            config: document,
            org_id: org_id.to_string(),
            dry_run: true,
            strict: true,
            json: false,
            api_url: directory::DEFAULT_API_BASE.to_string(),
            retries: 0,
            cli_config: Some(cli_config),
        }
    }

    fn desired() -> DesiredState {
        DesiredState::new(vec![
            GroupSpec::new("deploy", vec![Variable::new("AWS_REGION", "eu-west-1")]),
            GroupSpec::new("slack", vec![Variable::new("SLACK_WEBHOOK", "https://hooks")]),
        ])
    }

    #[test]
    fn test_apply_live() {
        let mut mock = MockDirectory::new();
        mock.add_group("deploy", "ctx-deploy");

        let summary = apply(&desired(), &LiveRemote::new(&mock)).unwrap();

        assert_eq!(summary.groups_reused, 1);
        assert_eq!(summary.groups_created, 1);
        assert_eq!(summary.variables_created, 2);
        assert_eq!(mock.value("slack", "SLACK_WEBHOOK").as_deref(), Some("https://hooks"));
    }

    #[test]
    fn test_apply_dry_run() {
        let desired = desired();
        let summary = apply(&desired, &Simulator::new(&desired)).unwrap();

        assert_eq!(summary.variables_ensured, 2);
        assert_eq!(summary.groups_created, 0);
    }

    #[test]
    fn test_apply_aborts_on_listing_failure() {
        let mut mock = MockDirectory::new();
        mock.fail_listing();

        let err = apply(&desired(), &LiveRemote::new(&mock)).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("could not list existing contexts"));
        assert!(message.contains(directory::ErrorCategory::Server.advice()));
        assert_eq!(mock.upsert_calls(), 0);
    }

    #[test]
    fn test_item_failures_only_fail_strict_runs() {
        let mut mock = MockDirectory::new();
        mock.fail_create("deploy");
        let summary = apply(&desired(), &LiveRemote::new(&mock)).unwrap();

        assert_eq!(summary.failures(), 1);
        assert!(check_strict(&summary, false).is_ok());
        assert!(check_strict(&summary, true).is_err());
        assert!(check_strict(&SyncSummary::default(), true).is_ok());
    }

    #[test]
    fn test_dry_run_rejects_empty_org_id() {
        let dir = TempDir::new().unwrap();
        let args = sync_args(dir.path(), "  ");

        let err = run(&QUIET, args).unwrap_err();

        assert!(err.to_string().contains("Failed to initialize CircleCI client"));
        assert!(format!("{err:#}").contains("organization id"));
    }

    #[test]
    fn test_dry_run_checks_credentials_then_runs_offline() {
        let dir = TempDir::new().unwrap();
        let args = sync_args(dir.path(), "org-123");

        assert!(connect(&args).is_ok());
        assert!(run(&QUIET, args).is_ok());
    }

    #[test]
    fn test_dry_run_rejects_missing_document() {
        let dir = TempDir::new().unwrap();
        let mut args = sync_args(dir.path(), "org-123");
        args.config = PathBuf::from("/nonexistent/contexts.yml");

        assert!(run(&QUIET, args).is_err());
    }
}

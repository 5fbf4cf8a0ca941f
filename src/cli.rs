use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ctxsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declaratively sync CircleCI contexts and their environment variables", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create missing contexts and set every variable from a YAML file
    Sync(SyncArgs),

    /// Check a YAML file without contacting CircleCI
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Path to the YAML file describing contexts and variables
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// CircleCI organization ID (Organization Settings > Overview)
    #[arg(long, env = "CIRCLECI_ORG_ID", value_name = "ID")]
    pub org_id: String,

    /// Show what would be done without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Exit non-zero if any context or variable failed
    #[arg(long)]
    pub strict: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// CircleCI API base URL
    #[arg(long, env = "CIRCLECI_API_URL", default_value = directory::DEFAULT_API_BASE, value_name = "URL")]
    pub api_url: String,

    /// Extra attempts for requests that fail transiently
    #[arg(long, default_value = "2", value_name = "N")]
    pub retries: u32,

    /// CircleCI CLI config holding the API token [default: ~/.circleci/cli.yml]
    #[arg(long, value_name = "FILE")]
    pub cli_config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the YAML file describing contexts and variables
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,
}

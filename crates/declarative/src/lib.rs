//! # Declarative
//!
//! Declarative management of named variable groups (CircleCI contexts).
//!
//! This crate compares a desired state against what the remote service
//! reports and converges the remote by creating missing groups and upserting
//! every desired variable. It never deletes and never compares values.
//!
//! ## Core Concepts
//!
//! - **DesiredState**: ordered groups of `(name, value)` variables, validated
//!   from a YAML document
//! - **RemoteState / Mutator**: read and write capabilities the reconciler
//!   is given; [`LiveRemote`] talks to a [`directory::Directory`],
//!   [`Simulator`] is the dry run
//! - **EventSink**: receives a [`SyncEvent`] at every decision point
//! - **SyncSummary**: per-run counts, including item failures
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{DesiredState, EventLog, LiveRemote, reconcile};
//! use directory::DirectoryClient;
//!
//! let desired = DesiredState::from_yaml_str("deploy:\n  - AWS_REGION: eu-west-1\n").unwrap();
//! let client = DirectoryClient::new("my-token", "my-org-id").unwrap();
//!
//! let mut events = EventLog::new();
//! let summary = reconcile(&desired, &LiveRemote::new(&client), &mut events).unwrap();
//! println!("{} variables applied", summary.variables_applied());
//! ```

pub mod document;
pub mod events;
pub mod reconciler;
pub mod remote;
pub mod types;

// Re-export main types at crate root
pub use document::DocumentError;
pub use events::{EventLog, EventSink, SyncEvent};
pub use reconciler::{SyncError, reconcile};
pub use remote::{LiveRemote, Mutator, Remote, RemoteState, Simulator};
pub use types::{
    DesiredState, GroupSpec, GroupTable, Membership, SyncSummary, Variable, VariableAction,
};

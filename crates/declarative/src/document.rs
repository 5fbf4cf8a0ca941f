//! Desired-state document loading
//!
//! The document is a YAML mapping from context name to a list of
//! single-entry mappings:
//!
//! ```yaml
//! deploy-prod:
//!   - AWS_REGION: eu-west-1
//!   - REPLICAS: 3
//! slack:
//!   - SLACK_WEBHOOK: https://hooks.slack.com/services/T000/B000/XXX
//! ```
//!
//! The whole shape is checked before a [`DesiredState`] exists, so nothing
//! downstream ever sees a malformed document.

use crate::types::{DesiredState, GroupSpec, Variable};
use serde_yaml::Value;

/// Shape errors in a desired-state document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document is empty: nothing to sync")]
    Empty,

    #[error("document root must be a mapping of context names to variable lists, found a {found}")]
    RootNotMapping { found: &'static str },

    #[error("context names must be non-empty strings, found {found}")]
    InvalidGroupName { found: String },

    #[error("context '{group}' must be a list of single-entry mappings, found a {found}")]
    GroupNotList { group: String, found: &'static str },

    #[error(
        "context '{group}', item {index}: each variable must be a mapping with exactly one key, found {found}"
    )]
    InvalidItem {
        group: String,
        index: usize,
        found: String,
    },

    #[error("context '{group}', item {index}: variable names must be non-empty scalars")]
    InvalidVariableName { group: String, index: usize },

    #[error("context '{group}', variable '{variable}': a {found} value cannot be sent as text")]
    UnsupportedValue {
        group: String,
        variable: String,
        found: &'static str,
    },
}

impl DesiredState {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        if content.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed YAML value
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        let root = match value {
            Value::Mapping(root) => root,
            Value::Null => return Err(DocumentError::Empty),
            other => {
                return Err(DocumentError::RootNotMapping {
                    found: kind(other),
                });
            }
        };
        if root.is_empty() {
            return Err(DocumentError::Empty);
        }

        let mut groups = Vec::with_capacity(root.len());
        for (key, entries) in root {
            let name = match key {
                Value::String(s) if !s.trim().is_empty() => s.clone(),
                other => {
                    return Err(DocumentError::InvalidGroupName {
                        found: describe(other),
                    });
                }
            };
            let variables = parse_group(&name, entries)?;
            groups.push(GroupSpec::new(name, variables));
        }

        Ok(DesiredState::new(groups))
    }
}

fn parse_group(group: &str, entries: &Value) -> Result<Vec<Variable>, DocumentError> {
    let Value::Sequence(items) = entries else {
        return Err(DocumentError::GroupNotList {
            group: group.to_string(),
            found: kind(entries),
        });
    };

    let mut variables = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let index = i + 1;
        let entry = match item {
            Value::Mapping(map) if map.len() == 1 => map.iter().next(),
            other => {
                return Err(DocumentError::InvalidItem {
                    group: group.to_string(),
                    index,
                    found: describe(other),
                });
            }
        };
        let Some((key, value)) = entry else {
            continue;
        };

        let name = match key {
            Value::String(s) if s.trim().is_empty() => None,
            scalar => coerce_text(scalar),
        }
        .ok_or_else(|| DocumentError::InvalidVariableName {
            group: group.to_string(),
            index,
        })?;
        let value = coerce_text(value).ok_or_else(|| DocumentError::UnsupportedValue {
            group: group.to_string(),
            variable: name.clone(),
            found: kind(value),
        })?;

        variables.push(Variable::new(name, value));
    }

    Ok(variables)
}

/// Text sent to the API for a scalar: strings verbatim, numbers as written,
/// booleans capitalized (`True`/`False`)
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Mapping(map) => format!("a mapping with {} keys", map.len()),
        other => format!("a {}", kind(other)),
    }
}

//! Credential lookup and desired-state document loading

use anyhow::{Context, Result};
use declarative::DesiredState;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted when the CLI config has no token
pub const TOKEN_ENV_VAR: &str = "CI_TOKEN";

/// Default location of the CircleCI CLI config: ~/.circleci/cli.yml
pub fn circleci_cli_config() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".circleci").join("cli.yml"))
}

/// The subset of the CircleCI CLI config we read
#[derive(Debug, Default, Deserialize)]
struct CliConfigFile {
    #[serde(default)]
    token: Option<String>,
}

/// Where a token came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    File(PathBuf),
    Env,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Env => write!(f, "${TOKEN_ENV_VAR}"),
        }
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub token: String,
    pub source: TokenSource,
}

/// Find an API token: the CLI config file first, then the environment
///
/// A file that cannot be read or parsed is reported and skipped.
pub fn resolve_token(
    cli_config: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<Credentials> {
    if let Some(path) = cli_config.filter(|p| p.exists()) {
        match read_token_file(path) {
            Ok(Some(token)) => {
                return Some(Credentials {
                    token,
                    source: TokenSource::File(path.to_path_buf()),
                });
            }
            Ok(None) => log::debug!("No token in {}", path.display()),
            Err(e) => log::warn!("Ignoring CircleCI CLI config: {e:#}"),
        }
    }

    non_blank(env(TOKEN_ENV_VAR)).map(|token| Credentials {
        token,
        source: TokenSource::Env,
    })
}

/// Resolve credentials for a live run
pub fn load_credentials(cli_config: Option<&Path>) -> Result<Credentials> {
    let path = cli_config.map(Path::to_path_buf).or_else(circleci_cli_config);
    let location = path
        .as_ref()
        .map_or_else(|| "~/.circleci/cli.yml".to_string(), |p| p.display().to_string());

    resolve_token(path.as_deref(), |key| std::env::var(key).ok()).with_context(|| {
        format!(
            "CircleCI API token not found. Set 'token' in {location} or export {TOKEN_ENV_VAR}"
        )
    })
}

fn read_token_file(path: &Path) -> Result<Option<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let parsed: CliConfigFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Could not parse {}", path.display()))?;
    Ok(non_blank(parsed.token))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and validate the desired-state document
pub fn load_document(path: &Path) -> Result<DesiredState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read configuration file {}", path.display()))?;
    DesiredState::from_yaml_str(&content)
        .with_context(|| format!("Invalid configuration file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_token(key: &str) -> Option<String> {
        (key == TOKEN_ENV_VAR).then(|| "env-token".to_string())
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_token_from_cli_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "cli.yml",
            "host: https://circleci.com\ntoken: file-token\n",
        );

        let creds = resolve_token(Some(&path), env_token).unwrap();
        assert_eq!(creds.token, "file-token");
        assert_eq!(creds.source, TokenSource::File(path));
    }

    #[test]
    fn test_env_fallback_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");

        let creds = resolve_token(Some(&path), env_token).unwrap();
        assert_eq!(creds.token, "env-token");
        assert_eq!(creds.source, TokenSource::Env);
    }

    #[test]
    fn test_env_fallback_when_file_has_no_token() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "cli.yml", "host: https://circleci.com\ntoken: \"  \"\n");

        let creds = resolve_token(Some(&path), env_token).unwrap();
        assert_eq!(creds.source, TokenSource::Env);
    }

    #[test]
    fn test_malformed_file_falls_through() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "cli.yml", "token: [unterminated\n");

        let creds = resolve_token(Some(&path), env_token).unwrap();
        assert_eq!(creds.token, "env-token");
    }

    #[test]
    fn test_no_token_anywhere() {
        assert!(resolve_token(None, no_env).is_none());
    }

    #[test]
    fn test_blank_env_token_ignored() {
        let blank = |_: &str| Some("   ".to_string());
        assert!(resolve_token(None, blank).is_none());
    }

    #[test]
    fn test_load_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "contexts.yml", "deploy:\n  - REPLICAS: 3\n");

        let desired = load_document(&path).unwrap();
        assert_eq!(desired.groups()[0].variables[0].value, "3");
    }

    #[test]
    fn test_load_document_names_file_on_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "contexts.yml", "- deploy\n");

        let err = load_document(&path).unwrap_err();
        assert!(format!("{err:#}").contains("contexts.yml"));
    }

    #[test]
    fn test_load_document_missing_file() {
        let err = load_document(Path::new("/nonexistent/contexts.yml")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }
}

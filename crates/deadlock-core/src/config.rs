use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::ErrorCode;

/// How `remove_edge` treats an edge that has no stored copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Removing a missing edge is a silent no-op.
    #[default]
    Lenient,
    /// Removing a missing edge fails with `EdgeNotFound`.
    Strict,
}

impl RemovalPolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lenient" => Some(Self::Lenient),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Behaviour switches captured by a graph at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub removal: RemovalPolicy,
    /// Only accept edges between a process and a resource.
    #[serde(default)]
    pub enforce_bipartite: bool,
}

/// On-disk layout of `deadlock.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub graph: GraphConfig,
}

impl ConfigFile {
    /// Parse a config document held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML for this layout.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .with_context(|| format!("{}: failed to parse config", ErrorCode::ConfigParseError))
    }
}

/// Load `path`, falling back to defaults when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ConfigFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ConfigFile>(&content).with_context(|| {
        format!(
            "{}: failed to parse {}",
            ErrorCode::ConfigParseError,
            path.display()
        )
    })
}

/// Load `path` and apply the `DEADLOCK_REMOVAL` environment override.
///
/// # Errors
///
/// Returns an error if loading fails or the override is not a known policy.
pub fn resolve_config(path: &Path) -> Result<GraphConfig> {
    let file = load_config(path)?;
    apply_env_override(file.graph, env::var("DEADLOCK_REMOVAL").ok().as_deref())
}

fn apply_env_override(mut config: GraphConfig, removal_env: Option<&str>) -> Result<GraphConfig> {
    if let Some(raw) = removal_env {
        let Some(policy) = RemovalPolicy::parse(raw) else {
            bail!(
                "{}: invalid DEADLOCK_REMOVAL value '{raw}'. Expected one of: lenient, strict",
                ErrorCode::ConfigEnvInvalid
            );
        };
        config.removal = policy;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let file = ConfigFile::from_toml_str("").expect("parse empty");
        assert_eq!(file, ConfigFile::default());
        assert_eq!(file.graph.removal, RemovalPolicy::Lenient);
        assert!(!file.graph.enforce_bipartite);
    }

    #[test]
    fn graph_table_is_parsed() {
        let file = ConfigFile::from_toml_str(
            "[graph]\nremoval = \"strict\"\nenforce_bipartite = true\n",
        )
        .expect("parse");
        assert_eq!(file.graph.removal, RemovalPolicy::Strict);
        assert!(file.graph.enforce_bipartite);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = ConfigFile::from_toml_str("[graph]\nremoval = \"sometimes\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = load_config(&dir.path().join("deadlock.toml")).expect("load");
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deadlock.toml");
        let mut f = std::fs::File::create(&path).expect("create");
        writeln!(f, "[graph\nremoval = ").expect("write");

        let err = load_config(&path).expect_err("should fail");
        let msg = format!("{err:#}");
        assert!(msg.contains("deadlock.toml"), "error should name the file: {msg}");
        assert!(msg.starts_with("E1002"), "msg: {msg}");
    }

    #[test]
    fn env_override_replaces_removal_policy() {
        let config = apply_env_override(GraphConfig::default(), Some(" Strict ")).expect("apply");
        assert_eq!(config.removal, RemovalPolicy::Strict);

        let unchanged = apply_env_override(config, None).expect("apply");
        assert_eq!(unchanged.removal, RemovalPolicy::Strict);
    }

    #[test]
    fn env_override_rejects_unknown_value() {
        let err = apply_env_override(GraphConfig::default(), Some("loose"))
            .expect_err("should reject");
        let msg = err.to_string();
        assert!(msg.contains("DEADLOCK_REMOVAL"), "msg: {msg}");
        assert!(msg.starts_with("E1004"), "msg: {msg}");
        assert!(!msg.contains("E1002"), "msg: {msg}");
    }
}

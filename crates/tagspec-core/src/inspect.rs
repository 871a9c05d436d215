//! Inspection collaborator seam.
//!
//! The applier never talks to a registry itself. It hands each image
//! reference to an [`Inspector`] and decodes the returned payload as an
//! [`InspectionResult`]. [`CommandInspector`] is the production backend: it
//! runs an external inspection program (`skopeo inspect` by default) and
//! returns its stdout. In-memory fakes live in [`crate::fakes`].

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::InspectError;

/// Environment variable naming the inspection program.
pub const ENV_INSPECT_PROGRAM: &str = "TAGSPEC_INSPECT_PROGRAM";
/// Environment variable holding whitespace-separated program arguments.
pub const ENV_INSPECT_ARGS: &str = "TAGSPEC_INSPECT_ARGS";
/// Environment variable holding the per-image timeout in seconds.
pub const ENV_INSPECT_TIMEOUT_SECS: &str = "TAGSPEC_INSPECT_TIMEOUT_SECS";

/// Decoded inspection output for a single image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InspectionResult {
    /// Tags currently published for the image.
    #[serde(default)]
    pub repo_tags: Vec<String>,

    /// Repository name as resolved by the inspector; logged only.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub digest: Option<String>,
}

impl InspectionResult {
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Exact-match membership test.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.repo_tags.iter().any(|t| t == tag)
    }
}

/// Given an image reference, return the raw inspection payload.
///
/// Implementations are called exactly once per image per run and must not
/// retry on the applier's behalf.
#[async_trait]
pub trait Inspector: Send + Sync {
    async fn inspect(&self, reference: &str) -> Result<Vec<u8>, InspectError>;
}

#[async_trait]
impl<T: Inspector + ?Sized> Inspector for Arc<T> {
    async fn inspect(&self, reference: &str) -> Result<Vec<u8>, InspectError> {
        (**self).inspect(reference).await
    }
}

/// How to invoke the external inspection program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig {
    /// Executable to run.
    pub program: String,

    /// Arguments placed before the image reference.
    pub args: Vec<String>,

    /// Per-image timeout; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            program: "skopeo".to_string(),
            args: vec!["inspect".to_string()],
            timeout_secs: 0,
        }
    }
}

impl InspectorConfig {
    /// Load from `TAGSPEC_INSPECT_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let program = lookup(ENV_INSPECT_PROGRAM)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.program);
        let args = lookup(ENV_INSPECT_ARGS)
            .map(|a| a.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.args);
        let timeout_secs = lookup(ENV_INSPECT_TIMEOUT_SECS)
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            program,
            args,
            timeout_secs,
        }
    }
}

/// Inspector backed by an external program.
#[derive(Debug, Clone, Default)]
pub struct CommandInspector {
    config: InspectorConfig,
}

impl CommandInspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }
}

#[async_trait]
impl Inspector for CommandInspector {
    async fn inspect(&self, reference: &str) -> Result<Vec<u8>, InspectError> {
        debug!(
            program = %self.config.program,
            reference = %reference,
            "running inspection program"
        );

        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(reference)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InspectError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let wait = child.wait_with_output();
        let waited = if self.config.timeout_secs > 0 {
            tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), wait)
                .await
                .map_err(|_| InspectError::Timeout {
                    reference: reference.to_string(),
                    secs: self.config.timeout_secs,
                })?
        } else {
            wait.await
        };
        let output = waited.map_err(|source| InspectError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(InspectError::CommandFailed {
                reference: reference.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_decode_skopeo_style_output() {
        let payload = br#"{
            "Name": "docker.io/library/alpine",
            "Digest": "sha256:abc",
            "RepoTags": ["3.18", "latest"],
            "Architecture": "amd64"
        }"#;
        let result = InspectionResult::from_json(payload).unwrap();

        assert!(result.has_tag("latest"));
        assert!(!result.has_tag("edge"));
        assert_eq!(result.name.as_deref(), Some("docker.io/library/alpine"));
        assert_eq!(result.digest.as_deref(), Some("sha256:abc"));
    }

    #[test]
    fn test_missing_repo_tags_is_empty() {
        let result = InspectionResult::from_json(b"{}").unwrap();
        assert!(result.repo_tags.is_empty());
        assert!(!result.has_tag(""));
    }

    #[test]
    fn test_non_json_payload_fails() {
        assert!(InspectionResult::from_json(b"not json").is_err());
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = InspectorConfig::from_lookup(|_| None);
        assert_eq!(config, InspectorConfig::default());
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_INSPECT_PROGRAM, "/usr/local/bin/skopeo"),
            (ENV_INSPECT_ARGS, "--override-os linux inspect"),
            (ENV_INSPECT_TIMEOUT_SECS, "30"),
        ]);
        let config = InspectorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.program, "/usr/local/bin/skopeo");
        assert_eq!(config.args, vec!["--override-os", "linux", "inspect"]);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_ignores_bad_timeout() {
        let config = InspectorConfig::from_lookup(|k| {
            (k == ENV_INSPECT_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert_eq!(config.timeout_secs, 0);
    }

    #[tokio::test]
    async fn test_command_inspector_returns_stdout() {
        let inspector = CommandInspector::new(InspectorConfig {
            program: "echo".to_string(),
            args: vec![],
            timeout_secs: 10,
        });

        let out = inspector.inspect("img-a").await.expect("inspect failed");
        assert_eq!(String::from_utf8_lossy(&out).trim(), "img-a");
    }

    #[tokio::test]
    async fn test_command_inspector_non_zero_exit() {
        let inspector = CommandInspector::new(InspectorConfig {
            program: "false".to_string(),
            args: vec![],
            timeout_secs: 0,
        });

        let err = inspector.inspect("img-a").await.unwrap_err();
        assert!(matches!(err, InspectError::CommandFailed { ref reference, .. } if reference == "img-a"));
    }

    #[tokio::test]
    async fn test_command_inspector_missing_program() {
        let inspector = CommandInspector::new(InspectorConfig {
            program: "tagspec-no-such-program".to_string(),
            args: vec![],
            timeout_secs: 0,
        });

        let err = inspector.inspect("img-a").await.unwrap_err();
        assert!(matches!(err, InspectError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_command_inspector_timeout() {
        let inspector = CommandInspector::new(InspectorConfig {
            program: "sleep".to_string(),
            args: vec![],
            timeout_secs: 1,
        });

        // `sleep 5` via the reference argument
        let err = inspector.inspect("5").await.unwrap_err();
        assert!(matches!(err, InspectError::Timeout { secs: 1, .. }));
    }
}

//! Spec document model.
//!
//! A spec declares the images to reconcile and the tag policy they must
//! satisfy. Field names are PascalCase on the wire:
//!
//! ```yaml
//! Kind: ImageSpec
//! ApiVersion: v1beta1
//! Policy:
//!   Tag: latest
//!   Enforcing: true
//! Images:
//!   - docker://docker.io/library/ubuntu
//! ```
//!
//! The model carries no validation of its own; [`crate::apply::SpecApplier`]
//! checks kind, api version and policy presence before reconciling.

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::inspect::InspectionResult;

/// Document kind understood by this version.
pub const KIND: &str = "ImageSpec";

/// Document schema version understood by this version.
pub const API_VERSION: &str = "v1beta1";

/// The (kind, api version) pair an applier accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion {
    pub kind: String,
    pub api_version: String,
}

impl SchemaVersion {
    /// Built-in constants of this version.
    pub fn current() -> Self {
        Self::new(KIND, API_VERSION)
    }

    pub fn new(kind: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            api_version: api_version.into(),
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

/// Reconciliation document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Spec {
    /// Document type tag.
    #[serde(default)]
    pub kind: String,

    /// Document schema version.
    #[serde(default)]
    pub api_version: String,

    /// Tag policy applied to every image. `None` is rejected at apply time.
    #[serde(default)]
    pub policy: Option<Policy>,

    /// Image references, reconciled in this order.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Spec {
    /// Decode a YAML document.
    pub fn from_yaml(raw: &[u8]) -> Result<Self, SpecError> {
        serde_yaml::from_slice(raw).map_err(SpecError::Decode)
    }

    /// Render as a YAML document.
    pub fn to_yaml(&self) -> Result<String, SpecError> {
        serde_yaml::to_string(self).map_err(SpecError::Encode)
    }
}

/// Enforce presence of a certain tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    /// Tag that must be published for each image.
    #[serde(default)]
    pub tag: String,

    /// When false, every image passes without a check.
    #[serde(default)]
    pub enforcing: bool,
}

impl Policy {
    pub fn new(tag: impl Into<String>, enforcing: bool) -> Self {
        Self {
            tag: tag.into(),
            enforcing,
        }
    }

    /// Whether an image with the given inspection result satisfies this policy.
    pub fn admits(&self, result: &InspectionResult) -> bool {
        !self.enforcing || result.has_tag(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(tags: &[&str]) -> InspectionResult {
        InspectionResult {
            repo_tags: tags.iter().map(|t| t.to_string()).collect(),
            ..InspectionResult::default()
        }
    }

    #[test]
    fn test_decode_pascal_case_document() {
        let raw = b"Kind: ImageSpec\nApiVersion: v1beta1\nPolicy:\n  Tag: v1\n  Enforcing: true\nImages:\n  - img-a\n  - img-b\n";
        let spec = Spec::from_yaml(raw).unwrap();

        assert_eq!(spec.kind, KIND);
        assert_eq!(spec.api_version, API_VERSION);
        assert_eq!(spec.policy, Some(Policy::new("v1", true)));
        assert_eq!(spec.images, vec!["img-a".to_string(), "img-b".to_string()]);
    }

    #[test]
    fn test_missing_fields_decode_to_defaults() {
        let spec = Spec::from_yaml(b"Kind: ImageSpec\n").unwrap();
        assert_eq!(spec.api_version, "");
        assert!(spec.policy.is_none());
        assert!(spec.images.is_empty());
    }

    #[test]
    fn test_null_policy_decodes_to_none() {
        let spec = Spec::from_yaml(b"Kind: ImageSpec\nPolicy: null\n").unwrap();
        assert!(spec.policy.is_none());
    }

    #[test]
    fn test_malformed_document_is_decode_error() {
        let err = Spec::from_yaml(b"Images: [unterminated").unwrap_err();
        assert!(matches!(err, SpecError::Decode(_)));
    }

    #[test]
    fn test_policy_admits_when_tag_present() {
        let policy = Policy::new("v1", true);
        assert!(policy.admits(&result_with(&["v2", "v1"])));
        assert!(!policy.admits(&result_with(&["v2"])));
    }

    #[test]
    fn test_policy_tag_match_is_exact() {
        let policy = Policy::new("v1", true);
        assert!(!policy.admits(&result_with(&["v1.0", "V1", " v1"])));
    }

    #[test]
    fn test_non_enforcing_policy_admits_everything() {
        let policy = Policy::new("v1", false);
        assert!(policy.admits(&result_with(&[])));
        assert!(policy.admits(&result_with(&["other"])));
    }

    #[test]
    fn test_schema_version_current() {
        let schema = SchemaVersion::current();
        assert_eq!(schema.kind, KIND);
        assert_eq!(schema.api_version, API_VERSION);
        assert_eq!(schema, SchemaVersion::default());
    }
}

//! Spec apply: reconcile declared images against their published tags.
//!
//! Order of operations for one run:
//! 1. decode the document,
//! 2. check kind, then api version, then that a policy is present,
//! 3. for each image in declared order: inspect, decode the payload, write a
//!    progress line, check the policy.
//!
//! The first error ends the run. In particular a policy violation on one
//! image means no later image is inspected.

use std::io::Write;
use std::path::Path;

use tracing::Instrument;

use crate::error::{ApplyError, ApplyResult};
use crate::inspect::{InspectionResult, Inspector};
use crate::obs;
use crate::spec::{Policy, SchemaVersion, Spec};

/// Per-image outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    pub image: String,

    /// Digest reported by the inspector, if any.
    pub digest: Option<String>,

    /// False when the policy was not enforcing and the tag was never checked.
    pub checked: bool,
}

/// Report of a run in which every image satisfied the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub images: Vec<ImageOutcome>,
    pub enforcing: bool,
}

impl ApplyReport {
    pub fn checked_count(&self) -> usize {
        self.images.iter().filter(|i| i.checked).count()
    }
}

/// Reconciles spec documents using an [`Inspector`].
///
/// Holds no state between runs, so applying the same document against the
/// same remote state always yields the same outcome.
pub struct SpecApplier<I> {
    inspector: I,
    schema: SchemaVersion,
}

impl<I: Inspector> SpecApplier<I> {
    /// Create an applier accepting [`SchemaVersion::current`].
    pub fn new(inspector: I) -> Self {
        Self {
            inspector,
            schema: SchemaVersion::current(),
        }
    }

    /// Accept a different (kind, api version) pair.
    pub fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &SchemaVersion {
        &self.schema
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    /// Check kind, api version and policy presence, in that order.
    pub fn validate<'a>(&self, spec: &'a Spec) -> ApplyResult<&'a Policy> {
        if spec.kind != self.schema.kind {
            return Err(ApplyError::KindMismatch {
                expected: self.schema.kind.clone(),
                found: spec.kind.clone(),
            });
        }

        if spec.api_version != self.schema.api_version {
            return Err(ApplyError::ApiVersionMismatch {
                expected: self.schema.api_version.clone(),
                found: spec.api_version.clone(),
            });
        }

        spec.policy.as_ref().ok_or(ApplyError::MissingPolicy)
    }

    /// Read a spec file and apply it.
    pub async fn apply_file<W: Write>(
        &self,
        path: &Path,
        progress: &mut W,
    ) -> ApplyResult<ApplyReport> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|source| ApplyError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.apply(&raw, progress).await
    }

    /// Decode raw document bytes and apply them.
    ///
    /// One line holding the image reference is written to `progress` for each
    /// image, after it was inspected and before its policy check.
    pub async fn apply<W: Write>(&self, raw: &[u8], progress: &mut W) -> ApplyResult<ApplyReport> {
        let spec = Spec::from_yaml(raw)?;
        self.apply_spec(&spec, progress).await
    }

    /// Apply an already decoded spec.
    pub async fn apply_spec<W: Write>(
        &self,
        spec: &Spec,
        progress: &mut W,
    ) -> ApplyResult<ApplyReport> {
        let policy = self.validate(spec)?;

        let span = obs::apply_span(spec.images.len());
        async {
            obs::emit_apply_started(&spec.kind, &spec.api_version, &policy.tag, policy.enforcing);

            let mut outcomes = Vec::with_capacity(spec.images.len());
            let result = self
                .reconcile(&spec.images, policy, progress, &mut outcomes)
                .await;
            obs::emit_apply_finished(outcomes.len(), result.is_ok());

            result.map(|()| ApplyReport {
                images: outcomes,
                enforcing: policy.enforcing,
            })
        }
        .instrument(span)
        .await
    }

    async fn reconcile<W: Write>(
        &self,
        images: &[String],
        policy: &Policy,
        progress: &mut W,
        outcomes: &mut Vec<ImageOutcome>,
    ) -> ApplyResult<()> {
        for image in images {
            let payload = self.inspector.inspect(image).await?;
            let result = InspectionResult::from_json(&payload).map_err(|source| {
                ApplyError::InspectionDecode {
                    image: image.clone(),
                    source,
                }
            })?;

            writeln!(progress, "{}", image).map_err(ApplyError::Progress)?;
            progress.flush().map_err(ApplyError::Progress)?;

            let passed = policy.admits(&result);
            obs::emit_image_inspected(
                image,
                result.name.as_deref(),
                result.digest.as_deref(),
                result.repo_tags.len(),
                passed,
            );

            if !passed {
                obs::emit_policy_violation(image, &policy.tag);
                return Err(ApplyError::PolicyViolation {
                    tag: policy.tag.clone(),
                    image: image.clone(),
                });
            }

            outcomes.push(ImageOutcome {
                image: image.clone(),
                digest: result.digest,
                checked: policy.enforcing,
            });
        }

        Ok(())
    }
}

//! Structured observability hooks for the apply loop.
//!
//! Events are emitted with an `event` field so they can be filtered in JSON
//! log output.

use tracing::{info, warn};

/// Span covering one apply run; attach with `tracing::Instrument`.
pub fn apply_span(image_count: usize) -> tracing::Span {
    tracing::info_span!("tagspec.apply", images = image_count)
}

pub fn emit_apply_started(kind: &str, api_version: &str, tag: &str, enforcing: bool) {
    info!(
        event = "apply.started",
        kind = %kind,
        api_version = %api_version,
        tag = %tag,
        enforcing = enforcing,
    );
}

/// Emit event: one image inspected and checked against the policy.
pub fn emit_image_inspected(
    image: &str,
    name: Option<&str>,
    digest: Option<&str>,
    tags: usize,
    passed: bool,
) {
    info!(
        event = "apply.image_inspected",
        image = %image,
        name = %name.unwrap_or("-"),
        digest = %digest.unwrap_or("-"),
        tags = tags,
        passed = passed,
    );
}

pub fn emit_policy_violation(image: &str, tag: &str) {
    warn!(event = "apply.policy_violation", image = %image, tag = %tag);
}

/// Emit event: apply finished, either after every image or at the first error.
pub fn emit_apply_finished(images_passed: usize, success: bool) {
    info!(
        event = "apply.finished",
        images_passed = images_passed,
        success = success,
    );
}

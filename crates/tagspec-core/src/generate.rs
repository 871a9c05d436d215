//! Example spec generation.

use crate::error::SpecError;
use crate::spec::{Policy, Spec, API_VERSION, KIND};

const EXAMPLE_TAG: &str = "latest";

const EXAMPLE_IMAGES: [&str; 3] = [
    "docker://docker.io/library/ubuntu",
    "docker://docker.io/library/fedora",
    "docker://docker.io/library/alpine",
];

/// Build the canonical example spec used to bootstrap new documents.
///
/// Always returns the same value.
pub fn generate() -> Spec {
    Spec {
        kind: KIND.to_string(),
        api_version: API_VERSION.to_string(),
        policy: Some(Policy::new(EXAMPLE_TAG, true)),
        images: EXAMPLE_IMAGES.iter().map(|i| i.to_string()).collect(),
    }
}

/// Render [`generate`] as YAML.
pub fn render_example() -> Result<String, SpecError> {
    generate().to_yaml()
}

//! Error types for tagspec-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while encoding or decoding a spec document
#[derive(Error, Debug)]
pub enum SpecError {
    /// Document bytes are not a valid spec
    #[error("failed to decode spec document: {0}")]
    Decode(#[source] serde_yaml::Error),

    /// Spec could not be rendered
    #[error("failed to encode spec document: {0}")]
    Encode(#[source] serde_yaml::Error),
}

/// Errors raised by an inspection backend
#[derive(Error, Debug)]
pub enum InspectError {
    /// Inspection program could not be started
    #[error("failed to run inspection program {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Inspection program exited unsuccessfully
    #[error("inspection of {reference} failed (exit code {code}): {stderr}")]
    CommandFailed {
        reference: String,
        code: i32,
        stderr: String,
    },

    /// Inspection program did not finish in time
    #[error("inspection of {reference} timed out after {secs} seconds")]
    Timeout { reference: String, secs: u64 },

    /// Backend could not resolve the reference
    #[error("inspection of {reference} failed: {message}")]
    Unavailable { reference: String, message: String },
}

/// Errors that end a spec apply run
///
/// Every variant is terminal: the first one hit is returned and no later
/// image is inspected.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// Spec file could not be read
    #[error("failed to read spec file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spec document did not decode
    #[error(transparent)]
    Decode(#[from] SpecError),

    /// Document kind is not recognized
    #[error("invalid spec, incorrect kind: expected {expected:?}, found {found:?}")]
    KindMismatch { expected: String, found: String },

    /// Document api version is not recognized
    #[error("invalid spec, incorrect api version: expected {expected:?}, found {found:?}")]
    ApiVersionMismatch { expected: String, found: String },

    /// Document has no policy
    #[error("invalid spec, missing policy")]
    MissingPolicy,

    /// Inspection backend failed
    #[error(transparent)]
    Inspect(#[from] InspectError),

    /// Inspection output was not understood
    #[error("failed to decode inspection output for image {image}: {source}")]
    InspectionDecode {
        image: String,
        #[source]
        source: serde_json::Error,
    },

    /// Required tag is not published for an image
    #[error("expected tag:{tag}, which was not found upstream for image:{image}")]
    PolicyViolation { tag: String, image: String },

    /// Progress line could not be written
    #[error("failed to write progress: {0}")]
    Progress(#[source] std::io::Error),
}

/// Result type for apply operations
pub type ApplyResult<T> = std::result::Result<T, ApplyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violation_names_tag_and_image() {
        let err = ApplyError::PolicyViolation {
            tag: "v1".to_string(),
            image: "img-b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "expected tag:v1, which was not found upstream for image:img-b"
        );
    }

    #[test]
    fn test_kind_mismatch_message() {
        let err = ApplyError::KindMismatch {
            expected: "ImageSpec".to_string(),
            found: "OtherKind".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("incorrect kind"));
        assert!(msg.contains("OtherKind"));
    }

    #[test]
    fn test_inspect_error_is_transparent() {
        let err = ApplyError::from(InspectError::Unavailable {
            reference: "img-a".to_string(),
            message: "manifest unknown".to_string(),
        });
        assert_eq!(err.to_string(), "inspection of img-a failed: manifest unknown");
    }
}

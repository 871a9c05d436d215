//! In-memory fakes for the inspection seam (testing only)
//!
//! `StubInspector` answers from a fixed table and records every call in
//! order, so tests can assert exactly which images were inspected.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::InspectError;
use crate::inspect::{InspectionResult, Inspector};

#[derive(Debug, Clone)]
enum StubResponse {
    Tags(Vec<String>),
    Payload(Vec<u8>),
    Failure(String),
}

/// Deterministic inspector backed by a `HashMap<reference, response>`.
///
/// References without a stubbed response fail with
/// [`InspectError::Unavailable`].
#[derive(Debug, Default)]
pub struct StubInspector {
    responses: HashMap<String, StubResponse>,
    calls: Mutex<Vec<String>>,
}

impl StubInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `tags` for `reference`.
    pub fn with_tags(mut self, reference: &str, tags: &[&str]) -> Self {
        self.responses.insert(
            reference.to_string(),
            StubResponse::Tags(tags.iter().map(|t| t.to_string()).collect()),
        );
        self
    }

    /// Return `payload` verbatim for `reference`.
    pub fn with_payload(mut self, reference: &str, payload: Vec<u8>) -> Self {
        self.responses
            .insert(reference.to_string(), StubResponse::Payload(payload));
        self
    }

    /// Fail inspection of `reference` with `message`.
    pub fn with_failure(mut self, reference: &str, message: &str) -> Self {
        self.responses.insert(
            reference.to_string(),
            StubResponse::Failure(message.to_string()),
        );
        self
    }

    /// References inspected so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Inspector for StubInspector {
    async fn inspect(&self, reference: &str) -> Result<Vec<u8>, InspectError> {
        self.calls.lock().unwrap().push(reference.to_string());

        let unavailable = |message: String| InspectError::Unavailable {
            reference: reference.to_string(),
            message,
        };

        match self.responses.get(reference) {
            Some(StubResponse::Tags(tags)) => {
                let result = InspectionResult {
                    repo_tags: tags.clone(),
                    ..InspectionResult::default()
                };
                serde_json::to_vec(&result).map_err(|e| unavailable(e.to_string()))
            }
            Some(StubResponse::Payload(payload)) => Ok(payload.clone()),
            Some(StubResponse::Failure(message)) => Err(unavailable(message.clone())),
            None => Err(unavailable("no stubbed response".to_string())),
        }
    }
}

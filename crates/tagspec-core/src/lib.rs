//! tagspec-core: declarative image tag policy reconciliation
//!
//! A spec document declares a list of container image references and a tag
//! policy. Applying the spec inspects each image in order and fails at the
//! first one whose published tags lack the required tag.
//!
//! ## Modules
//!
//! - [`spec`]: document model and recognized schema constants
//! - [`generate`]: canonical example document
//! - [`inspect`]: inspection seam and the external-program backend
//! - [`apply`]: the reconciliation loop
//! - [`fakes`]: in-memory inspector for tests

pub mod apply;
pub mod error;
pub mod fakes;
pub mod generate;
pub mod inspect;
pub mod obs;
pub mod spec;
pub mod telemetry;

pub use apply::{ApplyReport, ImageOutcome, SpecApplier};
pub use error::{ApplyError, ApplyResult, InspectError, SpecError};
pub use generate::{generate, render_example};
pub use inspect::{CommandInspector, InspectionResult, Inspector, InspectorConfig};
pub use spec::{Policy, SchemaVersion, Spec, API_VERSION, KIND};
pub use telemetry::init_tracing;

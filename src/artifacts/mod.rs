//! Artifact layer: serde shapes of the files the benchmark pipeline writes.
//!
//! These are read-only views. Unknown fields are ignored and missing optional
//! fields default, so older and newer artifacts both load.

pub mod prediction;
pub mod run_spec;
pub mod scenario;
pub mod schema;
pub mod stat;
pub mod table;

pub use prediction::{DisplayRequest, Prediction};
pub use run_spec::{RunSpec, ScenarioSpec};
pub use scenario::{Instance, InstanceKey, Reference, RequestState, Scenario, ScenarioState};
pub use schema::{Field, MetricGroup, ModelField, RunGroup, Schema};
pub use stat::{MetricName, Perturbation, Stat};
pub use table::{Cell, GroupMetadata, GroupsMetadata, Hyperlink, Summary, Table};

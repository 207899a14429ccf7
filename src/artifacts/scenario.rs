//! Scenario metadata, instances, and the legacy scenario state.

use crate::artifacts::stat::Perturbation;

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub definition_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub input: String,

    #[serde(default)]
    pub references: Vec<Reference>,

    #[serde(default)]
    pub split: Option<String>,

    #[serde(default)]
    pub sub_split: Option<String>,

    #[serde(default)]
    pub perturbation: Option<Perturbation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub output: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// `scenario_state.json`: every request made for a run, with its result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioState {
    #[serde(default)]
    pub request_states: Vec<RequestState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestState {
    pub instance: Instance,

    #[serde(default)]
    pub train_trial_index: usize,

    #[serde(default)]
    pub reference_index: Option<usize>,

    #[serde(default)]
    pub request: Map<String, Value>,

    #[serde(default)]
    pub result: Option<RequestResult>,

    #[serde(default)]
    pub output_mapping: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestResult {
    #[serde(default)]
    pub completions: Vec<Completion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub text: String,
}

impl Instance {
    /// (id, perturbation) identifies an instance within a scenario.
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(&self.id, self.perturbation.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceKey {
    pub id: String,
    pub perturbation: String,
}

impl InstanceKey {
    pub fn new(id: &str, perturbation: Option<&Perturbation>) -> Self {
        Self {
            id: id.to_string(),
            perturbation: Perturbation::render_opt(perturbation),
        }
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}]", self.id, self.perturbation)
    }
}

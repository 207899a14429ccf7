use crate::artifacts::scenario::InstanceKey;
use crate::artifacts::stat::Perturbation;

use serde::Deserialize;
use serde_json::{Map, Value};

/// One entry of `display_predictions.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub instance_id: String,

    #[serde(default)]
    pub perturbation: Option<Perturbation>,

    #[serde(default)]
    pub train_trial_index: usize,

    #[serde(default)]
    pub predicted_text: String,

    /// Prediction with the echoed prompt (or padding token) stripped.
    #[serde(default)]
    pub truncated_predicted_text: Option<String>,

    #[serde(default)]
    pub mapped_output: Option<String>,

    #[serde(default)]
    pub reference_index: Option<usize>,

    #[serde(default)]
    pub stats: Map<String, Value>,
}

/// One entry of `display_requests.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayRequest {
    pub instance_id: String,

    #[serde(default)]
    pub perturbation: Option<Perturbation>,

    #[serde(default)]
    pub train_trial_index: usize,

    /// Set for requests derived from a scenario state; display files pair
    /// requests with predictions by position instead.
    #[serde(default)]
    pub reference_index: Option<usize>,

    #[serde(default)]
    pub request: Map<String, Value>,
}

impl Prediction {
    pub fn instance_key(&self) -> InstanceKey {
        InstanceKey::new(&self.instance_id, self.perturbation.as_ref())
    }

    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).and_then(Value::as_f64)
    }
}

impl DisplayRequest {
    pub fn instance_key(&self) -> InstanceKey {
        InstanceKey::new(&self.instance_id, self.perturbation.as_ref())
    }
}

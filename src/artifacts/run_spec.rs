use crate::format;

use serde::Deserialize;
use serde_json::{Map, Value};

/// One evaluation run: which scenario, adapted how, for which groups.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSpec {
    pub name: String,

    /// Older artifacts call this `scenario`.
    #[serde(default, alias = "scenario")]
    pub scenario_spec: ScenarioSpec,

    #[serde(default)]
    pub adapter_spec: Map<String, Value>,

    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub class_name: String,

    #[serde(default)]
    pub args: Map<String, Value>,
}

impl RunSpec {
    /// Adapter method (`generation`, `multiple_choice_joint`, ...); empty if unset.
    pub fn method(&self) -> &str {
        self.adapter_spec
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

impl ScenarioSpec {
    /// `benchmark.mmlu_scenario.MMLUScenario` with args {subject: anatomy}
    /// renders as `MMLU(subject=anatomy)`.
    pub fn render(&self) -> String {
        let last = self.class_name.rsplit('.').next().unwrap_or("");
        let name = last.replace("Scenario", "");
        format!("{}({})", name, format::render_dict(&self.args))
    }
}

//! `schema.yaml`: display information for models, adapter fields, metrics and groups.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub models: Vec<ModelField>,

    #[serde(default)]
    pub adapter: Vec<Field>,

    #[serde(default)]
    pub metrics: Vec<Field>,

    #[serde(default)]
    pub perturbations: Vec<Field>,

    #[serde(default)]
    pub metric_groups: Vec<MetricGroup>,

    #[serde(default)]
    pub run_groups: Vec<RunGroup>,
}

/// A named, described entry: an adapter field, a metric, a perturbation, or
/// one of an adapter field's enumerated values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub lower_is_better: Option<bool>,

    #[serde(default)]
    pub values: Option<Vec<Field>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelField {
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub creator_organization: String,

    #[serde(default)]
    pub access: String,

    #[serde(default)]
    pub todo: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricRef {
    pub name: String,

    #[serde(default)]
    pub perturbation_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricGroup {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub short_display_name: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub metrics: Vec<MetricRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub what: Option<String>,
    #[serde(default)]
    pub who: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunGroup {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub short_display_name: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Set on top-level groups ("Core scenarios", ...); scenario groups leave it empty.
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub subgroups: Vec<String>,

    #[serde(default)]
    pub metric_groups: Vec<String>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub taxonomy: Option<Taxonomy>,

    #[serde(default)]
    pub todo: bool,
}

impl Schema {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn adapter_field_names(&self) -> Vec<String> {
        self.adapter.iter().map(|f| f.name.clone()).collect()
    }

    /// Look up an adapter field; unknown names get a bare field.
    pub fn adapter_field(&self, name: &str) -> Field {
        lookup_field(&self.adapter, name, "adapter")
    }

    /// Look up a metric; unknown names get a bare field.
    pub fn metrics_field(&self, name: &str) -> Field {
        lookup_field(&self.metrics, name, "metrics")
    }

    pub fn metric_group(&self, name: &str) -> Option<&MetricGroup> {
        self.metric_groups.iter().find(|g| g.name == name)
    }

    pub fn run_group(&self, name: &str) -> Option<&RunGroup> {
        self.run_groups.iter().find(|g| g.name == name)
    }
}

fn lookup_field(fields: &[Field], name: &str, kind: &str) -> Field {
    match fields.iter().find(|f| f.name == name) {
        Some(f) => f.clone(),
        None => {
            warn!("{} field {} not found in schema", kind, name);
            Field {
                name: name.to_string(),
                ..Field::default()
            }
        }
    }
}

impl Field {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Help text: "name: description", followed by the enumerated values if any.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{}: {}",
            self.name,
            self.description.as_deref().unwrap_or("")
        );
        if let Some(values) = &self.values {
            out.push_str("\nPossible values:");
            for v in values {
                out.push_str(&format!(
                    "\n- {}: {}",
                    v.name,
                    v.description.as_deref().unwrap_or("")
                ));
            }
        }
        out
    }
}

impl MetricGroup {
    pub fn short_name(&self) -> &str {
        self.short_display_name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.name)
    }
}

impl RunGroup {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn short_name(&self) -> &str {
        self.short_display_name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.name)
    }
}

//! The three lists on the landing page: models, scenarios, metrics.

use crate::artifacts::{MetricGroup, RunGroup, Schema};

use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Top-level groups shown on the landing page.
const TOP_CATEGORIES: [&str; 2] = ["Core scenarios", "Targeted evaluations"];

/// Placeholder metric name filled in per run group.
const MAIN_NAME: &str = "${main_name}";

pub fn model_count(schema: &Schema) -> usize {
    schema.models.iter().filter(|m| !m.todo).count()
}

#[derive(Debug, Clone)]
pub struct ScenarioList<'a> {
    /// Number of distinct, non-todo scenario groups under the top groups.
    pub count: usize,
    pub top_groups: Vec<(&'a RunGroup, Vec<&'a RunGroup>)>,
}

pub fn scenario_list(schema: &Schema) -> ScenarioList<'_> {
    let by_name: BTreeMap<&str, &RunGroup> = schema
        .run_groups
        .iter()
        .map(|g| (g.name.as_str(), g))
        .collect();

    let mut scenario_names: BTreeSet<&str> = BTreeSet::new();
    let mut top_groups = Vec::new();
    for group in &schema.run_groups {
        let is_top = !group.subgroups.is_empty()
            && group
                .category
                .as_deref()
                .is_some_and(|c| TOP_CATEGORIES.contains(&c));
        if !is_top {
            continue;
        }
        let mut subgroups = Vec::new();
        for name in &group.subgroups {
            match by_name.get(name.as_str()) {
                Some(sub) => {
                    if !sub.todo {
                        scenario_names.insert(sub.name.as_str());
                    }
                    subgroups.push(*sub);
                }
                None => warn!("group {} lists unknown subgroup {}", group.name, name),
            }
        }
        top_groups.push((group, subgroups));
    }

    ScenarioList {
        count: scenario_names.len(),
        top_groups,
    }
}

#[derive(Debug, Clone)]
pub struct MetricItem {
    pub name: String,
    pub display: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct MetricList<'a> {
    pub count: usize,
    pub groups: Vec<(&'a MetricGroup, Vec<MetricItem>)>,
}

/// Metric groups with their `${main_name}` placeholders expanded to the main
/// metrics of the run groups using them. A group is hidden when a
/// `<name>_detailed` variant exists.
pub fn metric_list(schema: &Schema) -> MetricList<'_> {
    let mut main_names: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for group in &schema.run_groups {
        let Some(main_name) = group.environment.get("main_name") else {
            continue;
        };
        for metric_group in &group.metric_groups {
            let names = main_names.entry(metric_group.as_str()).or_default();
            if !names.contains(&main_name.as_str()) {
                names.push(main_name.as_str());
            }
        }
    }

    let mut all_names: BTreeSet<String> = BTreeSet::new();
    let mut groups = Vec::new();
    for group in &schema.metric_groups {
        let detailed = format!("{}_detailed", group.name);
        if schema.metric_groups.iter().any(|g| g.name == detailed) {
            continue;
        }
        let base = group.name.trim_end_matches("_detailed");

        let mut items = Vec::new();
        for metric in &group.metrics {
            let names: Vec<&str> = if metric.name == MAIN_NAME {
                main_names.get(base).cloned().unwrap_or_default()
            } else {
                vec![metric.name.as_str()]
            };
            for name in names {
                let info = schema.metrics.iter().find(|m| m.name == name);
                let display_name = info
                    .and_then(|m| m.display_name.as_deref())
                    .unwrap_or(name);
                let display = match &metric.perturbation_name {
                    Some(p) => format!("{} (perturbation: {})", display_name, p),
                    None => display_name.to_string(),
                };
                all_names.insert(name.to_string());
                items.push(MetricItem {
                    name: name.to_string(),
                    display,
                    description: info
                        .and_then(|m| m.description.clone())
                        .unwrap_or_default(),
                });
            }
        }
        groups.push((group, items));
    }

    MetricList {
        count: all_names.len(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::from_yaml(
            r#"
models:
  - name: openai/davinci
    display_name: davinci
    creator_organization: OpenAI
  - name: future/model
    todo: true
metrics:
  - name: exact_match
    display_name: Exact match
  - name: f1_score
    display_name: F1
metric_groups:
  - name: accuracy
    metrics:
      - name: ${main_name}
  - name: robustness
    metrics:
      - name: ${main_name}
        perturbation_name: typos
  - name: robustness_detailed
    metrics:
      - name: ${main_name}
        perturbation_name: typos
      - name: ${main_name}
        perturbation_name: synonyms
run_groups:
  - name: core_scenarios
    category: Core scenarios
    subgroups: [mmlu, narrative_qa, unknown]
  - name: mmlu
    metric_groups: [accuracy, robustness]
    environment:
      main_name: exact_match
  - name: narrative_qa
    metric_groups: [accuracy, robustness]
    todo: true
    environment:
      main_name: f1_score
"#,
        )
        .unwrap()
    }

    #[test]
    fn counts_non_todo_models() {
        assert_eq!(model_count(&schema()), 1);
    }

    #[test]
    fn scenario_list_counts_non_todo_subgroups() {
        let schema = schema();
        let list = scenario_list(&schema);
        assert_eq!(list.count, 1);
        assert_eq!(list.top_groups.len(), 1);
        assert_eq!(list.top_groups[0].1.len(), 2);
    }

    #[test]
    fn metric_list_expands_main_names_and_hides_undetailed() {
        let schema = schema();
        let list = metric_list(&schema);
        let group_names: Vec<&str> = list.groups.iter().map(|(g, _)| g.name.as_str()).collect();
        assert_eq!(group_names, vec!["accuracy", "robustness_detailed"]);

        let accuracy: Vec<&str> = list.groups[0].1.iter().map(|m| m.display.as_str()).collect();
        assert_eq!(accuracy, vec!["Exact match", "F1"]);

        // robustness_detailed expands through the base group's main names.
        let detailed: Vec<&str> = list.groups[1].1.iter().map(|m| m.display.as_str()).collect();
        assert_eq!(
            detailed,
            vec![
                "Exact match (perturbation: typos)",
                "F1 (perturbation: typos)",
                "Exact match (perturbation: synonyms)",
                "F1 (perturbation: synonyms)",
            ]
        );
        assert_eq!(list.count, 2);
    }
}

//! Metric names per run group, correctness judgements, and the stats table.

use crate::artifacts::{MetricName, RunGroup, RunSpec, Schema, Stat};
use crate::format;

use std::collections::BTreeMap;
use tracing::warn;

/// Per-instance metric names of a run group (perturbation-scoped metrics excluded).
pub fn metric_names(schema: &Schema, run_group: &RunGroup) -> Vec<String> {
    let mut names = Vec::new();
    for group_name in &run_group.metric_groups {
        let Some(group) = schema.metric_group(group_name) else {
            warn!(
                "run group {} references unknown metric group {}",
                run_group.name, group_name
            );
            continue;
        };
        for metric in &group.metrics {
            if metric.perturbation_name.is_some() {
                continue;
            }
            names.push(format::substitute(&metric.name, &run_group.environment));
        }
    }
    names
}

/// Union of the metric names of every run group the run belongs to.
pub fn run_metric_names(schema: &Schema, run_spec: &RunSpec) -> Vec<String> {
    let lists: Vec<Vec<String>> = schema
        .run_groups
        .iter()
        .filter(|g| run_spec.groups.contains(&g.name))
        .map(|g| metric_names(schema, g))
        .collect();
    format::canonicalize_list(&lists)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgement {
    pub wrong_threshold: f64,
    pub correct_threshold: f64,
    pub lower_is_better: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatClass {
    Correct,
    Wrong,
}

impl StatClass {
    pub fn css(self) -> &'static str {
        match self {
            StatClass::Correct => "correct",
            StatClass::Wrong => "wrong",
        }
    }
}

/// Thresholds deciding whether a per-instance value counts as right or wrong.
#[derive(Debug, Clone, Default)]
pub struct MetricJudgements {
    by_name: BTreeMap<String, Judgement>,
}

impl MetricJudgements {
    /// Every run group's main metric is judged on a 0/1 scale, except
    /// `bits_per_byte` which has no such scale.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut by_name = BTreeMap::new();
        for group in &schema.run_groups {
            let Some(main_name) = group.environment.get("main_name") else {
                continue;
            };
            if main_name == "bits_per_byte" {
                continue;
            }
            let lower_is_better = schema
                .metrics
                .iter()
                .find(|m| &m.name == main_name)
                .and_then(|m| m.lower_is_better)
                .unwrap_or(false);
            let judgement = if lower_is_better {
                Judgement {
                    wrong_threshold: 1.0,
                    correct_threshold: 0.0,
                    lower_is_better,
                }
            } else {
                Judgement {
                    wrong_threshold: 0.0,
                    correct_threshold: 1.0,
                    lower_is_better,
                }
            };
            by_name.insert(main_name.clone(), judgement);
        }
        Self { by_name }
    }

    pub fn stat_class(&self, name: &str, value: f64) -> Option<StatClass> {
        let j = self.by_name.get(name)?;
        if j.lower_is_better {
            if value <= j.correct_threshold {
                return Some(StatClass::Correct);
            }
            if value >= j.wrong_threshold {
                return Some(StatClass::Wrong);
            }
        } else {
            if value >= j.correct_threshold {
                return Some(StatClass::Correct);
            }
            if value <= j.wrong_threshold {
                return Some(StatClass::Wrong);
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct StatsRow {
    /// HTML label of the metric name.
    pub label: String,
    pub help: String,
    /// One rounded mean per run; `?` if the run has no such stat.
    pub values: Vec<String>,
}

/// Canonical, sorted union of the stat names across runs.
pub fn stat_keys(stats_per_run: &[Vec<Stat>]) -> Vec<MetricName> {
    let lists: Vec<Vec<MetricName>> = stats_per_run
        .iter()
        .map(|stats| stats.iter().map(|s| s.name.clone()).collect())
        .collect();
    let mut keys = format::canonicalize_list(&lists);
    keys.sort_by(|a, b| a.compare(b));
    keys
}

/// True when every run came back with an empty stats list.
pub fn stats_unavailable(stats_per_run: &[Vec<Stat>]) -> bool {
    !stats_per_run.is_empty() && stats_per_run.iter().all(Vec::is_empty)
}

/// Rows of the "All metrics" table. Perturbed stats other than the worst case
/// are skipped; a non-empty `query` keeps rows whose label contains every
/// space-separated term.
pub fn stats_rows(
    schema: &Schema,
    keys: &[MetricName],
    stats_per_run: &[Vec<Stat>],
    query: &str,
) -> Vec<StatsRow> {
    let terms: Vec<&str> = query.split(' ').filter(|t| !t.is_empty()).collect();

    keys.iter()
        .filter(|key| key.is_worst_or_unperturbed())
        .filter(|key| {
            let text = key.render_text();
            terms.iter().all(|t| text.contains(t))
        })
        .map(|key| {
            let field = schema.metrics_field(&key.name);
            let values = stats_per_run
                .iter()
                .map(|stats| {
                    stats
                        .iter()
                        .find(|s| &s.name == key)
                        .and_then(|s| s.mean)
                        .map(|m| format::round(m, 3))
                        .unwrap_or_else(|| "?".to_string())
                })
                .collect();
            StatsRow {
                label: key.render(),
                help: key.describe(&field),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::from_yaml(
            r#"
metrics:
  - name: exact_match
    display_name: Exact match
  - name: bits_per_byte
    lower_is_better: true
metric_groups:
  - name: accuracy
    metrics:
      - name: ${main_name}
      - name: ${main_name}
        perturbation_name: robustness
  - name: efficiency
    metrics:
      - name: inference_runtime
run_groups:
  - name: mmlu
    metric_groups: [accuracy, efficiency]
    environment:
      main_name: exact_match
  - name: the_pile
    metric_groups: [accuracy]
    environment:
      main_name: bits_per_byte
"#,
        )
        .unwrap()
    }

    fn stats(json: &str) -> Vec<Stat> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn metric_names_substitute_environment() {
        let schema = schema();
        let group = schema.run_group("mmlu").unwrap();
        assert_eq!(
            metric_names(&schema, group),
            vec!["exact_match", "inference_runtime"]
        );

        let run: RunSpec =
            serde_json::from_str(r#"{"name": "r", "groups": ["mmlu", "the_pile"]}"#).unwrap();
        assert_eq!(
            run_metric_names(&schema, &run),
            vec!["exact_match", "inference_runtime", "bits_per_byte"]
        );
    }

    #[test]
    fn judgements_skip_bits_per_byte() {
        let j = MetricJudgements::from_schema(&schema());
        assert_eq!(j.stat_class("exact_match", 1.0), Some(StatClass::Correct));
        assert_eq!(j.stat_class("exact_match", 0.0), Some(StatClass::Wrong));
        assert_eq!(j.stat_class("exact_match", 0.5), None);
        assert_eq!(j.stat_class("bits_per_byte", 0.0), None);
    }

    #[test]
    fn lower_is_better_flips_thresholds() {
        let schema = Schema::from_yaml(
            r#"
metrics:
  - name: error_rate
    lower_is_better: true
run_groups:
  - name: errors
    environment:
      main_name: error_rate
"#,
        )
        .unwrap();
        let j = MetricJudgements::from_schema(&schema);
        assert_eq!(j.stat_class("error_rate", 0.0), Some(StatClass::Correct));
        assert_eq!(j.stat_class("error_rate", 1.0), Some(StatClass::Wrong));
        assert_eq!(j.stat_class("error_rate", 0.5), None);
    }

    #[test]
    fn stats_rows_fill_missing_with_placeholder() {
        let schema = schema();
        let per_run = vec![
            stats(
                r#"[{"name": {"name": "exact_match"}, "mean": 0.66666},
                    {"name": {"name": "exact_match", "perturbation": {"name": "typos", "computed_on": "worst"}}, "mean": 0.5},
                    {"name": {"name": "exact_match", "perturbation": {"name": "typos", "computed_on": "perturbed"}}, "mean": 0.4}]"#,
            ),
            stats(r#"[{"name": {"name": "inference_runtime", "split": "test"}, "mean": 1.5}]"#),
        ];
        let keys = stat_keys(&per_run);
        assert_eq!(keys.len(), 4);

        let rows = stats_rows(&schema, &keys, &per_run, "");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].values, vec!["0.667", "?"]);
        assert_eq!(rows[1].values, vec!["0.5", "?"]);
        assert_eq!(rows[2].values, vec!["?", "1.5"]);

        let filtered = stats_rows(&schema, &keys, &per_run, "exact with");
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn unavailable_only_when_all_empty() {
        assert!(stats_unavailable(&[vec![], vec![]]));
        assert!(!stats_unavailable(&[]));
    }
}

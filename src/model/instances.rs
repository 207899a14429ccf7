//! Instances of a scenario with the predictions and requests of each run.
//!
//! Instances are identified by (id, perturbation). Each run contributes
//! predictions per instance and train trial; requests hang off the prediction
//! with the same key, trial and position (or reference index).

use crate::artifacts::{
    DisplayRequest, Instance, InstanceKey, Prediction, RunSpec, Schema, ScenarioState,
};
use crate::format::{self, escape_html};
use crate::model::metrics::{MetricJudgements, StatClass};

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Predicted text longer than this is shortened in the middle.
const PREDICTION_MAX_CHARS: usize = 30;

#[derive(Debug, Clone)]
pub struct InstanceView {
    pub key: String,
    pub header: String,
    pub perturbed: bool,
    /// HTML; `None` when inputs and outputs are hidden.
    pub input_html: Option<String>,
    pub references: Vec<ReferenceView>,
    pub predictions: Vec<PredictionView>,
}

#[derive(Debug, Clone)]
pub struct ReferenceView {
    pub output_html: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PredictionView {
    pub run_index: usize,
    pub train_trial_index: usize,
    pub reference_index: Option<usize>,
    /// Position among the run's predictions with the same key and trial,
    /// skipped ones included. Requests come in the same order.
    pub slot: usize,
    pub run_display_name: Option<String>,
    pub description: String,
    pub text_html: String,
    pub stats: Vec<PredictionStat>,
    /// (key, rendered value) pairs, prompt first.
    pub request: Option<Vec<(String, String)>>,
}

#[derive(Debug, Clone)]
pub struct PredictionStat {
    pub text: String,
    pub class: Option<StatClass>,
}

/// Instances in file order plus a key index for attaching predictions.
#[derive(Debug, Clone, Default)]
pub struct InstanceSet {
    pub views: Vec<InstanceView>,
    index: HashMap<InstanceKey, usize>,
}

impl InstanceSet {
    /// Build the instance views. Perturbed instances are diffed against the
    /// unperturbed instance with the same id; duplicate keys keep the first.
    pub fn build(instances: &[Instance], hide_input_output: bool) -> Self {
        let mut originals: HashMap<&str, &Instance> = HashMap::new();
        for instance in instances {
            if instance.perturbation.is_none() {
                originals.entry(instance.id.as_str()).or_insert(instance);
            }
        }

        let mut set = InstanceSet::default();
        for instance in instances {
            let key = instance.key();
            if set.index.contains_key(&key) {
                warn!("two instances with the same key {}, skipping", key);
                continue;
            }

            let original = instance
                .perturbation
                .as_ref()
                .and_then(|_| originals.get(instance.id.as_str()).copied());

            let header = match &instance.perturbation {
                None => format!(
                    "Instance {} [split: {}]",
                    instance.id,
                    instance.split.as_deref().unwrap_or("")
                ),
                Some(p) => format!("...with perturbation: {}", p.render()),
            };

            let (input_html, references) = if hide_input_output {
                (None, Vec::new())
            } else {
                let input = match original {
                    Some(o) => format::highlight_new_words(&instance.input, &o.input),
                    None => escape_html(&instance.input),
                };
                let references = instance
                    .references
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        let orig_ref = original.and_then(|o| o.references.get(i));
                        let output_html = match orig_ref {
                            Some(o) => format::highlight_new_words(&r.output, &o.output),
                            None => escape_html(&r.output),
                        };
                        ReferenceView {
                            output_html,
                            tags: r.tags.clone(),
                        }
                    })
                    .collect();
                (Some(format::multiline_html(&input)), references)
            };

            set.index.insert(key.clone(), set.views.len());
            set.views.push(InstanceView {
                key: key.to_string(),
                header,
                perturbed: instance.perturbation.is_some(),
                input_html,
                references,
                predictions: Vec::new(),
            });
        }
        set
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Attach one run's predictions to their instances.
    pub fn attach_predictions(&mut self, ctx: &PredictionContext<'_>, predictions: &[Prediction]) {
        let num_train_trials = predictions
            .iter()
            .map(|p| p.train_trial_index + 1)
            .max()
            .unwrap_or(0);

        let mut slots: HashMap<(InstanceKey, usize), usize> = HashMap::new();
        for prediction in predictions {
            let key = prediction.instance_key();
            let slot = next_slot(&mut slots, &key, prediction.train_trial_index);
            let Some(&idx) = self.index.get(&key) else {
                error!("prediction for unknown instance {}", key);
                continue;
            };

            // multiple_choice_separate_* yields one request per reference; only
            // the predicted reference is shown.
            let predicted_index = prediction.stat("predicted_index");
            if let (Some(ref_idx), Some(pred_idx)) = (prediction.reference_index, predicted_index) {
                if ref_idx as f64 != pred_idx {
                    continue;
                }
            }

            let stats = ctx
                .metric_names
                .iter()
                .filter_map(|name| {
                    let value = prediction.stat(name)?;
                    let field = ctx.schema.metrics_field(name);
                    Some(PredictionStat {
                        text: format!("{}: {}", field.display_name(), format::round(value, 3)),
                        class: ctx.judgements.stat_class(name, value),
                    })
                })
                .collect();

            let mut description = String::new();
            if let Some(name) = ctx.run_display_name {
                description.push_str(&format!("[{}] ", name));
            }
            description.push_str("Prediction");
            if let Some(r) = prediction.reference_index {
                description.push_str(&format!("[ref {}]", r));
            }
            if num_train_trials > 1 {
                description.push_str(&format!("{{trial {}}}", prediction.train_trial_index));
            }

            self.views[idx].predictions.push(PredictionView {
                run_index: ctx.run_index,
                train_trial_index: prediction.train_trial_index,
                reference_index: prediction.reference_index,
                slot,
                run_display_name: ctx.run_display_name.map(str::to_string),
                description,
                text_html: prediction_text_html(ctx.run_spec.method(), prediction),
                stats,
                request: None,
            });
        }
    }

    /// Attach one run's requests to their predictions. A request names its
    /// reference when it has one; otherwise the n-th request of a (key, trial)
    /// belongs to the n-th prediction of that (key, trial). Requests of
    /// predictions that are not shown are dropped.
    pub fn attach_requests(&mut self, run_index: usize, requests: &[DisplayRequest]) {
        let mut slots: HashMap<(InstanceKey, usize), usize> = HashMap::new();
        for request in requests {
            let key = request.instance_key();
            let slot = next_slot(&mut slots, &key, request.train_trial_index);
            let Some(&idx) = self.index.get(&key) else {
                error!("request for unknown instance {}", key);
                continue;
            };
            let target = self.views[idx].predictions.iter_mut().find(|p| {
                let same_request = match request.reference_index {
                    Some(r) => p.reference_index == Some(r),
                    None => p.slot == slot,
                };
                p.run_index == run_index
                    && p.train_trial_index == request.train_trial_index
                    && same_request
            });
            match target {
                Some(p) => p.request = Some(request_rows(&request.request)),
                None => debug!(
                    "request {} for {} trial {} has no shown prediction",
                    slot, key, request.train_trial_index
                ),
            }
        }
    }
}

fn next_slot(slots: &mut HashMap<(InstanceKey, usize), usize>, key: &InstanceKey, trial: usize) -> usize {
    let counter = slots.entry((key.clone(), trial)).or_insert(0);
    let slot = *counter;
    *counter += 1;
    slot
}

/// Everything about a run needed to render its predictions.
pub struct PredictionContext<'a> {
    pub schema: &'a Schema,
    pub run_spec: &'a RunSpec,
    pub run_index: usize,
    pub run_display_name: Option<&'a str>,
    pub metric_names: &'a [String],
    pub judgements: &'a MetricJudgements,
}

/// The shown prediction depends on how the run was adapted.
fn prediction_text_html(method: &str, prediction: &Prediction) -> String {
    let predicted = prediction.predicted_text.trim();

    let html = if method == "multiple_choice_joint" {
        match &prediction.mapped_output {
            Some(mapped) => escape_html(&format::truncate_middle(mapped.trim(), PREDICTION_MAX_CHARS)),
            None => format!(
                "{}<span class=\"muted\"> (unmapped)</span>",
                escape_html(&format::truncate_middle(predicted, PREDICTION_MAX_CHARS))
            ),
        }
    } else if method.starts_with("multiple_choice_separate_") {
        // The completion echoes the prompt; show only the stripped tail.
        match &prediction.truncated_predicted_text {
            Some(t) => format!(
                "<span class=\"muted\">...</span> {}",
                escape_html(&format::truncate_middle(t.trim(), PREDICTION_MAX_CHARS))
            ),
            None => {
                warn!("prompt was not stripped from predicted text {:?}", predicted);
                escape_html(&format::truncate_middle(predicted, PREDICTION_MAX_CHARS))
            }
        }
    } else if method == "language_modeling" {
        // The first token is padding.
        match &prediction.truncated_predicted_text {
            Some(t) => escape_html(&format::truncate_middle(t.trim(), PREDICTION_MAX_CHARS)),
            None => {
                warn!("first token was not stripped from predicted text {:?}", predicted);
                escape_html(&format::truncate_middle(predicted, PREDICTION_MAX_CHARS))
            }
        }
    } else {
        escape_html(predicted)
    };

    if html.is_empty() {
        "<i>(empty)</i>".to_string()
    } else {
        html
    }
}

/// Request fields as table rows: the prompt first, the rest as given.
fn request_rows(request: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    let prompt = request
        .get("prompt")
        .map(format::value_text)
        .unwrap_or_default();
    rows.push(("prompt".to_string(), prompt));
    for (k, v) in request {
        if k == "prompt" {
            continue;
        }
        rows.push((k.clone(), format::value_text(v)));
    }
    rows
}

/// Derive display predictions and requests from a legacy `scenario_state.json`.
pub fn from_scenario_state(state: &ScenarioState) -> (Vec<Prediction>, Vec<DisplayRequest>) {
    let mut predictions = Vec::new();
    let mut requests = Vec::new();

    for rs in &state.request_states {
        let text = rs
            .result
            .as_ref()
            .and_then(|r| r.completions.first())
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default();
        let mapped_output = rs
            .output_mapping
            .as_ref()
            .and_then(|m| m.get(&text).cloned());

        predictions.push(Prediction {
            instance_id: rs.instance.id.clone(),
            perturbation: rs.instance.perturbation.clone(),
            train_trial_index: rs.train_trial_index,
            predicted_text: text,
            truncated_predicted_text: None,
            mapped_output,
            reference_index: rs.reference_index,
            stats: Default::default(),
        });
        requests.push(DisplayRequest {
            instance_id: rs.instance.id.clone(),
            perturbation: rs.instance.perturbation.clone(),
            train_trial_index: rs.train_trial_index,
            reference_index: rs.reference_index,
            request: rs.request.clone(),
        });
    }

    (predictions, requests)
}

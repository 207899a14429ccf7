//! Aggregate statistics (`stats.json`) and their names.

use crate::format::{self, escape_html};
use crate::artifacts::schema::Field;

use serde::Deserialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Deserialize)]
pub struct Stat {
    pub name: MetricName,

    /// Only the mean is shown; count, sum, min and max are left unread.
    #[serde(default)]
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricName {
    pub name: String,

    #[serde(default)]
    pub k: Option<u32>,

    #[serde(default)]
    pub split: Option<String>,

    #[serde(default)]
    pub sub_split: Option<String>,

    #[serde(default)]
    pub perturbation: Option<Perturbation>,
}

/// A perturbation description: always a `name`, plus arbitrary parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Perturbation {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub computed_on: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Perturbation {
    /// `name(k=v, ...)`, listing every field but the name.
    pub fn render(&self) -> String {
        let mut fields: Vec<String> = Vec::new();
        if let Some(c) = &self.computed_on {
            fields.push(format!("computed_on={}", c));
        }
        for (k, v) in &self.fields {
            fields.push(format!("{}={}", k, format::value_text(v)));
        }
        if fields.is_empty() {
            self.name.clone()
        } else {
            format!("{}({})", self.name, fields.join(", "))
        }
    }

    /// `original` stands for "no perturbation".
    pub fn render_opt(p: Option<&Perturbation>) -> String {
        p.map(Perturbation::render)
            .unwrap_or_else(|| "original".to_string())
    }
}

impl PartialEq for Perturbation {
    fn eq(&self, other: &Self) -> bool {
        self.render() == other.render()
    }
}

impl PartialEq for MetricName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.k == other.k
            && self.split == other.split
            && self.sub_split == other.sub_split
            && self.perturbation == other.perturbation
    }
}

impl MetricName {
    /// Short HTML label for a table cell: `<b>name</b>@k on split/sub with p`.
    pub fn render(&self) -> String {
        let mut out = format!("<b>{}</b>", escape_html(&self.name));
        if let Some(k) = self.k {
            out.push_str(&format!("@{}", k));
        }
        if let Some(split) = &self.split {
            out.push_str(&format!(" on {}", escape_html(split)));
            if let Some(sub) = &self.sub_split {
                out.push_str(&format!("/{}", escape_html(sub)));
            }
        }
        if let Some(p) = &self.perturbation {
            out.push_str(&format!(" with {}", escape_html(&p.render())));
        }
        out
    }

    /// Plain-text label used for keyword filtering.
    pub fn render_text(&self) -> String {
        let mut out = self.name.clone();
        if let Some(k) = self.k {
            out.push_str(&format!("@{}", k));
        }
        if let Some(split) = &self.split {
            out.push_str(&format!(" on {}", split));
            if let Some(sub) = &self.sub_split {
                out.push_str(&format!("/{}", sub));
            }
        }
        if let Some(p) = &self.perturbation {
            out.push_str(&format!(" with {}", p.render()));
        }
        out
    }

    /// Longer explanation of the name, shown as a tooltip.
    pub fn describe(&self, field: &Field) -> String {
        let mut out = field.describe();
        if let Some(k) = self.k {
            out.push_str(&format!(
                "\n@{}: consider the best over the top {} predictions",
                k, k
            ));
        }
        if let Some(split) = &self.split {
            out.push_str(&format!(
                "\non {}: evaluated on the subset of {} instances",
                split, split
            ));
        }
        if let Some(p) = &self.perturbation {
            out.push_str(&format!(
                "\nwith {}: applied this perturbation (worst means over all perturbations of an instance)",
                p.render()
            ));
        }
        out
    }

    /// Table order: split, then name, then perturbation name.
    pub fn compare(&self, other: &Self) -> Ordering {
        let split = |m: &MetricName| m.split.clone().unwrap_or_default();
        let pert = |m: &MetricName| {
            m.perturbation
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default()
        };
        split(self)
            .cmp(&split(other))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| pert(self).cmp(&pert(other)))
    }

    /// Aggregates over perturbations are only shown for the worst case.
    pub fn is_worst_or_unperturbed(&self) -> bool {
        match &self.perturbation {
            None => true,
            Some(p) => p.computed_on.as_deref() == Some("worst"),
        }
    }
}

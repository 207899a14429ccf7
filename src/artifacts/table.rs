//! Grouped summary tables (`groups.json`, `groups/<group>.json`) and their metadata.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub header: Vec<Cell>,

    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,

    #[serde(default)]
    pub links: Vec<Hyperlink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: Value,

    #[serde(default)]
    pub display_value: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub href: Option<String>,

    #[serde(default)]
    pub markdown: bool,

    /// CSS properties applied to the cell's value.
    #[serde(default)]
    pub style: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hyperlink {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub href: String,
}

/// Entry of `groups_metadata.json`, keyed by group name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupMetadata {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub taxonomy: Option<BTreeMap<String, Value>>,
}

pub type GroupsMetadata = BTreeMap<String, GroupMetadata>;

/// `summary.json`: which suite this is and when it was produced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub suite: String,

    #[serde(default)]
    pub date: String,
}

impl Cell {
    /// Numeric value used for sorting, if any.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

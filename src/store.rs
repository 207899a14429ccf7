//! Artifact loading from a site root.
//!
//! Layout:
//!   <root>/schema.yaml
//!   <root>/benchmark_output/runs/<suite>/summary.json
//!   <root>/benchmark_output/runs/<suite>/run_specs.json
//!   <root>/benchmark_output/runs/<suite>/groups.json
//!   <root>/benchmark_output/runs/<suite>/groups/<group>.json
//!   <root>/benchmark_output/runs/<suite>/groups/latex/<table>.tex
//!   <root>/benchmark_output/runs/<suite>/groups_metadata.json
//!   <root>/benchmark_output/runs/<suite>/<run spec>/{run_spec,scenario,scenario_state,
//!       stats,instances,display_predictions,display_requests}.json
//!
//! Hrefs are relative to the site root, so the same string is used to read the
//! file and to link to it from the rendered page.

use crate::Result;
use crate::artifacts::Schema;

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Where the artifacts live and which suite to show by default.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub root: PathBuf,
    pub default_suite: String,
}

/// Loader bound to one suite.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    suite: String,
}

impl Store {
    pub fn new(config: &SiteConfig, suite: &str) -> Self {
        Self {
            root: config.root.clone(),
            suite: suite.to_string(),
        }
    }

    fn suite_href(&self, rest: &str) -> String {
        format!("benchmark_output/runs/{}/{}", self.suite, rest)
    }

    pub fn schema_href(&self) -> String {
        "schema.yaml".to_string()
    }

    pub fn summary_href(&self) -> String {
        self.suite_href("summary.json")
    }

    pub fn run_specs_href(&self) -> String {
        self.suite_href("run_specs.json")
    }

    pub fn groups_href(&self) -> String {
        self.suite_href("groups.json")
    }

    pub fn group_href(&self, group: &str) -> String {
        self.suite_href(&format!("groups/{}.json", group))
    }

    pub fn groups_metadata_href(&self) -> String {
        self.suite_href("groups_metadata.json")
    }

    pub fn latex_href(&self, name: &str) -> String {
        self.suite_href(&format!("groups/latex/{}.tex", name))
    }

    pub fn run_spec_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/run_spec.json", run))
    }

    pub fn scenario_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/scenario.json", run))
    }

    pub fn scenario_state_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/scenario_state.json", run))
    }

    pub fn stats_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/stats.json", run))
    }

    pub fn instances_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/instances.json", run))
    }

    pub fn predictions_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/display_predictions.json", run))
    }

    pub fn requests_href(&self, run: &str) -> String {
        self.suite_href(&format!("{}/display_requests.json", run))
    }

    fn path(&self, href: &str) -> PathBuf {
        self.root.join(Path::new(href))
    }

    pub fn exists(&self, href: &str) -> bool {
        self.path(href).is_file()
    }

    pub fn load_text(&self, href: &str) -> Result<String> {
        let path = self.path(href);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        debug!("loaded {} ({} bytes)", href, text.len());
        Ok(text)
    }

    pub fn load_schema(&self) -> Result<Schema> {
        let href = self.schema_href();
        let text = self.load_text(&href)?;
        Schema::from_yaml(&text).with_context(|| format!("parse {}", href))
    }

    pub fn load_json<T: DeserializeOwned>(&self, href: &str) -> Result<T> {
        let text = self.load_text(href)?;
        serde_json::from_str(&text).with_context(|| format!("parse {}", href))
    }

    /// Best effort: log the failure and fall back to `T::default()`.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, href: &str) -> T {
        self.load_json(href).unwrap_or_else(|e| {
            error!("failed to load {}: {:#}", href, e);
            T::default()
        })
    }

    /// Best effort: `None` (after logging) if the file is missing or malformed.
    pub fn load_optional<T: DeserializeOwned>(&self, href: &str) -> Option<T> {
        match self.load_json(href) {
            Ok(v) => Some(v),
            Err(e) => {
                error!("failed to load {}: {:#}", href, e);
                None
            }
        }
    }

    /// Load several files, substituting `default` for each one that fails.
    pub fn load_list<T: DeserializeOwned + Clone>(&self, hrefs: &[String], default: T) -> Vec<T> {
        hrefs
            .iter()
            .map(|href| {
                self.load_optional(href)
                    .unwrap_or_else(|| default.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::Stat;
    use pretty_assertions::assert_eq;

    fn store(root: &Path) -> Store {
        let config = SiteConfig {
            root: root.to_path_buf(),
            default_suite: "v1.0".to_string(),
        };
        Store::new(&config, "v1.0")
    }

    #[test]
    fn hrefs_follow_suite_layout() {
        let s = store(Path::new("/site"));
        assert_eq!(s.run_specs_href(), "benchmark_output/runs/v1.0/run_specs.json");
        assert_eq!(
            s.stats_href("mmlu:model=a"),
            "benchmark_output/runs/v1.0/mmlu:model=a/stats.json"
        );
        assert_eq!(
            s.latex_href("core_accuracy"),
            "benchmark_output/runs/v1.0/groups/latex/core_accuracy.tex"
        );
    }

    #[test]
    fn load_list_substitutes_default_for_failures() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let href = s.stats_href("run_a");
        let path = dir.path().join(&href);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"[{"name": {"name": "exact_match"}, "mean": 0.5}]"#).unwrap();

        let lists: Vec<Vec<Stat>> = s.load_list(&[href, s.stats_href("run_b")], Vec::new());
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].len(), 1);
        assert!(lists[1].is_empty());
    }

    #[test]
    fn load_schema_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).load_schema().unwrap_err();
        assert!(format!("{:#}", err).contains("schema.yaml"));
    }
}

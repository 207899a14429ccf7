//! Page selection from query parameters.

use crate::params::UrlParams;

use anyhow::{Context, bail};
use regex::Regex;

#[derive(Debug, Clone)]
pub enum Page {
    Landing,
    Models,
    Scenarios,
    RunsOverview,
    RunsDetailed(RunSpecSelector),
    Groups,
    Group {
        name: String,
        subgroup: Option<String>,
    },
    Latex(String),
}

/// Which run specs a detail page shows.
#[derive(Debug, Clone)]
pub enum RunSpecSelector {
    Exact(String),
    List(Vec<String>),
    Regex(Regex),
}

impl Page {
    /// First matching parameter wins, in the order the dashboard has always
    /// checked them.
    pub fn from_params(params: &UrlParams) -> anyhow::Result<Page> {
        if params.is_set("models") {
            return Ok(Page::Models);
        }
        if params.is_set("scenarios") {
            return Ok(Page::Scenarios);
        }
        if let Some(name) = params.get("runSpec").filter(|s| !s.is_empty()) {
            return Ok(Page::RunsDetailed(RunSpecSelector::Exact(name.to_string())));
        }
        if let Some(list) = params.get("runSpecs").filter(|s| !s.is_empty()) {
            let names: Vec<String> = serde_json::from_str(list)
                .with_context(|| format!("runSpecs must be a JSON list of names: {}", list))?;
            return Ok(Page::RunsDetailed(RunSpecSelector::List(names)));
        }
        if let Some(pattern) = params.get("runSpecRegex").filter(|s| !s.is_empty()) {
            let re = Regex::new(&format!("^(?:{})$", pattern))
                .with_context(|| format!("invalid runSpecRegex: {}", pattern))?;
            return Ok(Page::RunsDetailed(RunSpecSelector::Regex(re)));
        }
        if params.is_set("runs") {
            return Ok(Page::RunsOverview);
        }
        if params.is_set("groups") {
            return Ok(Page::Groups);
        }
        if let Some(name) = params.get("group").filter(|s| !s.is_empty()) {
            return Ok(Page::Group {
                name: check_path_component("group", name)?,
                subgroup: params
                    .get("subgroup")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            });
        }
        if let Some(name) = params.get("latex").filter(|s| !s.is_empty()) {
            return Ok(Page::Latex(check_path_component("latex", name)?));
        }
        Ok(Page::Landing)
    }
}

impl RunSpecSelector {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            RunSpecSelector::Exact(n) => n == name,
            RunSpecSelector::List(names) => names.iter().any(|n| n == name),
            RunSpecSelector::Regex(re) => re.is_match(name),
        }
    }
}

/// Group and table names become file names; keep them inside the suite directory.
pub fn check_path_component(param: &str, value: &str) -> anyhow::Result<String> {
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        bail!("{} must be a plain name: {:?}", param, value);
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(qs: &str) -> Page {
        Page::from_params(&UrlParams::decode(qs)).unwrap()
    }

    #[test]
    fn precedence_follows_parameter_order() {
        assert!(matches!(page("?models&group=x"), Page::Models));
        assert!(matches!(page("?scenarios"), Page::Scenarios));
        assert!(matches!(page("?runs&runSpec=a"), Page::RunsDetailed(_)));
        assert!(matches!(page("?runs"), Page::RunsOverview));
        assert!(matches!(page("?groups"), Page::Groups));
        assert!(matches!(page("?latex=t"), Page::Latex(ref n) if n == "t"));
        assert!(matches!(page(""), Page::Landing));
        match page("?group=mmlu&subgroup=anatomy") {
            Page::Group { name, subgroup } => {
                assert_eq!(name, "mmlu");
                assert_eq!(subgroup.as_deref(), Some("anatomy"));
            }
            other => panic!("unexpected page {:?}", other),
        }
    }

    #[test]
    fn selectors_match_names() {
        let Page::RunsDetailed(sel) = page("?runSpecRegex=mmlu.*") else {
            panic!("expected detail page");
        };
        assert!(sel.matches("mmlu:model=a"));
        assert!(!sel.matches("boolq:mmlu"));

        let Page::RunsDetailed(sel) = page(r#"?runSpecs=["a","b"]"#) else {
            panic!("expected detail page");
        };
        assert!(sel.matches("b"));
        assert!(!sel.matches("c"));
    }

    #[test]
    fn bad_selectors_are_errors() {
        assert!(Page::from_params(&UrlParams::decode("?runSpecs=notjson")).is_err());
        assert!(Page::from_params(&UrlParams::decode("?runSpecRegex=(")).is_err());
        assert!(Page::from_params(&UrlParams::decode("?group=../x")).is_err());
    }
}

//! URL query parameters.
//!
//! Every page is a function of its query string, so links between pages are
//! built by copying the current parameters and overriding a few keys.

use url::form_urlencoded;

/// Decoded query parameters, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    entries: Vec<(String, String)>,
}

impl UrlParams {
    /// Parse `?a=b&c=d`. The leading `?` is optional; a bare key maps to "1"
    /// and a repeated key keeps its last value.
    pub fn decode(query: &str) -> Self {
        let query = query.trim();
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut params = UrlParams::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            let value = if value.is_empty() && !has_explicit_value(query, &key) {
                "1".to_string()
            } else {
                value.into_owned()
            };
            params.set(&key, value);
        }
        params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when the key is present with a non-empty value.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Copy with overrides applied; `None` removes the key.
    pub fn with<'a, I>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut out = self.clone();
        for (key, value) in updates {
            match value {
                Some(v) => out.set(key, v),
                None => out.remove(key),
            }
        }
        out
    }

    /// Encode back to `?k=v&...`. No parameters encode to `?`, which still
    /// points at the landing page.
    pub fn encode(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.entries {
            ser.append_pair(k, v);
        }
        format!("?{}", ser.finish())
    }

    pub fn suite<'a>(&'a self, default: &'a str) -> &'a str {
        self.get("suite").filter(|s| !s.is_empty()).unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `form_urlencoded` reports both `a` and `a=` as an empty value; only the
/// bare form means "flag".
fn has_explicit_value(query: &str, key: &str) -> bool {
    query.split('&').any(|pair| {
        pair.split_once('=')
            .is_some_and(|(k, _)| decode_component(k) == key)
    })
}

fn decode_component(s: &str) -> String {
    form_urlencoded::parse(s.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_flags_and_values() {
        let p = UrlParams::decode("?models&group=core_scenarios&runSpec=a%3Ab%2Cc");
        assert_eq!(p.get("models"), Some("1"));
        assert_eq!(p.get("group"), Some("core_scenarios"));
        assert_eq!(p.get("runSpec"), Some("a:b,c"));
        assert!(p.is_set("models"));
        assert!(!p.is_set("runs"));
    }

    #[test]
    fn explicit_empty_value_is_not_set() {
        let p = UrlParams::decode("runs=&suite=v2");
        assert_eq!(p.get("runs"), Some(""));
        assert!(!p.is_set("runs"));
        assert_eq!(p.suite("v1.0"), "v2");
    }

    #[test]
    fn with_overrides_and_removes() {
        let p = UrlParams::decode("?scenarios=1&suite=v1");
        let q = p.with([("scenarios", None), ("group", Some("mmlu"))]);
        assert_eq!(q.encode(), "?suite=v1&group=mmlu");
    }

    #[test]
    fn encode_escapes_values() {
        let p = UrlParams::default().with([("runSpecRegex", Some(".*a b.*"))]);
        assert_eq!(p.encode(), "?runSpecRegex=.*a+b.*");
        assert_eq!(UrlParams::decode(&p.encode()), p);
    }
}

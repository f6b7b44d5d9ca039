//! Placeholder scanning and substitution.
//!
//! A placeholder is `{{name}}` where `name` is anything up to the first `}}`
//! on the same line. Names are taken verbatim: whitespace and punctuation are
//! part of the name.

use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid"))
}

#[cfg(test)]
fn token(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Distinct placeholder names in `text`, sorted lexicographically
pub fn scan(text: &str) -> Vec<String> {
    let names: BTreeSet<&str> = placeholder_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// Replace every placeholder whose name is a key of `values`.
///
/// Single pass: text coming from `values` is never rescanned in the same call.
/// Placeholders with no entry are left exactly as they were.
pub fn substitute(text: &str, values: &BTreeMap<String, String>) -> String {
    placeholder_re()
        .replace_all(text, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scan_sorted_and_deduplicated() {
        let text = "Hello {{Name}}, your id is {{ID}}. Bye {{Name}}.";
        assert_eq!(scan(text), vec!["ID", "Name"]);
    }

    #[test]
    fn test_scan_no_placeholders() {
        assert!(scan("Plain text, {single} braces and }} stray closers").is_empty());
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_scan_accepts_any_name_verbatim() {
        let text = "{{ First Name }} {{date-of.birth}} {{}}";
        assert_eq!(scan(text), vec!["", " First Name ", "date-of.birth"]);
    }

    #[test]
    fn test_scan_stops_at_first_closing_pair() {
        assert_eq!(scan("{{a}}b}}"), vec!["a"]);
        assert_eq!(scan("{{a}}{{b}}"), vec!["a", "b"]);
    }

    #[test]
    fn test_scan_does_not_span_lines() {
        assert!(scan("{{broken\nname}}").is_empty());
    }

    #[test]
    fn test_substitute_scenario() {
        let out = substitute(
            "Hello {{Name}}, your id is {{ID}}.",
            &values(&[("Name", "Ann"), ("ID", "42")]),
        );
        assert_eq!(out, "Hello Ann, your id is 42.");
    }

    #[test]
    fn test_substitute_leaves_unknown_placeholders() {
        let out = substitute("{{A}} and {{B}}", &values(&[("A", "x")]));
        assert_eq!(out, "x and {{B}}");
    }

    #[test]
    fn test_substitute_empty_value() {
        assert_eq!(substitute("[{{A}}]", &values(&[("A", "")])), "[]");
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let m = values(&[("A", "{{B}}"), ("B", "boom")]);
        let once = substitute("{{A}}", &m);
        assert_eq!(once, "{{B}}");
        // A second call does pick up the injected placeholder.
        assert_eq!(substitute(&once, &m), "boom");
    }

    #[test]
    fn test_substitute_value_with_dollar_signs() {
        let out = substitute("Total: {{amount}}", &values(&[("amount", "$1 $2")]));
        assert_eq!(out, "Total: $1 $2");
    }

    #[test]
    fn test_token() {
        assert_eq!(token("Name"), "{{Name}}");
    }
}

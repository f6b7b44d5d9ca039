//! The generated form: one text input per placeholder plus the output name.

use crate::config::UnfilledPolicy;
use crate::error::{DocfillError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Field layout shown to the user, derived from the active template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Placeholder names in display order
    pub fields: Vec<String>,
    /// Label of the mandatory output-name input
    pub output_name_label: String,
}

impl Form {
    pub fn new(fields: Vec<String>, output_name_label: impl Into<String>) -> Self {
        Form {
            fields,
            output_name_label: output_name_label.into(),
        }
    }

    /// True when the template has nothing to fill
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// What the user sent back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub output_name: Option<String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// Parse a `NAME=VALUE` pair. Only the first `=` separates; the value may be empty.
pub fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

/// The output name, trimmed and made safe to use as a single file name component.
///
/// Absent or blank fails with [`DocfillError::MissingRequiredField`].
pub fn validate_output_name(output_name: Option<&str>, label: &str) -> Result<String> {
    let trimmed = output_name.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Err(DocfillError::MissingRequiredField(label.to_string()));
    }
    let sanitized: String = trimmed
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if sanitized.chars().all(|c| c == '.') {
        return Err(DocfillError::MissingRequiredField(label.to_string()));
    }
    Ok(sanitized)
}

/// Values for exactly the fields of `form`.
///
/// Entries for names the form no longer has are dropped. Fields without an
/// entry get the empty string under [`UnfilledPolicy::Blank`] and stay out of
/// the map under [`UnfilledPolicy::Keep`], so their placeholder passes through.
pub fn complete_values(
    form: &Form,
    submitted: &BTreeMap<String, String>,
    policy: UnfilledPolicy,
) -> BTreeMap<String, String> {
    for name in submitted.keys() {
        if !form.fields.contains(name) {
            warn!(field = %name, "dropping value for a field the active template does not have");
        }
    }

    let mut values = BTreeMap::new();
    for name in &form.fields {
        match (submitted.get(name), policy) {
            (Some(v), _) => {
                values.insert(name.clone(), v.clone());
            }
            (None, UnfilledPolicy::Blank) => {
                values.insert(name.clone(), String::new());
            }
            (None, UnfilledPolicy::Keep) => {}
        }
    }
    values
}

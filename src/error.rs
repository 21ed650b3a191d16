//! Error types for duplicate-value validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Failure reported by a single rule.
///
/// A `RuleError` is a data result, not a control-flow error: rules return it
/// to describe an invalid value, never to signal a fault in the rule itself.
/// The message is a template; `{name}` placeholders are filled from `params`
/// by [`interpolate_message`](RuleError::interpolate_message).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleError {
    /// Rule code (e.g., "duplicate")
    pub code: String,
    /// Message template shown to end users
    pub message: String,
    /// Parameters for message interpolation
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, serde_json::Value>,
}

impl RuleError {
    /// Create a new rule error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            params: HashMap::new(),
        }
    }

    /// Attach a parameter for message interpolation.
    pub fn param(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.params.insert(key.into(), v);
        }
        self
    }

    /// Render the message template, replacing `{name}` placeholders with the
    /// matching parameter values. Placeholders without a parameter are left
    /// untouched.
    pub fn interpolate_message(&self) -> String {
        let mut rendered = self.message.clone();
        for (key, value) in &self.params {
            let placeholder = format!("{{{key}}}");
            let replacement = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            rendered = rendered.replace(&placeholder, &replacement);
        }
        rendered
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.interpolate_message())
    }
}

impl std::error::Error for RuleError {}

/// Validation failures collected across the fields of one subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Map of field name to the failures recorded for that field
    #[serde(flatten)]
    pub fields: HashMap<String, Vec<RuleError>>,
}

impl ValidationErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a field.
    pub fn add(&mut self, field: impl Into<String>, error: RuleError) {
        self.fields.entry(field.into()).or_default().push(error);
    }

    /// Merge another collection into this one.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.fields {
            self.fields.entry(field).or_default().extend(errors);
        }
    }

    /// True if no failures were recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of failures across all fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// Failures recorded for a specific field.
    pub fn get(&self, field: &str) -> Option<&Vec<RuleError>> {
        self.fields.get(field)
    }

    /// Names of all fields with failures.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Convert to a `Result` - `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Build the serializable report surfaced to callers (CLI output, API
    /// responses, form UIs). Messages are interpolated here.
    pub fn to_report(&self) -> ValidationReport {
        let mut fields: Vec<FieldFailure> = self
            .fields
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| FieldFailure {
                    field: field.clone(),
                    code: e.code.clone(),
                    message: e.interpolate_message(),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ValidationReport {
            error: ReportBody {
                error_type: "validation_error".to_string(),
                message: "Validation failed".to_string(),
                fields,
            },
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {} error(s)", self.len())
    }
}

impl std::error::Error for ValidationErrors {}

/// Report format for validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub error: ReportBody,
}

/// Body of a validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub fields: Vec<FieldFailure>,
}

/// Single field failure in a report, with the message already interpolated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Rule configuration error.
///
/// Raised while building rules, before any evaluation runs. Surfaced to the
/// integrator, never to end users.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A serialized rule referenced a predicate name that was never registered.
    #[error("no predicate registered under name `{name}`")]
    UnknownPredicate {
        /// The missing predicate name
        name: String,
    },
}

/// Transport failure reported by an async duplicate probe.
///
/// Distinct from a validation failure: this means the probe could not answer
/// at all (connection refused, query error), not that the value is a duplicate.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ProbeError {
    /// Human-readable description of the fault
    pub message: String,
}

impl ProbeError {
    /// Create a new probe error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ProbeError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

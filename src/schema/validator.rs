//! Template validation against the NXDL slots it was generated from
//!
//! Validation never aborts: every problem becomes a [`ValidationIssue`] in a
//! [`ValidationResult`], and the caller decides whether a partially filled
//! template is acceptable.

use chrono::{DateTime, NaiveDateTime};
use miette::Diagnostic;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::core::template::{Template, TemplateValue};
use crate::schema::naming::generic_path;
use crate::schema::nxdl::SchemaNode;
use crate::schema::walker::{generate_template, SlotKind, TemplateSlot};

/// Validation failure rendered as one diagnostic with every violation attached
#[derive(Debug, Error, Diagnostic)]
#[error("Template validation failed: {summary}")]
#[diagnostic(
    code(nxconv::schema::validation_error),
    help("Fill the listed paths through the reader or an additional metadata file")
)]
pub struct ValidationError {
    summary: String,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single violation inside a [`ValidationError`]
#[derive(Debug, Error, Diagnostic)]
#[error("{path}: {message}")]
pub struct SchemaViolation {
    path: String,
    message: String,

    #[help]
    help: Option<String>,
}

impl ValidationError {
    pub fn new(violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            summary,
            violations,
        }
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

/// Fill state of a slot after the reader ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Filled,
    Unfilled,
    Missing,
}

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Missing,
    Unfilled,
    TypeMismatch,
    NotInEnumeration,
    InvalidUnits,
    Undocumented,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub path: String,
    pub kind: IssueKind,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(path: &str, kind: IssueKind, message: String) -> Self {
        Self {
            path: path.to_string(),
            kind,
            message,
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    statuses: BTreeMap<String, PathStatus>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    /// Fill state of a required path, `None` for paths the schema does not know
    pub fn status(&self, path: &str) -> Option<PathStatus> {
        self.statuses.get(path).copied()
    }

    pub fn statuses(&self) -> impl Iterator<Item = (&str, PathStatus)> {
        self.statuses.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of required paths that ended up filled
    pub fn filled_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| **s == PathStatus::Filled)
            .count()
    }

    /// Turn the errors into a diagnostic, `None` when there are none
    pub fn to_error(&self) -> Option<ValidationError> {
        if self.errors.is_empty() {
            return None;
        }
        let violations = self
            .errors
            .iter()
            .map(|issue| SchemaViolation {
                path: issue.path.clone(),
                message: issue.message.clone(),
                help: issue.suggestion.clone(),
            })
            .collect();
        Some(ValidationError::new(violations))
    }
}

/// Compare a populated template with the template generated from `schema_root`.
///
/// `required` is the skeleton the reader was given; `populated` is what it
/// returned.
pub fn validate(
    required: &Template,
    populated: &Template,
    schema_root: &SchemaNode,
) -> ValidationResult {
    let slots = match generate_template(schema_root) {
        Ok(generated) => generated.slots,
        Err(_) => Vec::new(),
    };
    let by_path: BTreeMap<&str, &TemplateSlot> =
        slots.iter().map(|s| (s.path.as_str(), s)).collect();

    let mut result = ValidationResult::default();

    for path in required.keys() {
        let slot = by_path.get(path).copied();
        let optional = slot.map_or(false, |s| s.optional);

        let status = if !populated.contains(path) {
            PathStatus::Missing
        } else if populated.is_filled(path) {
            PathStatus::Filled
        } else {
            PathStatus::Unfilled
        };
        result.statuses.insert(path.to_string(), status);

        match status {
            PathStatus::Missing if !optional => result.errors.push(
                ValidationIssue::new(
                    path,
                    IssueKind::Missing,
                    "required path is missing from the populated template".to_string(),
                )
                .with_suggestion("Readers must return every path they were given"),
            ),
            PathStatus::Unfilled if !optional => result.errors.push(
                ValidationIssue::new(
                    path,
                    IssueKind::Unfilled,
                    "required path was not filled by the reader".to_string(),
                )
                .with_suggestion("Provide the value in a metadata file (.yaml/.json)"),
            ),
            PathStatus::Filled => {
                if let (Some(slot), Some(value)) = (slot, populated.get(path)) {
                    result.errors.extend(check_value(slot, value));
                }
            }
            _ => {}
        }
    }

    let documented: HashSet<String> = slots.iter().map(|s| generic_path(&s.path)).collect();
    for path in populated.keys() {
        if required.contains(path) || documented.contains(&generic_path(path)) {
            continue;
        }
        result.warnings.push(ValidationIssue::new(
            path,
            IssueKind::Undocumented,
            "path is not documented by the schema".to_string(),
        ));
    }

    result
}

/// Type, enumeration and units constraints for a filled slot
fn check_value(slot: &TemplateSlot, value: &TemplateValue) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if slot.kind == SlotKind::Units {
        if value.as_text().map_or(true, |u| u.trim().is_empty()) {
            issues.push(
                ValidationIssue::new(
                    &slot.path,
                    IssueKind::InvalidUnits,
                    format!("units must be a non-empty string, got {}", value.kind()),
                )
                .with_suggestion("Use a unit symbol such as \"nm\" or \"s\""),
            );
        }
        return issues;
    }

    if let Some(nx_type) = slot.nx_type.as_deref() {
        if !matches_nx_type(nx_type, value) {
            issues.push(ValidationIssue::new(
                &slot.path,
                IssueKind::TypeMismatch,
                format!("expected {} but got {} ({})", nx_type, value.kind(), value),
            ));
        }
    }

    if let Some(allowed) = slot.enumeration.as_ref().filter(|a| !a.is_empty()) {
        let text = value.to_string();
        if !allowed.iter().any(|a| *a == text) {
            issues.push(
                ValidationIssue::new(
                    &slot.path,
                    IssueKind::NotInEnumeration,
                    format!("'{}' is not an allowed value", text),
                )
                .with_suggestion(format!("Valid values: {}", allowed.join(", "))),
            );
        }
    }

    issues
}

fn is_integral(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0
}

fn numbers(value: &TemplateValue) -> Option<Vec<f64>> {
    match value {
        TemplateValue::Int(i) => Some(vec![*i as f64]),
        TemplateValue::Float(x) => Some(vec![*x]),
        TemplateValue::Vector(v) => Some(v.clone()),
        TemplateValue::Matrix(m) => Some(m.iter().flatten().copied().collect()),
        TemplateValue::Text(s) => s.trim().parse::<f64>().ok().map(|x| vec![x]),
        _ => None,
    }
}

/// Whether `value` is acceptable for an NXDL type; unknown types accept anything
pub fn matches_nx_type(nx_type: &str, value: &TemplateValue) -> bool {
    match nx_type {
        "NX_FLOAT" | "NX_NUMBER" => numbers(value).is_some(),
        "NX_INT" => numbers(value).map_or(false, |n| n.iter().all(|x| is_integral(*x))),
        "NX_UINT" => numbers(value)
            .map_or(false, |n| n.iter().all(|x| is_integral(*x) && *x >= 0.0)),
        "NX_POSINT" => numbers(value)
            .map_or(false, |n| n.iter().all(|x| is_integral(*x) && *x > 0.0)),
        "NX_BOOLEAN" => match value {
            TemplateValue::Bool(_) => true,
            TemplateValue::Text(s) => matches!(s.to_lowercase().as_str(), "true" | "false"),
            _ => false,
        },
        "NX_CHAR" => matches!(value, TemplateValue::Text(_)),
        "NX_DATE_TIME" => value.as_text().map_or(false, is_iso8601),
        _ => true,
    }
}

fn is_iso8601(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

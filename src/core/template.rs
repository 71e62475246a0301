//! Flat path → value template that readers fill and writers consume

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// A single value stored at a template path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// One-dimensional numeric data (axes, signals, ranges)
    Vector(Vec<f64>),
    /// Row-major two-dimensional numeric data
    Matrix(Vec<Vec<f64>>),
    /// Anything else that arrived through JSON/YAML metadata
    Other(JsonValue),
}

impl TemplateValue {
    /// Convert a metadata value; `null` means "nothing to fill"
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(TemplateValue::Bool(b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(TemplateValue::Int(i)),
                None => n.as_f64().map(TemplateValue::Float),
            },
            JsonValue::String(s) => Some(TemplateValue::Text(s)),
            JsonValue::Array(items) => {
                if let Some(vector) = numeric_row(&items) {
                    return Some(TemplateValue::Vector(vector));
                }
                let rows: Option<Vec<Vec<f64>>> = items
                    .iter()
                    .map(|row| row.as_array().and_then(|r| numeric_row(r)))
                    .collect();
                match rows {
                    Some(rows) if !rows.is_empty() => Some(TemplateValue::Matrix(rows)),
                    _ => Some(TemplateValue::Other(JsonValue::Array(items))),
                }
            }
            other => Some(TemplateValue::Other(other)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TemplateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short human-readable kind, used in validation messages
    pub fn kind(&self) -> &'static str {
        match self {
            TemplateValue::Bool(_) => "boolean",
            TemplateValue::Int(_) => "integer",
            TemplateValue::Float(_) => "float",
            TemplateValue::Text(_) => "string",
            TemplateValue::Vector(_) => "numeric array",
            TemplateValue::Matrix(_) => "2D numeric array",
            TemplateValue::Other(_) => "structured value",
        }
    }
}

/// Returns the numbers of a non-empty all-numeric JSON array
fn numeric_row(items: &[JsonValue]) -> Option<Vec<f64>> {
    if items.is_empty() {
        return None;
    }
    items.iter().map(JsonValue::as_f64).collect()
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Text(s) => write!(f, "{}", s),
            TemplateValue::Bool(b) => write!(f, "{}", b),
            TemplateValue::Int(i) => write!(f, "{}", i),
            TemplateValue::Float(x) => write!(f, "{}", x),
            other => match serde_json::to_string(other) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "<{}>", other.kind()),
            },
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::Text(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::Text(s)
    }
}

impl From<f64> for TemplateValue {
    fn from(x: f64) -> Self {
        TemplateValue::Float(x)
    }
}

impl From<i64> for TemplateValue {
    fn from(i: i64) -> Self {
        TemplateValue::Int(i)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl From<Vec<f64>> for TemplateValue {
    fn from(v: Vec<f64>) -> Self {
        TemplateValue::Vector(v)
    }
}

impl From<Vec<Vec<f64>>> for TemplateValue {
    fn from(m: Vec<Vec<f64>>) -> Self {
        TemplateValue::Matrix(m)
    }
}

/// Mapping from NeXus template path to an optional value.
///
/// `None` marks a slot that is required but not yet filled. Paths are never
/// removed once present; readers can only fill or overwrite them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Template {
    entries: BTreeMap<String, Option<TemplateValue>>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unfilled slot, keeping any value already present
    pub fn reserve(&mut self, path: impl Into<String>) {
        self.entries.entry(path.into()).or_insert(None);
    }

    /// Fill (or overwrite) a path
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<TemplateValue>) {
        self.entries.insert(path.into(), Some(value.into()));
    }

    /// Store an optional value; `None` keeps the key but leaves it unfilled
    pub fn set_optional(&mut self, path: impl Into<String>, value: Option<TemplateValue>) {
        match value {
            Some(v) => self.set(path, v),
            None => self.reserve(path),
        }
    }

    /// Value at a path, if the path exists and is filled
    pub fn get(&self, path: &str) -> Option<&TemplateValue> {
        self.entries.get(path).and_then(Option::as_ref)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_filled(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Layer `other` on top of this template (last writer wins per path)
    pub fn merge(&mut self, other: Template) {
        for (path, value) in other.entries {
            self.set_optional(path, value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TemplateValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Skeleton listing used by `--generate-template`: sorted keys, every value `"None"`
    pub fn skeleton_json(&self) -> String {
        let skeleton: BTreeMap<&str, &str> = self.keys().map(|k| (k, "None")).collect();
        serde_json::to_string_pretty(&skeleton).unwrap_or_else(|_| "{}".to_string())
    }
}

impl FromIterator<(String, TemplateValue)> for Template {
    fn from_iter<I: IntoIterator<Item = (String, TemplateValue)>>(iter: I) -> Self {
        let mut template = Template::new();
        for (path, value) in iter {
            template.set(path, value);
        }
        template
    }
}

//! Declarative metadata extraction from line-oriented file headers
//!
//! A metadata map pairs template paths with an [`ExtractionRule`]. The map is
//! evaluated against the header lines of one file; a rule that cannot be
//! applied is logged and its path is left as it was.

use thiserror::Error;

use crate::core::template::{Template, TemplateValue};

/// Computes a value from the full list of header lines
pub type Transform = fn(&[String]) -> Result<TemplateValue, ExtractError>;

/// How one template path is derived from a header
#[derive(Clone, Copy)]
pub enum ExtractionRule {
    /// Fixed value, independent of the file
    Literal(&'static str),
    /// The header line at this index, verbatim
    Index(usize),
    /// Computed from the whole header
    Transform(Transform),
}

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("header has {available} lines, line {index} was requested")]
    MissingLine { index: usize, available: usize },

    #[error("line {index}: cannot read {what} from '{text}'")]
    Parse {
        index: usize,
        what: &'static str,
        text: String,
    },
}

/// Header line at `index`
pub fn line(lines: &[String], index: usize) -> Result<&str, ExtractError> {
    lines
        .get(index)
        .map(String::as_str)
        .ok_or(ExtractError::MissingLine {
            index,
            available: lines.len(),
        })
}

/// Header line at `index` parsed as a float
pub fn float_line(lines: &[String], index: usize) -> Result<f64, ExtractError> {
    let text = line(lines, index)?;
    text.trim().parse().map_err(|_| ExtractError::Parse {
        index,
        what: "a number",
        text: text.to_string(),
    })
}

impl ExtractionRule {
    pub fn evaluate(&self, lines: &[String]) -> Result<TemplateValue, ExtractError> {
        match self {
            ExtractionRule::Literal(value) => Ok(TemplateValue::from(*value)),
            ExtractionRule::Index(index) => line(lines, *index).map(TemplateValue::from),
            ExtractionRule::Transform(transform) => transform(lines),
        }
    }
}

/// Evaluate every rule of `map` against `lines` and store the results
pub fn apply_metadata_map(
    map: &[(&str, ExtractionRule)],
    lines: &[String],
    template: &mut Template,
) {
    for (path, rule) in map {
        match rule.evaluate(lines) {
            Ok(value) => {
                tracing::debug!(path, value = %value, "metadata extracted");
                template.set(*path, value);
            }
            Err(e) => tracing::warn!(path, error = %e, "metadata entry skipped"),
        }
    }
}

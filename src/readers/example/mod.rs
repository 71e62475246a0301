//! Generic metadata reader
//!
//! Fills a template from JSON/YAML documents whose keys are either absolute
//! template paths or trailing parts of one (`data/wavelength`,
//! `SAMPLE[sample]/name`). Useful for application definitions without an
//! instrument-specific reader and as a reference for writing new readers.

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::core::template::{Template, TemplateValue};
use crate::readers::base::{read_files, FileParser, ParseError, Reader};
use crate::readers::utils::{flatten, load_json, load_yaml};

const EXTENSIONS: &[(&str, FileParser)] = &[
    (".json", parse_json),
    (".yml", parse_yml),
    (".yaml", parse_yml),
];

pub struct ExampleReader;

pub fn create() -> Box<dyn Reader> {
    Box::new(ExampleReader)
}

impl Reader for ExampleReader {
    fn name(&self) -> &'static str {
        "example"
    }

    fn supported_nxdls(&self) -> &'static [&'static str] {
        &["NXtest"]
    }

    fn read(&self, mut template: Template, file_paths: &[PathBuf], extra: &[JsonValue]) -> Template {
        let mut provided = Template::new();
        read_files(&mut provided, file_paths, EXTENSIONS);
        for object in extra {
            provided.merge(document_to_template(object));
        }

        for (key, value) in provided.iter() {
            let Some(value) = value else { continue };
            match resolve(&template, key) {
                Resolved::Path(path) => template.set(path, value.clone()),
                Resolved::Ambiguous(count) => {
                    tracing::warn!(key, candidates = count, "key matches several template paths, ignoring it")
                }
                Resolved::Unknown => tracing::warn!(key, "key does not match any template path, ignoring it"),
            }
        }

        template.set("/ENTRY[entry]/definition", "NXtest");
        template
    }
}

enum Resolved {
    Path(String),
    Ambiguous(usize),
    Unknown,
}

/// Template path a metadata key refers to
fn resolve(template: &Template, key: &str) -> Resolved {
    if key.starts_with('/') {
        return Resolved::Path(key.to_string());
    }
    let suffix = format!("/{}", key);
    let matches: Vec<&str> = template.keys().filter(|k| k.ends_with(&suffix)).collect();
    match matches.as_slice() {
        [] => Resolved::Unknown,
        [only] => Resolved::Path(only.to_string()),
        many => Resolved::Ambiguous(many.len()),
    }
}

fn document_to_template(document: &JsonValue) -> Template {
    let mut template = Template::new();
    for (key, value) in flatten(document, "") {
        template.set_optional(key, TemplateValue::from_json(value));
    }
    template
}

fn parse_json(path: &Path) -> Result<Template, ParseError> {
    Ok(document_to_template(&load_json(path)?))
}

fn parse_yml(path: &Path) -> Result<Template, ParseError> {
    Ok(document_to_template(&load_yaml(path)?))
}

//! Metadata file helpers shared by readers

use serde_json::Value as JsonValue;
use std::path::Path;

use crate::core::template::{Template, TemplateValue};
use crate::readers::base::ParseError;

/// Parent group that ELN/YAML metadata is flattened into
pub const DEFAULT_PARENT: &str = "/ENTRY[entry]";

/// Read a file as JSON
pub fn load_json(path: &Path) -> Result<JsonValue, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ParseError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a file as YAML, into the same value model as JSON
pub fn load_yaml(path: &Path) -> Result<JsonValue, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }
    serde_yml::from_str(&content).map_err(|source| ParseError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", parent, key)
    }
}

/// Flatten nested mappings into `(path, leaf)` pairs below `parent`
pub fn flatten(value: &JsonValue, parent: &str) -> Vec<(String, JsonValue)> {
    let mut items = Vec::new();
    if let JsonValue::Object(map) = value {
        for (key, val) in map {
            let path = join(parent, key);
            match val {
                JsonValue::Object(_) => items.extend(flatten(val, &path)),
                leaf => items.push((path, leaf.clone())),
            }
        }
    }
    items
}

/// Flatten ELN-style metadata into template paths.
///
/// Keys are renamed through `convert` at every level, leaf paths are then
/// rewritten through `replace_nested`, and a trailing `/value` segment is
/// folded onto its parent path.
pub fn flatten_and_replace(
    value: &JsonValue,
    convert: &[(&str, &str)],
    replace_nested: &[(&str, &str)],
) -> Template {
    let renamed = rename_keys(value, convert);
    let mut template = Template::new();
    for (path, leaf) in flatten(&renamed, DEFAULT_PARENT) {
        let mut path = path;
        for (old, new) in replace_nested {
            path = path.replace(old, new);
        }
        if let Some(stripped) = path.strip_suffix("/value") {
            path = stripped.to_string();
        }
        template.set_optional(path, TemplateValue::from_json(leaf));
    }
    template
}

fn rename_keys(value: &JsonValue, convert: &[(&str, &str)]) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, val)| {
                    let key = convert
                        .iter()
                        .find(|(from, _)| *from == key.as_str())
                        .map_or_else(|| key.clone(), |(_, to)| to.to_string());
                    (key, rename_keys(val, convert))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A top-level JSON object whose keys are already template paths
pub fn object_as_template(value: JsonValue, path: &Path) -> Result<Template, ParseError> {
    let JsonValue::Object(map) = value else {
        return Err(ParseError::format(path, "expected a mapping of template paths"));
    };
    let mut template = Template::new();
    for (key, val) in map {
        template.set_optional(key, TemplateValue::from_json(val));
    }
    Ok(template)
}

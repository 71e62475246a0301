//! Output boundary: serializing a filled template
//!
//! The binary NeXus (HDF5) layout is not produced here. [`JsonTreeWriter`]
//! writes the same hierarchy as a JSON document so that the result of a
//! conversion can be inspected and compared.

use miette::Diagnostic;
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::template::Template;
use crate::schema::naming::split_class_segment;

/// Key holding the value of a field that also carries attributes
pub const VALUE_KEY: &str = "value";

#[derive(Debug, Error, Diagnostic)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    #[diagnostic(code(nxconv::writer::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize template: {0}")]
    #[diagnostic(code(nxconv::writer::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// Persists a filled template
pub trait TemplateWriter {
    fn write(&self, template: &Template, nxdl_path: &Path, output: &Path) -> Result<(), WriteError>;
}

/// Writes the template as a nested JSON tree
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeWriter;

impl TemplateWriter for JsonTreeWriter {
    fn write(&self, template: &Template, nxdl_path: &Path, output: &Path) -> Result<(), WriteError> {
        let tree = build_tree(template)?;
        let json = serde_json::to_string_pretty(&tree)?;
        std::fs::write(output, json).map_err(|source| WriteError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        tracing::info!(
            output = %output.display(),
            nxdl = %nxdl_path.display(),
            paths = template.len(),
            "wrote output file"
        );
        Ok(())
    }
}

/// Nest template paths into objects.
///
/// `CLASS[instance]` segments become an object keyed `instance` with an
/// `@NX_class` attribute, `@name` segments stay attribute keys and unfilled
/// slots are `null`.
pub fn build_tree(template: &Template) -> Result<JsonValue, WriteError> {
    let mut root = Map::new();
    root.insert("@NX_class".to_string(), JsonValue::from("NXroot"));

    for (path, value) in template.iter() {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            tracing::debug!(path, "skipping path without segments");
            continue;
        };
        let value = match value {
            Some(v) => serde_json::to_value(v)?,
            None => JsonValue::Null,
        };

        let mut node = &mut root;
        for segment in parents {
            node = descend(node, segment);
        }
        place(node, last, value);
    }

    Ok(JsonValue::Object(root))
}

fn descend<'a>(node: &'a mut Map<String, JsonValue>, segment: &str) -> &'a mut Map<String, JsonValue> {
    let (key, nx_class) = match split_class_segment(segment) {
        Some((class, instance)) => (instance, Some(format!("NX{}", class.to_lowercase()))),
        None => (segment, None),
    };
    let child = ensure_object(
        node.entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new())),
    );
    if let Some(nx_class) = nx_class {
        child
            .entry("@NX_class".to_string())
            .or_insert(JsonValue::from(nx_class));
    }
    child
}

fn place(node: &mut Map<String, JsonValue>, segment: &str, value: JsonValue) {
    if segment.starts_with('@') {
        node.insert(segment.to_string(), value);
        return;
    }
    if split_class_segment(segment).is_some() {
        descend(node, segment).insert(VALUE_KEY.to_string(), value);
        return;
    }
    match node.get_mut(segment) {
        Some(JsonValue::Object(existing)) => {
            existing.insert(VALUE_KEY.to_string(), value);
        }
        _ => {
            node.insert(segment.to_string(), value);
        }
    }
}

/// Turn a leaf into an object, keeping its previous value under [`VALUE_KEY`]
fn ensure_object(value: &mut JsonValue) -> &mut Map<String, JsonValue> {
    if !value.is_object() {
        let previous = value.take();
        let mut map = Map::new();
        map.insert(VALUE_KEY.to_string(), previous);
        *value = JsonValue::Object(map);
    }
    match value {
        JsonValue::Object(map) => map,
        _ => unreachable!("value was converted to an object above"),
    }
}

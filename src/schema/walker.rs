//! Template generation from an NXDL tree
//!
//! Walks the first group below the definition root and emits one slot per
//! `field` / `attribute` element, plus a `@units` slot for every field that
//! declares units other than `NX_UNITLESS`. Documentation subtrees are pruned.

use crate::core::template::Template;
use crate::schema::naming::{class_segment, UNITLESS};
use crate::schema::nxdl::{SchemaError, SchemaNode};

/// What kind of element a template slot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Field,
    Attribute,
    /// The implicit `@units` attribute of a field
    Units,
}

/// One required (or optional) template path and the schema facts behind it
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSlot {
    pub path: String,
    pub kind: SlotKind,
    /// Declared optional/recommended on this node or any ancestor
    pub optional: bool,
    /// `type` attribute of a field/attribute (`NX_FLOAT`, `NX_CHAR`, ...)
    pub nx_type: Option<String>,
    /// Allowed values when the node declares an enumeration
    pub enumeration: Option<Vec<String>>,
}

/// Result of walking a schema tree
#[derive(Debug, Clone, Default)]
pub struct GeneratedTemplate {
    pub template: Template,
    pub slots: Vec<TemplateSlot>,
    /// Paths of group/field/attribute elements that had neither `name` nor `type`
    pub anonymous: Vec<String>,
}

/// Walk an NXDL definition (its root element) into a template.
///
/// Fails only when the definition has no group to start from.
pub fn generate_template(root: &SchemaNode) -> Result<GeneratedTemplate, SchemaError> {
    let start = root.first_group().ok_or_else(|| SchemaError::NoGroup {
        origin: root.attr("name").unwrap_or("<definition>").to_string(),
    })?;

    let mut generated = GeneratedTemplate::default();
    walk(start, "", false, &mut generated);

    for path in &generated.anonymous {
        tracing::warn!(path = %path, "schema element has neither a name nor a type");
    }
    Ok(generated)
}

fn is_optional(node: &SchemaNode) -> bool {
    node.attr("optional") == Some("true")
        || node.attr("recommended") == Some("true")
        || node.attr("minOccurs") == Some("0")
}

/// Path segment for a node, `None` when it has neither `name` nor `type`
fn segment(node: &SchemaNode) -> Option<String> {
    let suffix = if let Some(name) = node.attr("name") {
        name.to_string()
    } else {
        class_segment(node.attr("type")?)
    };
    Some(if node.tag == "attribute" {
        format!("@{}", suffix)
    } else {
        suffix
    })
}

fn walk(node: &SchemaNode, parent: &str, parent_optional: bool, out: &mut GeneratedTemplate) {
    if node.tag == "doc" {
        return;
    }

    let is_slot = matches!(node.tag.as_str(), "field" | "attribute");
    let suffix = match segment(node) {
        Some(s) => s,
        None => {
            if is_slot || node.tag == "group" {
                out.anonymous.push(format!("{}/", parent));
            }
            if node.tag == "attribute" {
                "@".to_string()
            } else {
                String::new()
            }
        }
    };
    let path = format!("{}/{}", parent, suffix);
    let optional = parent_optional || is_optional(node);

    if is_slot {
        let kind = if node.tag == "field" {
            SlotKind::Field
        } else {
            SlotKind::Attribute
        };
        out.template.reserve(path.clone());
        out.slots.push(TemplateSlot {
            path: path.clone(),
            kind,
            optional,
            nx_type: node.attr("type").map(str::to_string),
            enumeration: node.enumeration(),
        });
    }

    if node.tag == "field" {
        if let Some(units) = node.attr("units").filter(|u| *u != UNITLESS) {
            let units_path = format!("{}/@units", path);
            out.template.reserve(units_path.clone());
            out.slots.push(TemplateSlot {
                path: units_path,
                kind: SlotKind::Units,
                optional,
                nx_type: None,
                enumeration: None,
            });
            tracing::trace!(path = %path, units, "field carries units");
        }
    }

    for child in &node.children {
        walk(child, &path, optional, out);
    }
}

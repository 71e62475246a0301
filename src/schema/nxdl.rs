//! NXDL document model
//!
//! A minimal element tree parsed with quick-xml. Only tags, attributes and
//! nesting are kept; text content (documentation) and comments are dropped.

use miette::Diagnostic;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while loading a schema document
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("Failed to read NXDL file {path}: {source}")]
    #[diagnostic(code(nxconv::schema::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed NXDL document {origin} at byte {position}: {message}")]
    #[diagnostic(
        code(nxconv::schema::syntax),
        help("Check that the file is a well-formed NXDL (XML) definition")
    )]
    Syntax {
        origin: String,
        position: u64,
        message: String,
    },

    #[error("NXDL document {origin} has no root element")]
    #[diagnostic(code(nxconv::schema::empty))]
    Empty { origin: String },

    #[error("NXDL document {origin} defines no group below its root element")]
    #[diagnostic(
        code(nxconv::schema::no_group),
        help("An application definition starts with a <group type=\"NXentry\"> element")
    )]
    NoGroup { origin: String },
}

/// One element of a parsed NXDL document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaNode {
    /// Namespace-free element name (`group`, `field`, `attribute`, `doc`, ...)
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder helper, mostly for tests and programmatic schemas
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The first child `group`, where template generation starts
    pub fn first_group(&self) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.tag == "group")
    }

    /// Values of `<enumeration><item value="..."/></enumeration>` below this node
    pub fn enumeration(&self) -> Option<Vec<String>> {
        let enumeration = self.children.iter().find(|c| c.tag == "enumeration")?;
        Some(
            enumeration
                .children
                .iter()
                .filter(|item| item.tag == "item")
                .filter_map(|item| item.attr("value").map(str::to_string))
                .collect(),
        )
    }
}

/// Load and parse an NXDL file
pub fn load(path: &Path) -> Result<SchemaNode, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content, &path.display().to_string())
}

/// Parse NXDL text. `origin` only labels error messages.
pub fn parse(xml: &str, origin: &str) -> Result<SchemaNode, SchemaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<SchemaNode> = Vec::new();
    let mut root: Option<SchemaNode> = None;

    loop {
        let syntax = |message: String, position: u64| SchemaError::Syntax {
            origin: origin.to_string(),
            position,
            message,
        };
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let node = element(&e).map_err(|m| syntax(m, reader.buffer_position()))?;
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let node = element(&e).map_err(|m| syntax(m, reader.buffer_position()))?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(syntax(e.to_string(), reader.error_position())),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SchemaError::Syntax {
            origin: origin.to_string(),
            position: reader.buffer_position(),
            message: format!("unclosed element <{}>", stack[stack.len() - 1].tag),
        });
    }

    root.ok_or_else(|| SchemaError::Empty {
        origin: origin.to_string(),
    })
}

fn element(e: &BytesStart<'_>) -> Result<SchemaNode, String> {
    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
    let mut node = SchemaNode::new(tag);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| err.to_string())?
            .into_owned();
        node.attributes.insert(key, value);
    }
    Ok(node)
}

fn attach(stack: &mut [SchemaNode], root: &mut Option<SchemaNode>, node: SchemaNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn nxdl_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(NX[a-z_]*)\.nxdl\.xml").expect("valid NXDL filename pattern"))
}

/// Application definition name from an NXDL path, e.g.
/// `defs/NXtransmission.nxdl.xml` → `NXtransmission`
pub fn nxdl_name_from_path(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    nxdl_file_pattern()
        .captures_iter(&text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

//! Schema system - NXDL parsing, template generation and validation

pub mod naming;
pub mod nxdl;
pub mod validator;
pub mod walker;

pub use nxdl::{nxdl_name_from_path, SchemaError, SchemaNode};
pub use validator::{validate, PathStatus, ValidationError, ValidationIssue, ValidationResult};
pub use walker::{generate_template, GeneratedTemplate, SlotKind, TemplateSlot};

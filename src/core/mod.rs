//! Core module - template model, configuration and conversion driver

pub mod config;
pub mod convert;
pub mod error;
pub mod logging;
pub mod template;

pub use config::Config;
pub use convert::{Conversion, ConversionOutcome};
pub use error::ConvertError;
pub use template::{Template, TemplateValue};

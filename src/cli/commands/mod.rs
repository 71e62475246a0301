//! CLI command implementations

pub mod convert;
pub mod readers;

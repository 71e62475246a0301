//! nxconv: NeXus data converter
//!
//! Turns NXDL application definitions into templates of required paths,
//! fills them through pluggable readers and validates the result against
//! the definition.

pub mod cli;
pub mod core;
pub mod readers;
pub mod schema;
pub mod writer;

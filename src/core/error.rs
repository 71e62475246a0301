//! Errors that abort a conversion run

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::readers::ReaderError;
use crate::schema::{SchemaError, ValidationError};
use crate::writer::WriteError;

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reader(#[from] ReaderError),

    #[error("Reader '{reader}' does not support {nxdl} (supported: {supported})")]
    #[diagnostic(
        code(nxconv::convert::unsupported_nxdl),
        help("Run `nxconv readers` to find a reader for this application definition")
    )]
    UnsupportedNxdl {
        nxdl: String,
        reader: String,
        supported: String,
    },

    #[error("Cannot determine the application definition name of {path}")]
    #[diagnostic(
        code(nxconv::convert::nxdl_name),
        help("Name the file after its definition, e.g. NXtransmission.nxdl.xml")
    )]
    NxdlNameUnresolved { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ValidationFailed(#[from] ValidationError),
}

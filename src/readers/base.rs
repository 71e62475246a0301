//! The reader capability and the file dispatch shared by concrete readers

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::template::Template;

/// A data reader fills template paths from one family of input files.
///
/// Readers are stateless: one instance is created per conversion run.
pub trait Reader {
    /// Name the reader is registered under
    fn name(&self) -> &'static str;

    /// Application definitions (`NXtransmission`, ...) this reader can fill
    fn supported_nxdls(&self) -> &'static [&'static str];

    /// Fill `template` from `file_paths`.
    ///
    /// Every key of the incoming template must still be present in the
    /// returned one. Problems with individual files are logged and skipped.
    fn read(&self, template: Template, file_paths: &[PathBuf], extra: &[JsonValue]) -> Template;

    fn supports(&self, nxdl: &str) -> bool {
        self.supported_nxdls().iter().any(|s| *s == nxdl)
    }
}

/// Why a single input file could not be used
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("{path}: {message}")]
    Format { path: PathBuf, message: String },
}

impl ParseError {
    pub fn format(path: &Path, message: impl Into<String>) -> Self {
        ParseError::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Parses one input file into the paths it provides
pub type FileParser = fn(&Path) -> Result<Template, ParseError>;

/// Extension of a path including the leading dot, empty when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Stable sort of input files by extension string.
///
/// Later files overwrite earlier ones, so the precedence between formats is
/// fixed by the extension order (`.asc` < `.json` < `.yaml` < `.yml`) and not
/// by the command line order.
pub fn sort_by_extension(file_paths: &[PathBuf]) -> Vec<&Path> {
    let mut sorted: Vec<&Path> = file_paths.iter().map(PathBuf::as_path).collect();
    sorted.sort_by_key(|p| extension_of(p));
    sorted
}

/// Run the matching parser for every file, in extension order, layering the
/// results onto `template`.
///
/// Unknown extensions, missing files and files that fail to parse are
/// skipped with a warning.
pub fn read_files(template: &mut Template, file_paths: &[PathBuf], parsers: &[(&str, FileParser)]) {
    for path in sort_by_extension(file_paths) {
        let extension = extension_of(path);
        let Some((_, parser)) = parsers.iter().find(|(ext, _)| *ext == extension) else {
            tracing::warn!(file = %path.display(), "file has an unsupported extension, ignoring file");
            continue;
        };
        if !path.exists() {
            tracing::warn!(file = %path.display(), "file does not exist, ignoring entry");
            continue;
        }

        match parser(path) {
            Ok(parsed) => {
                tracing::info!(file = %path.display(), paths = parsed.len(), "read input file");
                template.merge(parsed);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "could not parse file, ignoring it");
            }
        }
    }
}

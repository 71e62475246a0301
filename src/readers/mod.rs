//! Reader plugins and their registry
//!
//! Every reader lives in its own directory below `src/readers/` and exposes a
//! `create()` constructor; the directory name is the reader name. `base`
//! holds the shared capability only and is never offered as a reader.

pub mod base;
pub mod example;
pub mod extract;
pub mod transmission;
pub mod utils;

pub use base::Reader;

use miette::Diagnostic;
use std::collections::BTreeSet;
use thiserror::Error;

/// Name reserved for the abstract reader module
pub const BASE_READER: &str = "base";

/// Builds a fresh reader instance
pub type ReaderFactory = fn() -> Box<dyn Reader>;

/// One registered reader
#[derive(Debug, Clone, Copy)]
pub struct ReaderEntry {
    pub name: &'static str,
    pub create: ReaderFactory,
}

/// Built-in readers, one per directory below `src/readers/`
const BUILTIN_READERS: &[ReaderEntry] = &[
    ReaderEntry {
        name: "example",
        create: example::create,
    },
    ReaderEntry {
        name: "transmission",
        create: transmission::create,
    },
];

#[derive(Debug, Error, Diagnostic)]
pub enum ReaderError {
    #[error("Reader '{name}' not found")]
    #[diagnostic(code(nxconv::reader::not_found))]
    NotFound {
        name: String,
        available: Vec<String>,
        #[help]
        help: String,
    },
}

/// Lookup table from reader name to constructor
#[derive(Debug, Clone, Copy)]
pub struct ReaderRegistry {
    entries: &'static [ReaderEntry],
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new(BUILTIN_READERS)
    }
}

impl ReaderRegistry {
    pub fn new(entries: &'static [ReaderEntry]) -> Self {
        Self { entries }
    }

    fn visible(&self) -> impl Iterator<Item = &'static ReaderEntry> {
        self.entries.iter().filter(|e| e.name != BASE_READER)
    }

    /// Names of all selectable readers, sorted
    pub fn list_available(&self) -> BTreeSet<&'static str> {
        self.visible().map(|e| e.name).collect()
    }

    /// Instantiate the reader registered under `name` (case-insensitive exact match)
    pub fn load(&self, name: &str) -> Result<Box<dyn Reader>, ReaderError> {
        self.visible()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| (e.create)())
            .ok_or_else(|| {
                let available: Vec<String> =
                    self.list_available().iter().map(|s| s.to_string()).collect();
                ReaderError::NotFound {
                    name: name.to_string(),
                    help: format!("Available readers: {}", available.join(", ")),
                    available,
                }
            })
    }
}

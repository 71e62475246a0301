//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Reader used when nothing else selects one
pub const DEFAULT_READER: &str = "example";
/// Output file used when nothing else names one
pub const DEFAULT_OUTPUT: &str = "output.nxs";
/// Project config file looked up in the working directory
pub const PROJECT_CONFIG: &str = ".nxconv.yaml";

/// nxconv configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default reader for `nxconv convert`
    pub reader: Option<String>,

    /// Default output path
    pub output: Option<PathBuf>,

    /// Treat validation errors as fatal
    pub strict: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Some(Path::new(PROJECT_CONFIG)),
            |key| std::env::var(key).ok(),
        )
    }

    /// Layer the given files and environment lookup onto the defaults
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (see the accessors)

        // 2. Global user config (~/.config/nxconv/config.yaml)
        if let Some(path) = global {
            if let Some(global) = Self::read_file(path) {
                config.merge(global);
            }
        }

        // 3. Project config (./.nxconv.yaml)
        if let Some(path) = project {
            if let Some(project) = Self::read_file(path) {
                config.merge(project);
            }
        }

        // 4. Environment variables
        if let Some(reader) = env("NXCONV_READER") {
            config.reader = Some(reader);
        }
        if let Some(output) = env("NXCONV_OUTPUT") {
            config.output = Some(PathBuf::from(output));
        }
        if let Some(strict) = env("NXCONV_STRICT") {
            match parse_flag(&strict) {
                Some(flag) => config.strict = Some(flag),
                None => tracing::warn!(value = %strict, "NXCONV_STRICT is not a boolean, ignoring it"),
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "cannot read config file, ignoring it");
                return None;
            }
        };
        if contents.trim().is_empty() {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "malformed config file, ignoring it");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "nxconv")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.reader.is_some() {
            self.reader = other.reader;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.strict.is_some() {
            self.strict = other.strict;
        }
    }

    pub fn reader(&self) -> &str {
        self.reader.as_deref().unwrap_or(DEFAULT_READER)
    }

    pub fn output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    pub fn strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, None, no_env);
        assert_eq!(config.reader(), "example");
        assert_eq!(config.output(), PathBuf::from("output.nxs"));
        assert!(!config.strict());
    }

    #[test]
    fn test_layers_override_in_order() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.yaml");
        let project = dir.path().join("project.yaml");
        fs::write(&global, "reader: transmission\noutput: global.nxs\nstrict: true\n").unwrap();
        fs::write(&project, "output: project.nxs\n").unwrap();

        let config = Config::load_from(Some(&global), Some(&project), no_env);
        assert_eq!(config.reader(), "transmission");
        assert_eq!(config.output(), PathBuf::from("project.nxs"));
        assert!(config.strict());

        let config = Config::load_from(Some(&global), Some(&project), |key| match key {
            "NXCONV_READER" => Some("example".to_string()),
            "NXCONV_STRICT" => Some("false".to_string()),
            _ => None,
        });
        assert_eq!(config.reader(), "example");
        assert!(!config.strict());
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("project.yaml");
        fs::write(&project, "reader: [unclosed\n").unwrap();

        let config = Config::load_from(None, Some(&project), no_env);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_strict_env_is_ignored() {
        let config = Config::load_from(None, None, |key| {
            (key == "NXCONV_STRICT").then(|| "maybe".to_string())
        });
        assert_eq!(config.strict, None);
    }
}

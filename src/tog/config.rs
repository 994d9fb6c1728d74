//! Processing configurations and beautifier settings
//!
//! This module defines:
//! 1. Named processing configurations: which stage of the pipeline to stop at and what to
//!    produce (token dump, tree dump, links, rewritten source).
//! 2. [OrangeSettings], the knobs of the beautifier, loadable from a YAML or JSON file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// A named configuration specifying how far to run and what to produce
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub name: String,
    pub description: String,
    pub target: TargetSpec,
}

/// Where the pipeline stops and what it prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSpec {
    /// Stop at the token list
    Tokens,

    /// Stop at the parse tree
    Tree,

    /// Synchronize and dump the linked tree
    Links,

    /// Rewrite `%` formatting as f-strings and print the new source
    Fstringify,

    /// Beautify and print the new source. `split` enables long-line splitting.
    Beautify { split: bool },

    /// Synchronize and report success or the failure context
    Check,
}

/// Named configurations, kept in name order
pub struct ConfigRegistry {
    configs: BTreeMap<String, ProcessingConfig>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        ConfigRegistry {
            configs: BTreeMap::new(),
        }
    }

    /// Add `config`, replacing any configuration of the same name
    pub fn register(&mut self, config: ProcessingConfig) {
        self.configs.insert(config.name.clone(), config);
    }

    pub fn get(&self, name: &str) -> Option<&ProcessingConfig> {
        self.configs.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// Every configuration, by name
    pub fn list_all(&self) -> Vec<&ProcessingConfig> {
        self.configs.values().collect()
    }

    /// The built-in configurations, one per [TargetSpec] (two for beautify)
    pub fn with_defaults() -> Self {
        let mut registry = ConfigRegistry::new();

        registry.register(ProcessingConfig {
            name: "tokens".into(),
            description: "Lossless token list with paren links".into(),
            target: TargetSpec::Tokens,
        });

        registry.register(ProcessingConfig {
            name: "tree".into(),
            description: "Parse tree, without links".into(),
            target: TargetSpec::Tree,
        });

        registry.register(ProcessingConfig {
            name: "links".into(),
            description: "Synchronize tokens and tree, dump the linked tree".into(),
            target: TargetSpec::Links,
        });

        registry.register(ProcessingConfig {
            name: "fstringify".into(),
            description: "Rewrite % formatting as f-strings".into(),
            target: TargetSpec::Fstringify,
        });

        registry.register(ProcessingConfig {
            name: "beautify".into(),
            description: "PEP 8 spacing and blank lines".into(),
            target: TargetSpec::Beautify { split: false },
        });

        registry.register(ProcessingConfig {
            name: "orange".into(),
            description: "Beautify and split long lines at commas".into(),
            target: TargetSpec::Beautify { split: true },
        });

        registry.register(ProcessingConfig {
            name: "check".into(),
            description: "Synchronize and report the first mismatch, if any".into(),
            target: TargetSpec::Check,
        });

        registry
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Beautifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrangeSettings {
    /// Remove blank lines other than the ones added before classes, defs and decorators
    pub delete_blank_lines: bool,
    /// Lines at least this long are candidates for splitting
    pub max_split_line_length: usize,
    /// Split long lines
    pub orange: bool,
    /// Spaces per indentation level
    pub tab_width: usize,
}

impl Default for OrangeSettings {
    fn default() -> Self {
        OrangeSettings {
            delete_blank_lines: true,
            max_split_line_length: 88,
            orange: false,
            tab_width: 4,
        }
    }
}

/// Errors while loading settings
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    UnsupportedExtension(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Cannot read settings: {}", err),
            ConfigError::Yaml(err) => write!(f, "Invalid YAML settings: {}", err),
            ConfigError::Json(err) => write!(f, "Invalid JSON settings: {}", err),
            ConfigError::UnsupportedExtension(ext) => {
                write!(f, "Settings must be .yaml, .yml or .json, not '{}'", ext)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl OrangeSettings {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(ConfigError::Yaml)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Json)
    }

    /// Load settings, choosing the format by file extension. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&fs::read_to_string(path)?),
            "json" => Self::from_json(&fs::read_to_string(path)?),
            other => Err(ConfigError::UnsupportedExtension(other.to_string())),
        }
    }
}

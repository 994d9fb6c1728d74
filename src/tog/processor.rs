//! File processing API
//!
//! This module runs named configurations (see [ConfigRegistry]) over source text or files:
//!
//! ```rust,ignore
//! use tokenorder::tog::processor::Processor;
//! use tokenorder::tog::formats::OutputFormat;
//!
//! let processor = Processor::new();
//! let links = processor.process_source("links", "x = 1\n", "x.py", OutputFormat::Text)?;
//! let pretty = processor.process_file("beautify", "src/module.py", OutputFormat::Text)?;
//! ```
//!
//! Every configuration starts the same way: build the token list, balance parens, parse the
//! tree from the same tokens. What follows depends on the target: dump, synchronize, or
//! synchronize and rewrite. `check` runs the synchronizer over many files and reports each
//! outcome without stopping at the first failure.

use crate::tog::ast::Ast;
use crate::tog::balance::balance_parens_report;
use crate::tog::beautify::Orange;
use crate::tog::config::{ConfigError, ConfigRegistry, OrangeSettings, ProcessingConfig, TargetSpec};
use crate::tog::formats::{format_links, format_tokens, format_tree, FormatError, OutputFormat};
use crate::tog::fstringify::Fstringify;
use crate::tog::lexing::{make_tokens, read_file_with_encoding, TokenizeError};
use crate::tog::parsing::{parse_tokens, ParseError};
use crate::tog::synchronizer::{synchronize_with, AssignLinksError, Driver, Links};
use crate::tog::token::Token;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur during processing
#[derive(Debug)]
pub enum ProcessingError {
    Io(String),
    Tokenize(TokenizeError),
    Parse(ParseError),
    Links(AssignLinksError),
    Config(ConfigError),
    Format(FormatError),
    UnknownConfig(String),
}

impl std::error::Error for ProcessingError {}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingError::Io(msg) => write!(f, "IO error: {}", msg),
            ProcessingError::Tokenize(err) => write!(f, "Tokenize error: {}", err),
            ProcessingError::Parse(err) => write!(f, "Parse error: {}", err),
            ProcessingError::Links(err) => write!(f, "{}", err),
            ProcessingError::Config(err) => write!(f, "{}", err),
            ProcessingError::Format(err) => write!(f, "{}", err),
            ProcessingError::UnknownConfig(name) => write!(f, "Config '{}' not found", name),
        }
    }
}

impl From<TokenizeError> for ProcessingError {
    fn from(err: TokenizeError) -> Self {
        ProcessingError::Tokenize(err)
    }
}

impl From<ParseError> for ProcessingError {
    fn from(err: ParseError) -> Self {
        ProcessingError::Parse(err)
    }
}

impl From<AssignLinksError> for ProcessingError {
    fn from(err: AssignLinksError) -> Self {
        ProcessingError::Links(err)
    }
}

impl From<ConfigError> for ProcessingError {
    fn from(err: ConfigError) -> Self {
        ProcessingError::Config(err)
    }
}

impl From<FormatError> for ProcessingError {
    fn from(err: FormatError) -> Self {
        ProcessingError::Format(err)
    }
}

/// Tokens and tree of one source, before synchronization
struct Prepared {
    tokens: Vec<Token>,
    tree: Ast,
}

fn read_source(path: &Path) -> Result<String, ProcessingError> {
    match read_file_with_encoding(path) {
        Ok((encoding, source)) => {
            log::debug!("{}: read as {}", path.display(), encoding);
            Ok(source)
        }
        Err(TokenizeError::Io(msg)) => Err(ProcessingError::Io(msg)),
        Err(err) => Err(err.into()),
    }
}

fn prepare(source: &str) -> Result<Prepared, ProcessingError> {
    let mut tokens = make_tokens(source)?;
    let (_, pairing_errors) = balance_parens_report(&mut tokens);
    if !pairing_errors.is_empty() {
        log::warn!("{} paren pairing problems", pairing_errors.len());
    }
    let tree = parse_tokens(&tokens)?;
    Ok(Prepared { tokens, tree })
}

/// Result of a successful check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    /// Nodes visited by the synchronizer
    pub nodes: usize,
    /// Tokens matched
    pub matched: usize,
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} nodes, {} tokens matched", self.nodes, self.matched)
    }
}

/// Outcome of checking one file
#[derive(Debug)]
pub struct CheckReport {
    pub path: PathBuf,
    pub outcome: Result<CheckSummary, ProcessingError>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs processing configurations
pub struct Processor {
    registry: ConfigRegistry,
    settings: OrangeSettings,
    driver: Driver,
}

impl Processor {
    /// Create a processor with the default configurations and settings
    pub fn new() -> Self {
        Processor {
            registry: ConfigRegistry::with_defaults(),
            settings: OrangeSettings::default(),
            driver: Driver::default(),
        }
    }

    /// Create a processor with a custom registry
    pub fn with_registry(registry: ConfigRegistry) -> Self {
        Processor {
            registry,
            ..Processor::new()
        }
    }

    pub fn with_settings(mut self, settings: OrangeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Load beautifier settings from a YAML or JSON file
    pub fn with_settings_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ProcessingError> {
        let settings = OrangeSettings::load(path.as_ref())?;
        Ok(self.with_settings(settings))
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// List all available configurations
    pub fn list_configs(&self) -> Vec<&ProcessingConfig> {
        self.registry.list_all()
    }

    /// Run a named configuration over source text
    pub fn process_source(
        &self,
        config_name: &str,
        source: &str,
        file_name: &str,
        format: OutputFormat,
    ) -> Result<String, ProcessingError> {
        let config = self
            .registry
            .get(config_name)
            .ok_or_else(|| ProcessingError::UnknownConfig(config_name.to_string()))?;
        let Prepared { mut tokens, mut tree } = prepare(source)?;

        match config.target {
            TargetSpec::Tokens => Ok(format_tokens(&tokens, format)?),
            TargetSpec::Tree => Ok(format_tree(&tree, format)?),
            TargetSpec::Links => {
                let links = synchronize_with(&mut tokens, &tree, file_name, self.driver)?;
                Ok(format_links(&tree, &links, &tokens, format)?)
            }
            TargetSpec::Check => {
                let links = synchronize_with(&mut tokens, &tree, file_name, self.driver)?;
                Ok(format!("{}: {}\n", file_name, summarize(&links)))
            }
            TargetSpec::Fstringify => {
                let mut links = synchronize_with(&mut tokens, &tree, file_name, self.driver)?;
                let mut fstringify = Fstringify::new(file_name);
                let result = fstringify.fstringify(&mut tokens, &mut tree, &mut links);
                log::info!(
                    "{}: {} rewritten, {} skipped",
                    file_name,
                    fstringify.rewrites().len(),
                    fstringify.skipped().len()
                );
                Ok(result)
            }
            TargetSpec::Beautify { split } => {
                let settings = OrangeSettings {
                    orange: self.settings.orange || split,
                    ..self.settings.clone()
                };
                let hints = match synchronize_with(&mut tokens, &tree, file_name, self.driver) {
                    Ok(_) => Some(&tree),
                    Err(err) => {
                        log::warn!("{}: beautifying without tree hints: {}", file_name, err);
                        None
                    }
                };
                Ok(Orange::new(settings).beautify(&tokens, hints))
            }
        }
    }

    /// Run a named configuration over a file
    pub fn process_file<P: AsRef<Path>>(
        &self,
        config_name: &str,
        path: P,
        format: OutputFormat,
    ) -> Result<String, ProcessingError> {
        let path = path.as_ref();
        let source = read_source(path)?;
        self.process_source(config_name, &source, &path.display().to_string(), format)
    }

    /// Synchronize one file
    pub fn check_file(&self, path: &Path) -> Result<CheckSummary, ProcessingError> {
        let source = read_source(path)?;
        let Prepared { mut tokens, tree } = prepare(&source)?;
        let links = synchronize_with(&mut tokens, &tree, &path.display().to_string(), self.driver)?;
        Ok(summarize(&links))
    }

    /// Synchronize every file, reporting each outcome
    pub fn check_files<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<CheckReport> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let outcome = self.check_file(path);
                match &outcome {
                    Ok(summary) => log::info!("{}: ok, {}", path.display(), summary),
                    Err(err) => log::warn!("{}: {}", path.display(), err),
                }
                CheckReport {
                    path: path.to_path_buf(),
                    outcome,
                }
            })
            .collect()
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(links: &Links) -> CheckSummary {
    CheckSummary {
        nodes: links.visited().len(),
        matched: links.sync_trace().len(),
    }
}

/// Run a named configuration over source text with default settings
pub fn process_source(
    config_name: &str,
    source: &str,
    format: OutputFormat,
) -> Result<String, ProcessingError> {
    Processor::new().process_source(config_name, source, "<string>", format)
}

/// Run a named configuration over a file with default settings
pub fn process_file<P: AsRef<Path>>(
    config_name: &str,
    path: P,
    format: OutputFormat,
) -> Result<String, ProcessingError> {
    Processor::new().process_file(config_name, path, format)
}

/// Synchronize every file with default settings
pub fn check_files<P: AsRef<Path>>(paths: &[P]) -> Vec<CheckReport> {
    Processor::new().check_files(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unknown_config() {
        let err = process_source("nope", "x = 1\n", OutputFormat::Text).unwrap_err();
        assert!(matches!(err, ProcessingError::UnknownConfig(name) if name == "nope"));
    }

    #[test]
    fn test_tokenize_error_propagates() {
        let err = process_source("tokens", "x = (1\n", OutputFormat::Text).unwrap_err();
        assert!(matches!(err, ProcessingError::Tokenize(_)));
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = process_source("tree", "x = = 1\n", OutputFormat::Text).unwrap_err();
        assert!(matches!(err, ProcessingError::Parse(_)));
    }

    #[test]
    fn test_tree_text() {
        let out = process_source("tree", "x = 1\n", OutputFormat::Text).unwrap();
        assert_eq!(out, "Module\n  Assign\n    Name x\n    Constant 1\n");
    }

    #[test]
    fn test_check_summary() {
        let out = process_source("check", "x = 1\n", OutputFormat::Text).unwrap();
        assert_eq!(out, "<string>: 4 nodes, 4 tokens matched\n");
    }

    #[test]
    fn test_fstringify_config() {
        let out = process_source("fstringify", "print('%s' % x)\n", OutputFormat::Text).unwrap();
        assert_eq!(out, "print(f'{x}')\n");
    }

    #[test]
    fn test_beautify_configs() {
        let source = "x = foo(aaaa, bbbb, cccc, dddd)\n";
        assert_eq!(
            process_source("beautify", source, OutputFormat::Text).unwrap(),
            source
        );
        let settings = OrangeSettings {
            max_split_line_length: 20,
            ..OrangeSettings::default()
        };
        let out = Processor::new()
            .with_settings(settings)
            .process_source("orange", source, "t.py", OutputFormat::Text)
            .unwrap();
        assert_eq!(out, "x = foo(\n    aaaa,\n    bbbb,\n    cccc,\n    dddd\n)\n");
    }

    #[test]
    fn test_check_files_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.py");
        let missing = dir.path().join("missing.py");
        fs::write(&good, "def f(a, b=1):\n    return a\n").unwrap();

        let reports = check_files(&[good.clone(), missing.clone()]);
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_ok());
        assert_eq!(reports[0].path, good);
        assert!(matches!(reports[1].outcome, Err(ProcessingError::Io(_))));
    }
}

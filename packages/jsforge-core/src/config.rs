//! Build options shared by every step.
//!
//! Options deserialize from JSON so callers can keep them in a checked-in
//! file; everything here also feeds the artifact fingerprint, so any change
//! breaks the cache for every artifact.

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Closure compilation level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationLevel {
    WhitespaceOnly,
    Simple,
    Advanced,
}

impl OptimizationLevel {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::WhitespaceOnly => "WHITESPACE_ONLY",
            Self::Simple => "SIMPLE_OPTIMIZATIONS",
            Self::Advanced => "ADVANCED_OPTIMIZATIONS",
        }
    }
}

/// Which resolver scope contributes dependencies to the classpath.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClasspathScope {
    Compile,
    CompileRuntime,
    Runtime,
    Test,
}

impl ClasspathScope {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::CompileRuntime => "compile+runtime",
            Self::Runtime => "runtime",
            Self::Test => "test",
        }
    }
}

/// Output formatting toggles forwarded to the optimizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingOption {
    PrettyPrint,
    PrintInputDelimiter,
    SingleQuotes,
}

impl FormattingOption {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::PrettyPrint => "PRETTY_PRINT",
            Self::PrintInputDelimiter => "PRINT_INPUT_DELIMITER",
            Self::SingleQuotes => "SINGLE_QUOTES",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub scope: ClasspathScope,
    pub level: OptimizationLevel,
    pub defines: BTreeMap<String, String>,
    pub externs: BTreeSet<String>,
    pub formatting: BTreeSet<FormattingOption>,
    pub language_out: String,
    pub entry_points: Vec<String>,
    pub initial_script_filename: String,
    pub parallelism: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            scope: ClasspathScope::CompileRuntime,
            level: OptimizationLevel::Simple,
            defines: BTreeMap::new(),
            externs: BTreeSet::new(),
            formatting: BTreeSet::new(),
            language_out: "ECMASCRIPT_2017".to_string(),
            entry_points: Vec::new(),
            initial_script_filename: "bundle.js".to_string(),
            parallelism: num_cpus::get(),
        }
    }
}

impl BuildOptions {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| BuildError::graph(format!("invalid build options {}: {e}", path.display())))
    }
}

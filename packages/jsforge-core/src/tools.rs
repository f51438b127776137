//! Adapter seam for the external compiler front-ends.
//!
//! The annotation stripper, javac, the Java-to-JS transpiler and the closure
//! optimizer are opaque executables as far as the pipeline is concerned: a
//! worker hands an adapter its inputs and an output directory, and gets back
//! severity-tagged diagnostics. Adapters write to the output directory only.

use crate::config::{FormattingOption, OptimizationLevel};
use crate::log::TaskLog;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// What an adapter reports back. A tool succeeded iff it produced no
/// error-severity diagnostics.
#[derive(Clone, Debug, Default)]
pub struct ToolOutcome {
    pub diagnostics: Vec<Diagnostic>,
}

impl ToolOutcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn with_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}

/// A file paired with the source root it is relative to.
///
/// The stripper rewrites files in place, so records handed to it must carry
/// the root of the tree being rewritten or its output lands at the wrong
/// relative location.
#[derive(Clone, Debug)]
pub struct FileRecord {
    pub path: PathBuf,
    pub root: PathBuf,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
        }
    }

    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or(&self.path)
    }
}

#[derive(Clone, Debug)]
pub struct ClosureOptions {
    pub sources: Vec<PathBuf>,
    pub level: OptimizationLevel,
    pub defines: BTreeMap<String, String>,
    pub externs: BTreeSet<String>,
    pub formatting: BTreeSet<FormattingOption>,
    pub language_out: String,
    pub entry_points: Vec<String>,
    pub initial_script_filename: String,
}

/// One request variant per wrapped tool.
#[derive(Clone, Debug)]
pub enum ToolRequest {
    Javac {
        bootstrap: Vec<PathBuf>,
        classpath: Vec<PathBuf>,
        sources: Vec<FileRecord>,
    },
    Strip {
        sources: Vec<FileRecord>,
    },
    Transpile {
        classpath: Vec<PathBuf>,
        sources: Vec<FileRecord>,
        native_sources: Vec<FileRecord>,
    },
    Closure(ClosureOptions),
}

impl ToolRequest {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Javac { .. } => "javac",
            Self::Strip { .. } => "stripper",
            Self::Transpile { .. } => "transpiler",
            Self::Closure(_) => "closure",
        }
    }
}

pub trait ToolAdapter: Send + Sync {
    /// Invokes the tool. The adapter writes into `output` only; temporary
    /// files live wherever the adapter keeps its own scratch.
    fn invoke(
        &self,
        request: ToolRequest,
        output: &Path,
        log: &mut TaskLog,
    ) -> anyhow::Result<ToolOutcome>;
}

/// Maps each request variant onto a configured external executable.
#[derive(Clone, Debug)]
pub struct CommandTool {
    pub javac: PathBuf,
    pub stripper: PathBuf,
    pub transpiler: PathBuf,
    pub optimizer: PathBuf,
}

impl CommandTool {
    fn run(
        &self,
        program: &Path,
        args: Vec<String>,
        log: &mut TaskLog,
    ) -> anyhow::Result<ToolOutcome> {
        log.line(format!("{} {}", program.display(), args.join(" ")));
        let output = Command::new(program).args(&args).output()?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log.line(line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stderr.lines() {
            log.line(line);
        }

        if output.status.success() {
            Ok(ToolOutcome::success())
        } else {
            let mut diagnostics: Vec<Diagnostic> =
                stderr.lines().map(Diagnostic::error).collect();
            if diagnostics.is_empty() {
                diagnostics.push(Diagnostic::error(format!("exit status {}", output.status)));
            }
            Ok(ToolOutcome::with_diagnostics(diagnostics))
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

impl ToolAdapter for CommandTool {
    fn invoke(
        &self,
        request: ToolRequest,
        output: &Path,
        log: &mut TaskLog,
    ) -> anyhow::Result<ToolOutcome> {
        match request {
            ToolRequest::Javac {
                bootstrap,
                classpath,
                sources,
            } => {
                let mut args = vec!["-implicit:none".to_string()];
                if !bootstrap.is_empty() {
                    args.push("-bootclasspath".to_string());
                    args.push(join_paths(&bootstrap));
                }
                if !classpath.is_empty() {
                    args.push("-cp".to_string());
                    args.push(join_paths(&classpath));
                }
                args.push("-d".to_string());
                args.push(output.to_string_lossy().into_owned());
                args.extend(sources.iter().map(|s| s.path.to_string_lossy().into_owned()));
                self.run(&self.javac, args, log)
            }
            ToolRequest::Strip { sources } => {
                let mut args = vec![
                    "-d".to_string(),
                    output.to_string_lossy().into_owned(),
                ];
                args.extend(sources.iter().map(|s| s.path.to_string_lossy().into_owned()));
                self.run(&self.stripper, args, log)
            }
            ToolRequest::Transpile {
                classpath,
                sources,
                native_sources,
            } => {
                let mut args = Vec::new();
                if !classpath.is_empty() {
                    args.push("-cp".to_string());
                    args.push(join_paths(&classpath));
                }
                args.push("-d".to_string());
                args.push(output.to_string_lossy().into_owned());
                for native in &native_sources {
                    args.push("-nativesourcepath".to_string());
                    args.push(native.path.to_string_lossy().into_owned());
                }
                args.extend(sources.iter().map(|s| s.path.to_string_lossy().into_owned()));
                self.run(&self.transpiler, args, log)
            }
            ToolRequest::Closure(options) => {
                let mut args = vec![
                    "--compilation_level".to_string(),
                    options.level.as_tag().to_string(),
                    "--language_out".to_string(),
                    options.language_out.clone(),
                    "--js_output_file".to_string(),
                    output
                        .join(&options.initial_script_filename)
                        .to_string_lossy()
                        .into_owned(),
                ];
                for (key, value) in &options.defines {
                    args.push("--define".to_string());
                    args.push(format!("{key}={value}"));
                }
                for extern_file in &options.externs {
                    args.push("--externs".to_string());
                    args.push(extern_file.clone());
                }
                for formatting in &options.formatting {
                    args.push("--formatting".to_string());
                    args.push(formatting.as_tag().to_string());
                }
                for entry_point in &options.entry_points {
                    args.push("--entry_point".to_string());
                    args.push(entry_point.clone());
                }
                args.extend(
                    options
                        .sources
                        .iter()
                        .map(|s| s.to_string_lossy().into_owned()),
                );
                self.run(&self.optimizer, args, log)
            }
        }
    }
}

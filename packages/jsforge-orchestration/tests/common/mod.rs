//! Shared test support: a mock toolchain standing in for the external
//! compiler front-ends, plus graph and request builders.

#![allow(dead_code)]

use jsforge_core::paths;
use jsforge_orchestration::{
    Artifact, ArtifactCoords, ArtifactKind, BuildOptions, BuildRequest, TaskLog, ToolAdapter,
    ToolOutcome, ToolRequest,
};
use jsforge_core::tools::Diagnostic;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zip::write::FileOptions;
use zip::ZipWriter;

/// In-process stand-ins for javac, the stripper, the transpiler and the
/// closure optimizer. Records every invocation so tests can assert on cache
/// reuse and scheduling order.
#[derive(Default)]
pub struct MockTools {
    pub javac_calls: AtomicUsize,
    pub strip_calls: AtomicUsize,
    pub transpile_calls: AtomicUsize,
    pub closure_calls: AtomicUsize,
    /// `"{tool} {first-source-relative-path}"` per invocation, in order.
    pub invocations: Mutex<Vec<String>>,
    /// Classpath of every javac invocation, in order.
    pub javac_classpaths: Mutex<Vec<Vec<PathBuf>>>,
    pub fail_transpile: AtomicBool,
}

impl MockTools {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn total_calls(&self) -> usize {
        self.javac_calls.load(Ordering::SeqCst)
            + self.strip_calls.load(Ordering::SeqCst)
            + self.transpile_calls.load(Ordering::SeqCst)
            + self.closure_calls.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    fn record(&self, tool: &str, detail: &str) {
        self.invocations
            .lock()
            .unwrap()
            .push(format!("{tool} {detail}"));
    }
}

impl ToolAdapter for MockTools {
    fn invoke(
        &self,
        request: ToolRequest,
        output: &Path,
        _log: &mut TaskLog,
    ) -> anyhow::Result<ToolOutcome> {
        match request {
            ToolRequest::Javac {
                classpath, sources, ..
            } => {
                self.javac_calls.fetch_add(1, Ordering::SeqCst);
                let first = sources
                    .first()
                    .map(|s| s.relative().to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.record("javac", &first);
                self.javac_classpaths.lock().unwrap().push(classpath);

                for record in &sources {
                    let text = fs::read_to_string(&record.path)?;
                    if text.contains("SYNTAX ERROR") {
                        return Ok(ToolOutcome::with_diagnostics(vec![Diagnostic::error(
                            format!("{}: error: expected ';'", record.relative().display()),
                        )]));
                    }
                    let class = output.join(record.relative()).with_extension("class");
                    if let Some(parent) = class.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&class, format!("class of {text}"))?;
                }
                Ok(ToolOutcome::success())
            }
            ToolRequest::Strip { sources } => {
                self.strip_calls.fetch_add(1, Ordering::SeqCst);
                let first = sources
                    .first()
                    .map(|s| s.relative().to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.record("stripper", &first);

                for record in &sources {
                    let text = fs::read_to_string(&record.path)?;
                    let kept: Vec<&str> = text
                        .lines()
                        .filter(|l| !l.contains("@GwtIncompatible"))
                        .collect();
                    fs::write(&record.path, kept.join("\n"))?;
                }
                Ok(ToolOutcome::success())
            }
            ToolRequest::Transpile { sources, .. } => {
                self.transpile_calls.fetch_add(1, Ordering::SeqCst);
                let first = sources
                    .first()
                    .map(|s| s.relative().to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.record("transpiler", &first);

                if self.fail_transpile.load(Ordering::SeqCst) {
                    return Ok(ToolOutcome::with_diagnostics(vec![Diagnostic::error(
                        "transpiler exploded",
                    )]));
                }
                for record in &sources {
                    let rel = record.relative().to_string_lossy().into_owned();
                    let js = output.join(rel.replace(".java", ".impl.java.js"));
                    if let Some(parent) = js.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    let module = rel.trim_end_matches(".java").replace('/', ".");
                    fs::write(&js, format!("goog.module('{module}');\n"))?;
                }
                Ok(ToolOutcome::success())
            }
            ToolRequest::Closure(options) => {
                self.closure_calls.fetch_add(1, Ordering::SeqCst);
                self.record("closure", &options.initial_script_filename);

                let bundle = output.join(&options.initial_script_filename);
                let mut text = String::new();
                for entry_point in &options.entry_points {
                    text.push_str(&format!("entry:{entry_point}\n"));
                }
                for root in &options.sources {
                    for file in paths::gather(root, &paths::is_javascript_file)
                        .map_err(|e| anyhow::anyhow!("{e}"))?
                    {
                        text.push_str(&fs::read_to_string(&file)?);
                    }
                }
                fs::write(&bundle, text)?;
                Ok(ToolOutcome::success())
            }
        }
    }
}

pub fn options_with(entry_point: &str, script: &str) -> BuildOptions {
    let mut options = BuildOptions::default();
    options.entry_points = vec![entry_point.to_string()];
    options.initial_script_filename = script.to_string();
    options.parallelism = 4;
    options
}

/// Builds a request on the current tokio runtime.
pub fn request_in(
    base: &Path,
    target: &Path,
    tools: Arc<MockTools>,
    options: BuildOptions,
) -> Arc<BuildRequest> {
    Arc::new(BuildRequest::new(
        base,
        target,
        options,
        tools,
        tokio::runtime::Handle::current(),
    ))
}

pub fn coords(name: &str) -> ArtifactCoords {
    ArtifactCoords::new("com.example", name, "1.0")
}

pub fn root_artifact(
    request: &Arc<BuildRequest>,
    name: &str,
    source_root: &Path,
    deps: Vec<Arc<Artifact>>,
) -> Arc<Artifact> {
    Arc::new(
        Artifact::new(coords(name), ArtifactKind::Root, request.clone())
            .with_source_roots(vec![source_root.to_path_buf()])
            .with_deps(deps),
    )
}

pub fn dependency_artifact(
    request: &Arc<BuildRequest>,
    name: &str,
    archive: &Path,
) -> Arc<Artifact> {
    Arc::new(
        Artifact::new(coords(name), ArtifactKind::Dependency, request.clone())
            .with_artifact_file(archive),
    )
}

pub fn write_sources(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

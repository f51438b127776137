//! Java to JavaScript translation.
//!
//! Partitions the source tree into `.java`, `.native.js` and plain `.js`
//! files; the transpiler consumes the first two, and the plain JavaScript is
//! copied into the output alongside the transpiler's own files afterwards.

use crate::step::StepKind;
use crate::workers::{step_output, user_classpath};
use jsforge_core::{
    paths, Artifact, BuildError, CacheLayout, FileRecord, Result, StepResult, StepSlot, TaskLog,
    ToolRequest,
};
use std::path::PathBuf;

pub fn execute(
    artifact: &Artifact,
    slot: &StepSlot,
    layout: &CacheLayout,
    log: &mut TaskLog,
) -> Result<StepResult> {
    let Some(source_root) = transpile_source_root(layout, artifact)? else {
        log.line("no sources");
        return Ok(StepResult::Aborted);
    };
    log.line(format!("source root {}", source_root.display()));

    let mut java = Vec::new();
    let mut native_js = Vec::new();
    let mut plain_js = Vec::new();
    let all = paths::gather(&source_root, &|p| {
        paths::is_java_file(p) || paths::is_javascript_file(p)
    })?;
    for file in all {
        if paths::is_java_file(&file) {
            java.push(FileRecord::new(file, source_root.clone()));
        } else if paths::is_native_javascript_file(&file) {
            native_js.push(FileRecord::new(file, source_root.clone()));
        } else {
            plain_js.push(file);
        }
    }
    log.line(format!(
        "{} java, {} native js, {} js",
        java.len(),
        native_js.len(),
        plain_js.len()
    ));

    if java.is_empty() && plain_js.is_empty() {
        log.line("nothing to transpile");
        return Ok(StepResult::Aborted);
    }

    let output = slot.output();
    paths::create_if_absent(&output)?;
    let request = artifact.request();

    if !java.is_empty() {
        let classpath = user_classpath(layout, artifact)?;
        request.check_cancelled()?;
        let outcome = request
            .tools()
            .invoke(
                ToolRequest::Transpile {
                    classpath,
                    sources: java,
                    native_sources: native_js,
                },
                &output,
                log,
            )
            .map_err(|e| BuildError::tool("transpiler", format!("{e:#}")))?;
        if !outcome.is_success() {
            log.line(format!("{} error(s)", outcome.errors().count()));
            for diagnostic in outcome.errors() {
                log.line(&diagnostic.message);
            }
            return Ok(StepResult::Failed);
        }
    }

    if !plain_js.is_empty() {
        request.check_cancelled()?;
        paths::copy_files(&source_root, plain_js.iter(), &output, None)?;
        log.line(format!("{} js file(s) copied to output", plain_js.len()));
    }

    Ok(StepResult::Success)
}

/// The shaded output when present, else the stripped source, else the raw
/// unpacked tree (artifacts consumed as-is).
fn transpile_source_root(layout: &CacheLayout, artifact: &Artifact) -> Result<Option<PathBuf>> {
    if let Some(shaded) = step_output(layout, artifact, StepKind::Shade)? {
        return Ok(Some(shaded));
    }
    if let Some(stripped) = step_output(layout, artifact, StepKind::Strip)? {
        return Ok(Some(stripped));
    }
    step_output(layout, artifact, StepKind::Unpack)
}

//! Annotation-driven source stripping.
//!
//! Copies the source roots into the step output honouring ignore files, then
//! runs the annotation stripper in place on the copy, then copies `.js`
//! files verbatim from the same roots. When several roots supply the same
//! relative path, later roots overwrite earlier ones.

use crate::cache::StepResult;
use crate::error::{BuildError, Result};
use crate::log::TaskLog;
use crate::paths;
use crate::request::BuildRequest;
use crate::tools::{FileRecord, ToolRequest};
use std::path::{Path, PathBuf};

pub fn execute(
    source_roots: &[PathBuf],
    output: &Path,
    request: &BuildRequest,
    log: &mut TaskLog,
) -> Result<StepResult> {
    paths::create_if_absent(output)?;

    let java_files = prepare_java_files(source_roots, output, log)?;
    if java_files.is_empty() {
        log.line("no java files found");
        paths::remove_all(output)?;
        return Ok(StepResult::Aborted);
    }

    request.check_cancelled()?;
    let outcome = request
        .tools()
        .invoke(
            ToolRequest::Strip {
                sources: java_files,
            },
            output,
            log,
        )
        .map_err(|e| BuildError::tool("stripper", format!("{e:#}")))?;

    if !outcome.is_success() {
        log.line(format!("{} error(s)", outcome.errors().count()));
        for diagnostic in outcome.errors() {
            log.line(&diagnostic.message);
        }
        return Ok(StepResult::Failed);
    }

    copy_javascript_files(source_roots, output, log)?;
    Ok(StepResult::Success)
}

/// Copies every non-ignored `.java` file into the output and returns records
/// rooted at the copy, so the stripper rewrites files where they now live.
fn prepare_java_files(
    source_roots: &[PathBuf],
    output: &Path,
    log: &mut TaskLog,
) -> Result<Vec<FileRecord>> {
    let mut records = Vec::new();
    for root in source_roots {
        if paths::exists_dir(root).is_none() {
            continue;
        }
        let files = paths::gather_ignoring(root, &paths::is_java_file)?;
        for destination in paths::copy_files(root, files.iter(), output, None)? {
            records.push(FileRecord::new(destination, output));
        }
    }
    log.line(format!("{} java file(s)", records.len()));
    Ok(records)
}

fn copy_javascript_files(
    source_roots: &[PathBuf],
    output: &Path,
    log: &mut TaskLog,
) -> Result<()> {
    let mut count = 0;
    for root in source_roots {
        if paths::exists_dir(root).is_none() {
            continue;
        }
        let files = paths::gather_ignoring(root, &paths::is_javascript_file)?;
        count += paths::copy_files(root, files.iter(), output, None)?.len();
    }
    log.line(format!("{count} javascript file(s) copied"));
    Ok(())
}

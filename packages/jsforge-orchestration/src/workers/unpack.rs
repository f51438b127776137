//! Unpacks an artifact's sources into its slot.
//!
//! Root artifacts copy their project source trees; dependencies extract the
//! source-relevant entries of their archive. Aborts when there is nothing
//! relevant, leaving no output directory behind.

use jsforge_core::{paths, Artifact, BuildError, Result, StepResult, StepSlot, TaskLog};
use std::fs::File;
use std::path::Path;
use tracing::warn;

pub fn execute(artifact: &Artifact, slot: &StepSlot, log: &mut TaskLog) -> Result<StepResult> {
    let output = slot.output();
    paths::create_if_absent(&output)?;

    let mut count = 0;
    if !artifact.source_roots().is_empty() {
        for root in artifact.source_roots() {
            if paths::exists_dir(root).is_none() {
                continue;
            }
            let files = paths::gather(root, &|_| true)?;
            count += paths::copy_files(root, files.iter(), &output, None)?.len();
        }
        log.line(format!("{count} file(s) copied from source root(s)"));
    } else if let Some(archive) = artifact.artifact_file() {
        count = extract_source_entries(archive, &output, log)?;
    }

    if count == 0 {
        log.line("nothing to unpack");
        paths::remove_all(&output)?;
        return Ok(StepResult::Aborted);
    }
    Ok(StepResult::Success)
}

fn extract_source_entries(archive: &Path, output: &Path, log: &mut TaskLog) -> Result<usize> {
    let file = File::open(archive).map_err(|e| BuildError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| BuildError::tool("unzip", format!("{}: {e}", archive.display())))?;

    let mut count = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| BuildError::tool("unzip", format!("{}: {e}", archive.display())))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!("skipping archive entry escaping the output: {}", entry.name());
            continue;
        };
        if !is_source_entry(&relative) {
            continue;
        }
        let destination = output.join(&relative);
        if let Some(parent) = destination.parent() {
            paths::create_if_absent(parent)?;
        }
        let mut out = File::create(&destination).map_err(|e| BuildError::io(&destination, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| BuildError::io(&destination, e))?;
        count += 1;
    }
    log.line(format!(
        "{count} entr(ies) extracted from {}",
        archive.display()
    ));
    Ok(count)
}

/// Class files come back from compilation and archive metadata contributes
/// nothing to the pipeline.
fn is_source_entry(path: &Path) -> bool {
    !paths::is_class_file(path) && !path.starts_with("META-INF")
}

//! One worker per pipeline step.
//!
//! Every worker takes the artifact, its slot and a task log, reads prior
//! step outputs (its own or its dependencies'), writes only into the slot's
//! `output/`, and reports a [`StepResult`]. Workers are stateless beyond
//! their inputs and idempotent with respect to a fully-written slot; the
//! scheduler checks markers before invoking them.

pub mod assemble;
pub mod closure;
pub mod compile;
pub mod shade;
pub mod strip;
pub mod transpile;
pub mod unpack;

use crate::step::StepKind;
use jsforge_core::{Artifact, CacheLayout, Result, StepResult, StepSlot, TaskLog};
use std::path::PathBuf;
use std::sync::Arc;

pub fn execute(
    artifact: &Arc<Artifact>,
    step: StepKind,
    slot: &StepSlot,
    layout: &CacheLayout,
    log: &mut TaskLog,
) -> Result<StepResult> {
    match step {
        StepKind::Hash => hash(artifact, log),
        StepKind::Unpack => unpack::execute(artifact, slot, log),
        StepKind::Compile => {
            compile::execute(artifact, compile::CompileKind::Source, slot, layout, log)
        }
        StepKind::Strip => strip::execute(artifact, slot, layout, log),
        StepKind::CompileStripped => compile::execute(
            artifact,
            compile::CompileKind::StrippedSource,
            slot,
            layout,
            log,
        ),
        StepKind::Shade => shade::execute(artifact, slot, layout, log),
        StepKind::Transpile => transpile::execute(artifact, slot, layout, log),
        StepKind::Closure => closure::execute(artifact, slot, layout, log),
        StepKind::Assemble => assemble::execute(artifact, layout, log),
    }
}

/// The hash step forces the artifact fingerprint, which also names the
/// artifact's cache directory. It never fails on its own; hashing errors
/// surface before the slot exists and are logged to the base directory.
fn hash(artifact: &Artifact, log: &mut TaskLog) -> Result<StepResult> {
    let hash = artifact.hash()?;
    log.line(format!("hash {hash}"));
    Ok(StepResult::Success)
}

/// The existing `output/` of `step` for `artifact`, if that slot has one.
pub fn step_output(
    layout: &CacheLayout,
    artifact: &Artifact,
    step: StepKind,
) -> Result<Option<PathBuf>> {
    Ok(layout
        .slot(artifact, step.directory_name())?
        .existing_output())
}

/// Classpath entry for one dependency: the shaded output when present, else
/// the stripped-compile output, else the raw artifact file.
fn classpath_entry(layout: &CacheLayout, dep: &Artifact) -> Result<Option<PathBuf>> {
    if let Some(output) = step_output(layout, dep, StepKind::Shade)? {
        return Ok(Some(output));
    }
    if let Some(output) = step_output(layout, dep, StepKind::CompileStripped)? {
        return Ok(Some(output));
    }
    Ok(dep
        .artifact_file()
        .filter(|file| file.exists())
        .map(|file| file.to_path_buf()))
}

/// User classpath over every transitive dependency, in dependency order.
/// Bootstrap and JRE archives go on the bootstrap classpath instead.
pub fn user_classpath(layout: &CacheLayout, artifact: &Artifact) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for dep in artifact.transitive_deps() {
        if dep.is_bootstrap_or_jre() {
            continue;
        }
        if let Some(entry) = classpath_entry(layout, &dep)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

pub fn bootstrap_classpath(artifact: &Artifact) -> Vec<PathBuf> {
    artifact
        .transitive_deps()
        .iter()
        .filter(|dep| dep.is_bootstrap_or_jre())
        .filter_map(|dep| dep.artifact_file().map(|f| f.to_path_buf()))
        .collect()
}

/// Source roots feeding the strip step: the unpack output when it exists,
/// else the artifact's own source roots.
fn strip_input_roots(layout: &CacheLayout, artifact: &Artifact) -> Result<Vec<PathBuf>> {
    if let Some(unpacked) = step_output(layout, artifact, StepKind::Unpack)? {
        Ok(vec![unpacked])
    } else {
        Ok(artifact.source_roots().to_vec())
    }
}

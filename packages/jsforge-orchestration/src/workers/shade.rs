//! Scheduler-facing wrapper around the shade transform.
//!
//! Shades the stripped source tree and the stripped-compile class tree into
//! one output, which downstream classpath assembly and transpilation prefer
//! over the unshaded trees. Skips for artifacts with no mappings; consumers
//! then fall back to the stripped-compile output.

use crate::step::StepKind;
use crate::workers::step_output;
use jsforge_core::transforms;
use jsforge_core::{Artifact, CacheLayout, Result, StepResult, StepSlot, TaskLog};

pub fn execute(
    artifact: &Artifact,
    slot: &StepSlot,
    layout: &CacheLayout,
    log: &mut TaskLog,
) -> Result<StepResult> {
    if artifact.processing_skipped() {
        log.line("processing skipped");
        return Ok(StepResult::Skipped);
    }
    let mappings = artifact.shade_mappings();
    if mappings.is_empty() {
        log.line("no shade mappings");
        return Ok(StepResult::Skipped);
    }

    let mut roots = Vec::new();
    if let Some(stripped) = step_output(layout, artifact, StepKind::Strip)? {
        roots.push(stripped);
    }
    if let Some(classes) = step_output(layout, artifact, StepKind::CompileStripped)? {
        roots.push(classes);
    }
    transforms::shade::execute(&roots, mappings, &slot.output(), log)
}

//! Whole-program optimization over the accumulated transpiled JavaScript.

use crate::step::StepKind;
use crate::workers::step_output;
use jsforge_core::{
    paths, Artifact, BuildError, CacheLayout, ClosureOptions, Result, StepResult, StepSlot,
    TaskLog, ToolRequest,
};

pub fn execute(
    artifact: &Artifact,
    slot: &StepSlot,
    layout: &CacheLayout,
    log: &mut TaskLog,
) -> Result<StepResult> {
    let mut sources = Vec::new();
    if let Some(own) = step_output(layout, artifact, StepKind::Transpile)? {
        sources.push(own);
    }
    for dep in artifact.transitive_deps() {
        if let Some(output) = step_output(layout, &dep, StepKind::Transpile)? {
            sources.push(output);
        }
    }
    if sources.is_empty() {
        log.line("no transpiled sources");
        return Ok(StepResult::Aborted);
    }
    log.line(format!("{} source root(s)", sources.len()));

    let output = slot.output();
    paths::create_if_absent(&output)?;

    let request = artifact.request();
    request.check_cancelled()?;
    let outcome = request
        .tools()
        .invoke(
            ToolRequest::Closure(ClosureOptions {
                sources,
                level: request.level(),
                defines: request.defines().clone(),
                externs: request.externs().clone(),
                formatting: request.formatting().clone(),
                language_out: request.language_out().to_string(),
                entry_points: request.entry_points().to_vec(),
                initial_script_filename: request.initial_script_filename().to_string(),
            }),
            &output,
            log,
        )
        .map_err(|e| BuildError::tool("closure", format!("{e:#}")))?;

    if outcome.is_success() {
        Ok(StepResult::Success)
    } else {
        log.line(format!("{} error(s)", outcome.errors().count()));
        for diagnostic in outcome.errors() {
            log.line(&diagnostic.message);
        }
        Ok(StepResult::Failed)
    }
}

//! Copies the optimized bundle into the final target directory.

use crate::step::StepKind;
use crate::workers::step_output;
use jsforge_core::{paths, Artifact, BuildError, CacheLayout, Result, StepResult, TaskLog};

pub fn execute(artifact: &Artifact, layout: &CacheLayout, log: &mut TaskLog) -> Result<StepResult> {
    let request = artifact.request();

    let Some(source) = step_output(layout, artifact, StepKind::Closure)? else {
        return Err(BuildError::internal(format!(
            "closure output missing for {}",
            artifact.coords()
        )));
    };

    let target = paths::create_if_absent(request.target())?;
    request.check_cancelled()?;
    let files = paths::gather(&source, &|_| true)?;
    let copied = paths::copy_files(&source, files.iter(), &target, None)?;
    log.line(format!(
        "{} file(s) assembled into {}",
        copied.len(),
        target.display()
    ));
    Ok(StepResult::Success)
}

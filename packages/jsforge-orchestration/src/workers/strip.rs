//! Scheduler-facing wrapper around the stripping transform.

use crate::workers::strip_input_roots;
use jsforge_core::transforms;
use jsforge_core::{Artifact, CacheLayout, Result, StepResult, StepSlot, TaskLog};

pub fn execute(
    artifact: &Artifact,
    slot: &StepSlot,
    layout: &CacheLayout,
    log: &mut TaskLog,
) -> Result<StepResult> {
    let roots = strip_input_roots(layout, artifact)?;
    transforms::strip::execute(&roots, &slot.output(), artifact.request(), log)
}

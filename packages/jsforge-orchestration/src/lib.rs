//! jsforge-orchestration
//!
//! The step state machine and the concurrent scheduler that drive every
//! artifact of a dependency graph through the build pipeline, reusing
//! content-addressed step outputs from previous runs and surfacing the
//! first failure.
//!
//! The graph model, cache layout, transforms and tool adapters live in
//! `jsforge-core` and are re-exported here for convenience.

pub mod scheduler;
pub mod step;
pub mod workers;

pub use scheduler::Scheduler;
pub use step::StepKind;

pub use jsforge_core::{
    Artifact, ArtifactCoords, ArtifactGraph, ArtifactKind, ArtifactResolver, BuildError,
    BuildOptions, BuildRequest, CacheLayout, ClasspathScope, FormattingOption, OptimizationLevel,
    Result, StepResult, StepSlot, TaskLog, ToolAdapter, ToolOutcome, ToolRequest,
};

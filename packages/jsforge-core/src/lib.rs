//! jsforge-core
//!
//! Core model for the jsforge build pipeline: the artifact dependency graph
//! and its content-addressed fingerprints, the on-disk step cache, the
//! filesystem primitives and file-tree transforms every step relies on, and
//! the adapter seam behind which the external compiler front-ends live.
//!
//! The step state machine and the concurrent scheduler that drive artifacts
//! through the pipeline live in `jsforge-orchestration`.

pub mod artifact;
pub mod cache;
pub mod config;
pub mod coords;
pub mod error;
pub mod graph;
pub mod hash;
pub mod log;
pub mod paths;
pub mod request;
pub mod tools;
pub mod transforms;

pub use artifact::{Artifact, ArtifactKind};
pub use cache::{CacheLayout, SlotLock, StepResult, StepSlot};
pub use config::{BuildOptions, ClasspathScope, FormattingOption, OptimizationLevel};
pub use coords::ArtifactCoords;
pub use error::{BuildError, Result};
pub use graph::{ArtifactGraph, ArtifactResolver};
pub use hash::HashBuilder;
pub use log::TaskLog;
pub use request::BuildRequest;
pub use tools::{
    ClosureOptions, CommandTool, Diagnostic, FileRecord, Severity, ToolAdapter, ToolOutcome,
    ToolRequest,
};

//! javac invocation over the unpacked or stripped source tree.

use crate::step::StepKind;
use crate::workers::{bootstrap_classpath, step_output, user_classpath};
use jsforge_core::{
    paths, Artifact, BuildError, CacheLayout, FileRecord, Result, StepResult, StepSlot, TaskLog,
    ToolRequest,
};

/// Which source tree is being compiled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileKind {
    Source,
    StrippedSource,
}

impl CompileKind {
    fn tree_step(self) -> StepKind {
        match self {
            Self::Source => StepKind::Unpack,
            Self::StrippedSource => StepKind::Strip,
        }
    }
}

pub fn execute(
    artifact: &Artifact,
    kind: CompileKind,
    slot: &StepSlot,
    layout: &CacheLayout,
    log: &mut TaskLog,
) -> Result<StepResult> {
    let Some(tree) = step_output(layout, artifact, kind.tree_step())? else {
        log.line("no source tree");
        return Ok(StepResult::Aborted);
    };

    let sources: Vec<FileRecord> = paths::gather(&tree, &paths::is_java_file)?
        .into_iter()
        .map(|file| FileRecord::new(file, tree.clone()))
        .collect();
    if sources.is_empty() {
        log.line("no java files");
        paths::remove_all(&slot.output())?;
        return Ok(StepResult::Aborted);
    }

    let bootstrap = bootstrap_classpath(artifact);
    let classpath = user_classpath(layout, artifact)?;
    log.line(format!(
        "{} source(s), {} classpath entr(ies)",
        sources.len(),
        classpath.len()
    ));

    let output = slot.output();
    paths::create_if_absent(&output)?;

    let request = artifact.request();
    request.check_cancelled()?;
    let outcome = request
        .tools()
        .invoke(
            ToolRequest::Javac {
                bootstrap,
                classpath,
                sources,
            },
            &output,
            log,
        )
        .map_err(|e| BuildError::tool("javac", format!("{e:#}")))?;

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

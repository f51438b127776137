//! On-disk cache layout.
//!
//! Every (artifact, step) pair owns one slot directory
//! `{base}/{coords-safe}-{hash-hex}/{step-suffix}/` holding the step's
//! `output/` payload, its `log.txt` and a zero-byte result marker. The
//! marker names are an external contract; other tooling inspects them.

use crate::artifact::Artifact;
use crate::error::{BuildError, Result};
use crate::log::TaskLog;
use crate::paths;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const OUTPUT_DIR_NAME: &str = "output";
pub const LOG_FILE_NAME: &str = "log.txt";
pub const LOCK_FILE_NAME: &str = "work.lock";

/// Terminal result of one step for one artifact.
///
/// Everything except `Failed` permits advancing to the successor step:
/// `Aborted` means the step had no inputs to work on, `Skipped` means the
/// step decided it does not apply to this artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    Success,
    Failed,
    Aborted,
    Skipped,
}

impl StepResult {
    pub const ALL: [StepResult; 4] = [
        StepResult::Success,
        StepResult::Failed,
        StepResult::Aborted,
        StepResult::Skipped,
    ];

    pub fn marker_file_name(self) -> &'static str {
        match self {
            Self::Success => "result.SUCCESS",
            Self::Failed => "result.FAILED",
            Self::Aborted => "result.ABORTED",
            Self::Skipped => "result.SKIPPED",
        }
    }

    pub fn advances(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Cache root under which every artifact keeps its per-step slots.
#[derive(Clone, Debug)]
pub struct CacheLayout {
    base: PathBuf,
}

impl CacheLayout {
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        paths::create_if_absent(&base)?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `{base}/{coords-safe}-{hash}`. Forces the artifact hash, so this can
    /// fail the same way hashing fails.
    pub fn artifact_dir(&self, artifact: &Artifact) -> Result<PathBuf> {
        let hash = artifact.hash()?;
        Ok(self
            .base
            .join(format!("{}-{hash}", artifact.coords().directory_safe())))
    }

    pub fn slot(&self, artifact: &Artifact, step_suffix: &str) -> Result<StepSlot> {
        Ok(StepSlot {
            dir: self.artifact_dir(artifact)?.join(step_suffix),
        })
    }
}

/// One step's directory inside an artifact's cache entry.
#[derive(Clone, Debug)]
pub struct StepSlot {
    dir: PathBuf,
}

impl StepSlot {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn output(&self) -> PathBuf {
        self.dir.join(OUTPUT_DIR_NAME)
    }

    /// The output directory iff it exists.
    pub fn existing_output(&self) -> Option<PathBuf> {
        paths::exists_dir(&self.output())
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    pub fn create(&self) -> Result<()> {
        paths::create_if_absent(&self.dir)?;
        Ok(())
    }

    /// Reads the recorded marker, if any. Two markers in one slot is an
    /// invariant violation and aborts the build.
    pub fn marker(&self) -> Result<Option<StepResult>> {
        let mut found = None;
        for result in StepResult::ALL {
            if self.dir.join(result.marker_file_name()).is_file() {
                if found.is_some() {
                    return Err(BuildError::internal(format!(
                        "multiple result markers in {}",
                        self.dir.display()
                    )));
                }
                found = Some(result);
            }
        }
        Ok(found)
    }

    /// Records `result`, replacing any marker a failed prior attempt left.
    pub fn write_marker(&self, result: StepResult) -> Result<()> {
        self.create()?;
        for other in StepResult::ALL {
            if other != result {
                let stale = self.dir.join(other.marker_file_name());
                match fs::remove_file(&stale) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(BuildError::io(&stale, e)),
                }
            }
        }
        let marker = self.dir.join(result.marker_file_name());
        fs::write(&marker, b"").map_err(|e| BuildError::io(&marker, e))
    }

    pub fn write_log(&self, log: &TaskLog) -> Result<()> {
        self.create()?;
        log.write_to(&self.log_file())
    }

    /// Attempts to take the slot's exclusive writer lock. Returns `None`
    /// when another writer (in this process or another) holds it.
    pub fn try_lock(&self) -> Result<Option<SlotLock>> {
        self.create()?;
        let path = self.dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Some(SlotLock { path })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(BuildError::io(&path, e)),
        }
    }
}

/// Held while writing a slot; releases the lock file on drop.
pub struct SlotLock {
    path: PathBuf,
}

impl Drop for SlotLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

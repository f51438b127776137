//! Process-wide build request.
//!
//! Constructed once per build and shared by every artifact and every worker.
//! All fields are immutable after construction except the cancellation cell,
//! which is monotone and captures the first cause.

use crate::config::{BuildOptions, ClasspathScope, FormattingOption, OptimizationLevel};
use crate::error::{BuildError, Result};
use crate::tools::ToolAdapter;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct BuildRequest {
    base: PathBuf,
    target: PathBuf,
    options: BuildOptions,
    variant: Option<String>,
    tools: Arc<dyn ToolAdapter>,
    executor: Handle,
    cancelled: AtomicBool,
    cause: Mutex<Option<String>>,
}

impl BuildRequest {
    /// `base` is the cache directory, `target` the final output directory.
    /// The executor is externally supplied; the scheduler only submits to it.
    pub fn new(
        base: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        options: BuildOptions,
        tools: Arc<dyn ToolAdapter>,
        executor: Handle,
    ) -> Self {
        Self {
            base: base.into(),
            target: target.into(),
            options,
            variant: None,
            tools,
            executor,
            cancelled: AtomicBool::new(false),
            cause: Mutex::new(None),
        }
    }

    /// Marks this request as a test variant. The identifier feeds every
    /// artifact fingerprint, so distinct identifiers never share cache slots.
    pub fn with_variant(mut self, identifier: impl Into<String>) -> Self {
        self.variant = Some(identifier.into());
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn scope(&self) -> ClasspathScope {
        self.options.scope
    }

    pub fn level(&self) -> OptimizationLevel {
        self.options.level
    }

    pub fn defines(&self) -> &BTreeMap<String, String> {
        &self.options.defines
    }

    pub fn externs(&self) -> &BTreeSet<String> {
        &self.options.externs
    }

    pub fn formatting(&self) -> &BTreeSet<FormattingOption> {
        &self.options.formatting
    }

    pub fn language_out(&self) -> &str {
        &self.options.language_out
    }

    pub fn entry_points(&self) -> &[String] {
        &self.options.entry_points
    }

    pub fn initial_script_filename(&self) -> &str {
        &self.options.initial_script_filename
    }

    pub fn parallelism(&self) -> usize {
        self.options.parallelism.max(1)
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn tools(&self) -> &Arc<dyn ToolAdapter> {
        &self.tools
    }

    pub fn executor(&self) -> &Handle {
        &self.executor
    }

    /// Idempotent; the first cause wins and stays observable.
    pub fn cancel(&self, cause: impl Into<String>) {
        let mut slot = self.cause.lock();
        if slot.is_none() {
            *slot = Some(cause.into());
        }
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancellation_cause(&self) -> Option<String> {
        self.cause.lock().clone()
    }

    /// Suspension-point check used by workers before external-tool
    /// invocations and large copies.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BuildError::Cancelled(
                self.cancellation_cause()
                    .unwrap_or_else(|| "cancelled".to_string()),
            ))
        } else {
            Ok(())
        }
    }
}

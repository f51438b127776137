//! Artifacts and their fingerprints.

use crate::coords::ArtifactCoords;
use crate::error::{BuildError, Result};
use crate::hash::HashBuilder;
use crate::request::BuildRequest;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Classification produced by the resolver; drives per-step skips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The artifact whose build was requested.
    Root,
    /// A transitive dependency distributed as an archive.
    Dependency,
    /// Prebuilt compiler bootstrap archive, exempt from most steps.
    JavacBootstrap,
    /// Prebuilt standard-library archive, exempt from most steps.
    JreBinary,
    /// Consumed as-is; its archive goes straight onto classpaths.
    Ignored,
}

impl ArtifactKind {
    pub fn is_bootstrap_or_jre(self) -> bool {
        matches!(self, Self::JavacBootstrap | Self::JreBinary)
    }
}

/// A resolved unit of source or binary in the build graph.
///
/// Immutable after graph construction apart from the lazily-memoized hash.
pub struct Artifact {
    coords: ArtifactCoords,
    kind: ArtifactKind,
    direct_deps: Vec<Arc<Artifact>>,
    shade_mappings: BTreeMap<String, String>,
    processing_skipped: bool,
    artifact_file: Option<PathBuf>,
    source_roots: Vec<PathBuf>,
    request: Arc<BuildRequest>,
    hash: OnceLock<String>,
}

impl Artifact {
    pub fn new(coords: ArtifactCoords, kind: ArtifactKind, request: Arc<BuildRequest>) -> Self {
        Self {
            coords,
            kind,
            direct_deps: Vec::new(),
            shade_mappings: BTreeMap::new(),
            processing_skipped: false,
            artifact_file: None,
            source_roots: Vec::new(),
            request,
            hash: OnceLock::new(),
        }
    }

    pub fn with_deps(mut self, deps: Vec<Arc<Artifact>>) -> Self {
        self.direct_deps = deps;
        self
    }

    /// Package-prefix rename table. A mapping with an empty or slash-bearing
    /// find prefix is malformed.
    pub fn with_shade_mappings(mut self, mappings: BTreeMap<String, String>) -> Result<Self> {
        for (find, replace) in &mappings {
            if find.is_empty() || find.contains('/') || find.contains('\\') || replace.contains('/')
            {
                return Err(BuildError::graph(format!(
                    "malformed shade mapping {find:?} -> {replace:?} for {}",
                    self.coords
                )));
            }
        }
        self.shade_mappings = mappings;
        Ok(self)
    }

    pub fn with_artifact_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_file = Some(path.into());
        self
    }

    pub fn with_source_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.source_roots = roots;
        self
    }

    pub fn with_processing_skipped(mut self, skipped: bool) -> Self {
        self.processing_skipped = skipped;
        self
    }

    pub fn coords(&self) -> &ArtifactCoords {
        &self.coords
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind == ArtifactKind::Root
    }

    pub fn is_bootstrap_or_jre(&self) -> bool {
        self.kind.is_bootstrap_or_jre()
    }

    pub fn is_ignored(&self) -> bool {
        self.kind == ArtifactKind::Ignored
    }

    pub fn direct_deps(&self) -> &[Arc<Artifact>] {
        &self.direct_deps
    }

    pub fn shade_mappings(&self) -> &BTreeMap<String, String> {
        &self.shade_mappings
    }

    pub fn processing_skipped(&self) -> bool {
        self.processing_skipped
    }

    pub fn artifact_file(&self) -> Option<&Path> {
        self.artifact_file.as_deref()
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn request(&self) -> &Arc<BuildRequest> {
        &self.request
    }

    /// All transitive dependencies in declared (preorder) order, each once.
    pub fn transitive_deps(&self) -> Vec<Arc<Artifact>> {
        fn walk(
            deps: &[Arc<Artifact>],
            seen: &mut BTreeSet<ArtifactCoords>,
            ordered: &mut Vec<Arc<Artifact>>,
        ) {
            for dep in deps {
                if seen.insert(dep.coords.clone()) {
                    ordered.push(dep.clone());
                    walk(&dep.direct_deps, seen, ordered);
                }
            }
        }
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        walk(&self.direct_deps, &mut seen, &mut ordered);
        ordered
    }

    /// The artifact fingerprint: a pure function of every transitive input
    /// that influences this artifact's outputs. Computed on first access,
    /// then memoized.
    pub fn hash(&self) -> Result<&str> {
        let mut visiting = Vec::new();
        self.hash_in(&mut visiting)
    }

    fn hash_in(&self, visiting: &mut Vec<ArtifactCoords>) -> Result<&str> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash.as_str());
        }
        if visiting.contains(&self.coords) {
            return Err(BuildError::graph(format!(
                "dependency cycle involving {}",
                self.coords
            )));
        }
        visiting.push(self.coords.clone());
        let computed = self.compute_hash(visiting)?;
        visiting.pop();
        Ok(self.hash.get_or_init(|| computed).as_str())
    }

    fn compute_hash(&self, visiting: &mut Vec<ArtifactCoords>) -> Result<String> {
        let request = &self.request;
        let mut builder = HashBuilder::new();

        // Global request parameters that affect every output.
        builder.append_str(request.level().as_tag());
        for (key, value) in request.defines() {
            builder.append_str(key);
            builder.append_str(value);
        }
        for extern_file in request.externs() {
            builder.append_str(extern_file);
        }
        for formatting in request.formatting() {
            builder.append_str(formatting.as_tag());
        }
        builder.append_str(request.language_out());
        builder.append_str(request.scope().as_tag());

        builder.append_str(&self.coords.canonical());

        for dep in &self.direct_deps {
            builder.append_str(dep.hash_in(visiting)?);
        }

        if let Some(file) = &self.artifact_file {
            builder.append_path(file)?;
        }

        for (find, replace) in &self.shade_mappings {
            builder.append_str(find);
            builder.append_str(replace);
        }

        if let Some(variant) = request.variant() {
            builder.append_str(variant);
        }

        Ok(builder.finalize_hex())
    }
}

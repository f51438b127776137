//! The artifact dependency graph and the resolver seam that produces it.

use crate::artifact::Artifact;
use crate::config::ClasspathScope;
use crate::coords::ArtifactCoords;
use crate::error::{BuildError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// DAG of artifacts rooted at the artifact whose build was requested.
pub struct ArtifactGraph {
    root: Arc<Artifact>,
    artifacts: Vec<Arc<Artifact>>,
}

impl ArtifactGraph {
    /// Collects every artifact reachable from `root` in discovery order and
    /// verifies the graph is acyclic. A cycle is a fatal build error.
    pub fn new(root: Arc<Artifact>) -> Result<Self> {
        let mut artifacts = Vec::new();
        let mut seen = BTreeSet::new();
        let mut on_stack = Vec::new();
        collect(&root, &mut seen, &mut on_stack, &mut artifacts)?;
        Ok(Self { root, artifacts })
    }

    pub fn root(&self) -> &Arc<Artifact> {
        &self.root
    }

    /// Every artifact in the graph, root first, in discovery order.
    pub fn artifacts(&self) -> &[Arc<Artifact>] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn collect(
    artifact: &Arc<Artifact>,
    seen: &mut BTreeSet<ArtifactCoords>,
    on_stack: &mut Vec<ArtifactCoords>,
    ordered: &mut Vec<Arc<Artifact>>,
) -> Result<()> {
    if on_stack.contains(artifact.coords()) {
        return Err(BuildError::graph(format!(
            "dependency cycle involving {}",
            artifact.coords()
        )));
    }
    if !seen.insert(artifact.coords().clone()) {
        return Ok(());
    }
    ordered.push(artifact.clone());
    on_stack.push(artifact.coords().clone());
    for dep in artifact.direct_deps() {
        collect(dep, seen, on_stack, ordered)?;
    }
    on_stack.pop();
    Ok(())
}

/// Produces the initial graph from a package repository. Called once at the
/// start of a build; must classify every artifact's kind.
pub trait ArtifactResolver {
    fn resolve(&self, root: &ArtifactCoords, scope: ClasspathScope) -> Result<ArtifactGraph>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::config::BuildOptions;
    use crate::log::TaskLog;
    use crate::request::BuildRequest;
    use crate::tools::{ToolAdapter, ToolOutcome, ToolRequest};
    use std::path::Path;

    struct NoopTool;

    impl ToolAdapter for NoopTool {
        fn invoke(
            &self,
            _request: ToolRequest,
            _output: &Path,
            _log: &mut TaskLog,
        ) -> anyhow::Result<ToolOutcome> {
            Ok(ToolOutcome::success())
        }
    }

    fn request(runtime: &tokio::runtime::Runtime) -> Arc<BuildRequest> {
        Arc::new(BuildRequest::new(
            "/tmp/cache",
            "/tmp/target",
            BuildOptions::default(),
            Arc::new(NoopTool),
            runtime.handle().clone(),
        ))
    }

    fn coords(name: &str) -> ArtifactCoords {
        ArtifactCoords::new("com.example", name, "1.0")
    }

    #[test]
    fn test_graph_collects_in_discovery_order() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let request = request(&runtime);

        let leaf = Arc::new(Artifact::new(
            coords("leaf"),
            ArtifactKind::Dependency,
            request.clone(),
        ));
        let mid = Arc::new(
            Artifact::new(coords("mid"), ArtifactKind::Dependency, request.clone())
                .with_deps(vec![leaf.clone()]),
        );
        let root = Arc::new(
            Artifact::new(coords("app"), ArtifactKind::Root, request)
                .with_deps(vec![mid, leaf]),
        );

        let graph = ArtifactGraph::new(root).unwrap();
        let names: Vec<_> = graph
            .artifacts()
            .iter()
            .map(|a| a.coords().name().to_string())
            .collect();
        assert_eq!(names, vec!["app", "mid", "leaf"]);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let request = request(&runtime);

        let shared = Arc::new(Artifact::new(
            coords("shared"),
            ArtifactKind::Dependency,
            request.clone(),
        ));
        let left = Arc::new(
            Artifact::new(coords("left"), ArtifactKind::Dependency, request.clone())
                .with_deps(vec![shared.clone()]),
        );
        let right = Arc::new(
            Artifact::new(coords("right"), ArtifactKind::Dependency, request.clone())
                .with_deps(vec![shared]),
        );
        let root = Arc::new(
            Artifact::new(coords("app"), ArtifactKind::Root, request)
                .with_deps(vec![left, right]),
        );

        let graph = ArtifactGraph::new(root).unwrap();
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_root_accessor() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let request = request(&runtime);
        let root = Arc::new(Artifact::new(coords("app"), ArtifactKind::Root, request));
        let graph = ArtifactGraph::new(root).unwrap();
        assert_eq!(graph.root().coords().name(), "app");
        assert!(!graph.is_empty());
    }
}

//! Cache reuse across runs: markers short-circuit finished work, deleted
//! slots rebuild with their successors, and distinct test variants never
//! share slots.

mod common;

use common::*;
use jsforge_core::paths;
use jsforge_orchestration::{ArtifactGraph, BuildRequest, CacheLayout, Scheduler, StepKind};
use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    base: std::path::PathBuf,
    target: std::path::PathBuf,
    src: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("cache");
    let target = dir.path().join("target");
    let src = dir.path().join("src");
    write_sources(
        &src,
        &[("app/Hello.java", "package app;\npublic class Hello {}\n")],
    );
    Workspace {
        base,
        target,
        src,
        _dir: dir,
    }
}

async fn build_once(ws: &Workspace, tools: Arc<MockTools>) {
    let request = request_in(
        &ws.base,
        &ws.target,
        tools,
        options_with("app.Hello", "hello.js"),
    );
    let root = root_artifact(&request, "app", &ws.src, vec![]);
    let graph = ArtifactGraph::new(root).unwrap();
    Scheduler::for_request(&request)
        .unwrap()
        .execute(&graph)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_second_run_invokes_no_tools() {
    let ws = workspace();

    let first = MockTools::new();
    build_once(&ws, first.clone()).await;
    assert!(first.total_calls() > 0);

    let second = MockTools::new();
    build_once(&ws, second.clone()).await;
    assert_eq!(second.total_calls(), 0, "{:?}", second.invocations());
}

#[tokio::test]
async fn test_deleted_slot_rebuilds_with_its_successors() {
    let ws = workspace();
    build_once(&ws, MockTools::new()).await;

    // Delete the transpile slot only.
    let tools = MockTools::new();
    let request = request_in(
        &ws.base,
        &ws.target,
        tools.clone(),
        options_with("app.Hello", "hello.js"),
    );
    let root = root_artifact(&request, "app", &ws.src, vec![]);
    let layout = CacheLayout::new(&ws.base).unwrap();
    let transpile_slot = layout
        .slot(&root, StepKind::Transpile.directory_name())
        .unwrap();
    paths::remove_all(transpile_slot.dir()).unwrap();

    let graph = ArtifactGraph::new(root).unwrap();
    Scheduler::for_request(&request)
        .unwrap()
        .execute(&graph)
        .await
        .unwrap();

    // Transpile re-ran, and so did its strict successors; everything before
    // it came from the cache.
    assert_eq!(tools.javac_calls.load(Ordering::SeqCst), 0);
    assert_eq!(tools.strip_calls.load(Ordering::SeqCst), 0);
    assert_eq!(tools.transpile_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tools.closure_calls.load(Ordering::SeqCst), 1);

    let bundle = fs::read_to_string(ws.target.join("hello.js")).unwrap();
    assert!(bundle.contains("goog.module('app.Hello');"));
}

#[tokio::test]
async fn test_failed_marker_reruns_that_step() {
    let ws = workspace();

    let tools = MockTools::new();
    tools.fail_transpile.store(true, Ordering::SeqCst);
    let request = request_in(
        &ws.base,
        &ws.target,
        tools.clone(),
        options_with("app.Hello", "hello.js"),
    );
    let root = root_artifact(&request, "app", &ws.src, vec![]);
    let graph = ArtifactGraph::new(root.clone()).unwrap();
    let error = Scheduler::for_request(&request)
        .unwrap()
        .execute(&graph)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("transpiler exploded"));

    let layout = CacheLayout::new(&ws.base).unwrap();
    let transpile_slot = layout
        .slot(&root, StepKind::Transpile.directory_name())
        .unwrap();
    assert_eq!(
        transpile_slot.marker().unwrap(),
        Some(jsforge_orchestration::StepResult::Failed)
    );

    // A re-run without clearing the slot re-runs transpile and recovers.
    let retry = MockTools::new();
    build_once(&ws, retry.clone()).await;
    assert_eq!(retry.javac_calls.load(Ordering::SeqCst), 0);
    assert_eq!(retry.transpile_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_variant_identifiers_use_distinct_slots() {
    let ws = workspace();

    for variant in ["alpha", "beta"] {
        let tools = MockTools::new();
        let request = Arc::new(
            BuildRequest::new(
                &ws.base,
                &ws.target,
                options_with("app.Hello", "hello.js"),
                tools.clone(),
                tokio::runtime::Handle::current(),
            )
            .with_variant(variant),
        );
        let root = root_artifact(&request, "app", &ws.src, vec![]);
        let graph = ArtifactGraph::new(root).unwrap();
        Scheduler::for_request(&request)
            .unwrap()
            .execute(&graph)
            .await
            .unwrap();
        // No reuse across variants: each runs the full pipeline.
        assert!(tools.total_calls() > 0, "variant {variant} reused slots");
    }

    let artifact_dirs = fs::read_dir(&ws.base)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("com.example-app"))
        .count();
    assert_eq!(artifact_dirs, 2);
}

#[tokio::test]
async fn test_concurrent_builds_share_slots_without_duplicate_work() {
    let ws = workspace();

    let tools = MockTools::new();
    let request = request_in(
        &ws.base,
        &ws.target,
        tools.clone(),
        options_with("app.Hello", "hello.js"),
    );
    let root = root_artifact(&request, "app", &ws.src, vec![]);
    let graph = ArtifactGraph::new(root.clone()).unwrap();

    let first = Scheduler::for_request(&request).unwrap();
    let second = Scheduler::for_request(&request).unwrap();
    let (a, b) = tokio::join!(first.execute(&graph), second.execute(&graph));
    a.unwrap();
    b.unwrap();

    // The slot locks serialized the writers: every slot holds exactly one
    // marker, and no tool ran more than once per build.
    let layout = CacheLayout::new(&ws.base).unwrap();
    for step in [StepKind::Compile, StepKind::Transpile, StepKind::Closure] {
        let slot = layout.slot(&root, step.directory_name()).unwrap();
        assert!(slot.marker().unwrap().is_some(), "no marker for {step}");
    }
    assert!(tools.strip_calls.load(Ordering::SeqCst) <= 2);
    assert!(tools.closure_calls.load(Ordering::SeqCst) <= 2);

    let bundle = fs::read_to_string(ws.target.join("hello.js")).unwrap();
    assert!(bundle.contains("goog.module('app.Hello');"));
}

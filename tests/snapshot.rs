//! Tests for document snapshots, versioning, imports and derived views.

mod common;

use std::sync::Arc;

use common::{host, init_tracing, project_dyn, CountingEngine, TestProject};
use razor_derive::{DocumentSnapshot, DocumentState, FileKind, LinePosition};

// =============================================================================
// End-to-end
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_leaves_previous_version_intact() {
    init_tracing();
    let engine = Arc::new(CountingEngine::new());
    let project = project_dyn(&TestProject::new(engine.clone()));
    let v1 = DocumentState::create(host("/project/Index.razor"), "A".into(), None).unwrap();
    let snapshot_v1 = DocumentSnapshot::new(project.clone(), v1.clone());

    let other_caller = snapshot_v1.clone();
    let (a, b) = tokio::join!(
        snapshot_v1.generated_output(),
        other_caller.generated_output()
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.source_version(), v1.text_version());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(engine.calls(), 1);

    let v2 = v1.with_text("AB".into());
    let snapshot_v2 = DocumentSnapshot::new(project.clone(), v2.clone());
    assert!(snapshot_v2.try_get_generated_output().is_none());

    let out_v2 = snapshot_v2.generated_output().await.unwrap();
    assert_eq!(out_v2.source_version(), v2.text_version());
    assert!(out_v2.is_current_for(&v2));
    assert!(!a.is_current_for(&v2));

    let still_v1 = snapshot_v1.try_get_generated_output().unwrap();
    assert!(Arc::ptr_eq(&still_v1, &a));
    assert_eq!(snapshot_v1.text().as_str(), "A");
    assert_eq!(engine.calls(), 2);
}

// =============================================================================
// Snapshot accessors
// =============================================================================

#[tokio::test]
async fn test_snapshot_metadata_and_try_accessors() {
    let engine = Arc::new(CountingEngine::new());
    let project = project_dyn(&TestProject::new(engine.clone()));
    let state = DocumentState::create(
        host("/project/Pages/Counter.razor"),
        "<button>@count</button>".into(),
        None,
    )
    .unwrap();
    let snapshot = DocumentSnapshot::new(project, state.clone());

    assert_eq!(snapshot.file_kind(), FileKind::Component);
    assert!(snapshot.file_path().ends_with("Pages/Counter.razor"));
    assert_eq!(snapshot.target_path(), std::path::Path::new("Pages/Counter.razor"));
    assert!(snapshot.supports_output());
    assert_eq!(snapshot.text_version(), state.text_version());

    assert!(snapshot.try_get_generated_primary_version().is_none());
    assert!(snapshot.try_get_generated_secondary_version().is_none());

    let primary = snapshot.generated_primary_version().await.unwrap();
    let secondary = snapshot.generated_secondary_version().await.unwrap();

    assert_eq!(snapshot.try_get_generated_primary_version(), Some(primary));
    assert_eq!(snapshot.try_get_generated_secondary_version(), Some(secondary));
    assert_eq!(engine.calls(), 1);
}

// =============================================================================
// Artifact versions
// =============================================================================

#[tokio::test]
async fn test_unchanged_projection_keeps_its_version() {
    let engine = Arc::new(CountingEngine::new());
    let project = project_dyn(&TestProject::new(engine.clone()));
    let v1 = DocumentState::create(
        host("/project/Index.razor"),
        "@page \"/\"\n<h1>Hello</h1>".into(),
        None,
    )
    .unwrap();
    let out_v1 = v1.generated_output(&project).await.unwrap();

    // Markup-only edit: the primary projection only carries `@` lines.
    let v2 = v1.with_text("@page \"/\"\n<h1>Hello, world</h1>".into());
    let out_v2 = v2.generated_output(&project).await.unwrap();

    assert_eq!(out_v2.primary_version(), out_v1.primary_version());
    assert_eq!(out_v2.secondary_version(), v2.text_version());

    // Code edit changes the primary projection.
    let v3 = v2.with_text("@page \"/home\"\n<h1>Hello, world</h1>".into());
    let out_v3 = v3.generated_output(&project).await.unwrap();
    assert_eq!(out_v3.primary_version(), v3.text_version());
}

#[tokio::test]
async fn test_edit_before_output_computed_takes_fresh_versions() {
    let engine = Arc::new(CountingEngine::new());
    let project = project_dyn(&TestProject::new(engine.clone()));
    let v1 = DocumentState::create(host("/project/Index.razor"), "@a\n<p>".into(), None).unwrap();
    let v2 = v1.with_text("@a\n<p >".into());

    let out_v2 = v2.generated_output(&project).await.unwrap();
    assert_eq!(out_v2.primary_version(), v2.text_version());
    assert_eq!(engine.calls(), 1);
}

// =============================================================================
// Imports
// =============================================================================

#[tokio::test]
async fn test_imports_feed_derivation_and_are_resolved_once() {
    let engine = Arc::new(CountingEngine::new());
    let test_project = TestProject::new(engine.clone());
    let project = project_dyn(&test_project);

    let imports = DocumentState::create(
        host("/project/_Imports.razor"),
        "@using App.Shared".into(),
        None,
    )
    .unwrap();
    test_project.set_imports(vec![imports.clone()]);

    let state =
        DocumentState::create(host("/project/Index.razor"), "@page \"/\"".into(), None).unwrap();
    let snapshot = DocumentSnapshot::new(project.clone(), state.clone());

    let import_snapshots = snapshot.imports();
    assert_eq!(import_snapshots.len(), 1);
    assert_eq!(import_snapshots[0].file_kind(), FileKind::ComponentImport);
    assert_eq!(import_snapshots[0].text().as_str(), "@using App.Shared");

    let output = snapshot.generated_output().await.unwrap();
    assert_eq!(
        output.generated_primary().text(),
        "@using App.Shared\n@page \"/\""
    );

    snapshot.imports();
    assert_eq!(test_project.import_resolutions(), 1);
}

#[tokio::test]
async fn test_derivation_uses_imports_captured_at_resolution() {
    let engine = Arc::new(CountingEngine::new());
    let test_project = TestProject::new(engine);
    let project = project_dyn(&test_project);

    let imports = DocumentState::create(
        host("/project/_Imports.razor"),
        "@using App.Shared".into(),
        None,
    )
    .unwrap();
    test_project.set_imports(vec![imports.clone()]);

    let state =
        DocumentState::create(host("/project/Index.razor"), "@page \"/\"".into(), None).unwrap();
    assert_eq!(state.imports(project.as_ref()).len(), 1);

    // The project moves on and the resolved import state goes away before derivation.
    let replacement = DocumentState::create(
        host("/project/_Imports.razor"),
        "@using App.Other".into(),
        None,
    )
    .unwrap();
    test_project.set_imports(vec![replacement]);
    drop(imports);
    assert!(state.imports(project.as_ref()).is_empty());

    let output = state.generated_output(&project).await.unwrap();
    assert_eq!(
        output.generated_primary().text(),
        "@using App.Shared\n@page \"/\""
    );
    assert_eq!(test_project.import_resolutions(), 1);
}

#[test]
fn test_dropped_import_states_are_skipped() {
    let engine = Arc::new(CountingEngine::new());
    let test_project = TestProject::new(engine);
    let project = project_dyn(&test_project);

    let imports = DocumentState::create(host("/project/_Imports.razor"), "@using A".into(), None)
        .unwrap();
    test_project.set_imports(vec![imports.clone()]);

    let state = DocumentState::create(host("/project/Index.razor"), "<p/>".into(), None).unwrap();
    assert_eq!(state.imports(project.as_ref()).len(), 1);

    test_project.set_imports(Vec::new());
    drop(imports);
    assert!(state.imports(project.as_ref()).is_empty());
}

#[test]
fn test_new_version_resolves_imports_again() {
    let engine = Arc::new(CountingEngine::new());
    let test_project = TestProject::new(engine);
    let project = project_dyn(&test_project);

    let v1 = DocumentState::create(host("/project/Index.razor"), "<p/>".into(), None).unwrap();
    v1.imports(project.as_ref());
    v1.imports(project.as_ref());
    assert_eq!(test_project.import_resolutions(), 1);

    let v2 = v1.with_text("<p></p>".into());
    v2.imports(project.as_ref());
    assert_eq!(test_project.import_resolutions(), 2);
}

// =============================================================================
// Derived views
// =============================================================================

#[tokio::test]
async fn test_text_views_are_shared_per_output() {
    let engine = Arc::new(CountingEngine::new());
    let project = project_dyn(&TestProject::new(engine));
    let state = DocumentState::create(
        host("/project/Index.razor"),
        "@page \"/\"\n<h1>Hi</h1>\n@code { }".into(),
        None,
    )
    .unwrap();

    let output = state.generated_output(&project).await.unwrap();
    let document = output.document();

    let source = document.source_text();
    assert_eq!(source.line_count(), 3);
    assert_eq!(source.line(1), Some("<h1>Hi</h1>"));
    assert_eq!(
        source.position_of(source.len()),
        Some(LinePosition { line: 2, column: 9 })
    );
    assert!(Arc::ptr_eq(&source, &document.source_text()));

    let primary = document.primary_text();
    assert_eq!(primary.line_count(), 2);
    assert!(Arc::ptr_eq(&primary, &output.document().primary_text()));

    // A new version compiles a new document with its own views.
    let v2 = state.with_text("<p/>".into());
    let out_v2 = v2.generated_output(&project).await.unwrap();
    assert!(out_v2.document().views().is_empty());
    assert_eq!(out_v2.document().source_text().as_str(), "<p/>");
}

//! Shared test fixtures: an in-memory project and a counting engine.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use razor_derive::{
    CompiledOutput, DocumentState, HostDocument, ImportSource, ProjectEngine, ProjectSnapshot,
    SourceBuffer,
};
use tokio::sync::Semaphore;

/// Engine that records invocations and can be held or made to fail.
///
/// The primary projection keeps only `@` lines (imports first), so markup-only
/// edits leave it unchanged. The secondary projection is the source text.
#[derive(Default)]
pub struct CountingEngine {
    calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl CountingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every compile waits for a permit from `gate` before finishing.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Make the next `count` compiles fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectEngine for CountingEngine {
    async fn compile(
        &self,
        _document: &HostDocument,
        source: &SourceBuffer,
        imports: &[ImportSource],
    ) -> anyhow::Result<CompiledOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await?;
        }

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            anyhow::bail!("syntax error in {} bytes of input", source.len());
        }

        let primary = imports
            .iter()
            .map(|import| import.text.as_str())
            .chain(std::iter::once(source.as_str()))
            .flat_map(str::lines)
            .filter(|line| line.trim_start().starts_with('@'))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(CompiledOutput {
            primary,
            secondary: source.as_str().to_string(),
        })
    }
}

/// Project whose every non-import document receives the same imports.
pub struct TestProject {
    file_path: PathBuf,
    engine: Arc<CountingEngine>,
    imports: Mutex<Vec<Arc<DocumentState>>>,
    import_resolutions: AtomicUsize,
}

impl TestProject {
    pub fn new(engine: Arc<CountingEngine>) -> Arc<Self> {
        Arc::new(Self {
            file_path: PathBuf::from("/project/App.csproj"),
            engine,
            imports: Mutex::new(Vec::new()),
            import_resolutions: AtomicUsize::new(0),
        })
    }

    pub fn set_imports(&self, imports: Vec<Arc<DocumentState>>) {
        *self.imports.lock() = imports;
    }

    pub fn import_resolutions(&self) -> usize {
        self.import_resolutions.load(Ordering::SeqCst)
    }
}

impl ProjectSnapshot for TestProject {
    fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn engine(&self) -> Arc<dyn ProjectEngine> {
        self.engine.clone()
    }

    fn resolve_imports(&self, state: &DocumentState) -> Vec<Arc<DocumentState>> {
        self.import_resolutions.fetch_add(1, Ordering::SeqCst);
        if state.host_document().file_kind().is_component()
            && state.host_document().file_path().ends_with("_Imports.razor")
        {
            return Vec::new();
        }
        self.imports.lock().clone()
    }
}

pub fn host(path: &str) -> HostDocument {
    let target = Path::new(path)
        .strip_prefix("/project")
        .unwrap_or(Path::new(path))
        .to_path_buf();
    HostDocument::new(path, target).unwrap()
}

pub fn project_dyn(project: &Arc<TestProject>) -> Arc<dyn ProjectSnapshot> {
    project.clone()
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Yield until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}

//! Collaborator traits supplied by project management and the compiler.
//!
//! The derivation core does not parse or generate code itself. A host wires in
//! a [`ProjectSnapshot`] that knows how to resolve a document's imports and hands
//! out the [`ProjectEngine`] that compiles documents for that project.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::source::{HostDocument, SourceBuffer};
use crate::state::DocumentState;

/// An import document's contribution to a compilation.
#[derive(Debug, Clone)]
pub struct ImportSource {
    /// Path of the import file.
    pub file_path: PathBuf,
    /// Text of the import file at the version that was resolved.
    pub text: SourceBuffer,
}

/// Raw generated code produced by a [`ProjectEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    /// The general-purpose-language projection (e.g. generated C#).
    pub primary: String,
    /// The markup projection (e.g. generated HTML).
    pub secondary: String,
}

/// Compiler for one project configuration.
///
/// Implementations must be pure with respect to their inputs and safe to call
/// concurrently for different documents.
#[async_trait]
pub trait ProjectEngine: Send + Sync + 'static {
    /// Compile `source` for `document`, applying `imports` in order.
    async fn compile(
        &self,
        document: &HostDocument,
        source: &SourceBuffer,
        imports: &[ImportSource],
    ) -> anyhow::Result<CompiledOutput>;
}

/// Read-only view of the project that owns a document.
pub trait ProjectSnapshot: Send + Sync + 'static {
    /// Path of the project file.
    fn file_path(&self) -> &Path;

    /// The engine that compiles documents of this project.
    fn engine(&self) -> Arc<dyn ProjectEngine>;

    /// The import documents that apply to `state`, in application order.
    fn resolve_imports(&self, state: &DocumentState) -> Vec<Arc<DocumentState>>;
}

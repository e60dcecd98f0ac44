//! Read-only document snapshots.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::CoreError;
use crate::output::ProjectedOutputs;
use crate::project::ProjectSnapshot;
use crate::source::{FileKind, SourceBuffer};
use crate::state::DocumentState;
use crate::version::VersionStamp;

/// A point-in-time view of one document version inside its project.
///
/// Cheap to clone. Every accessor reads from the bound [`DocumentState`], which
/// never changes, so a snapshot keeps answering for its version even after the
/// document has been edited.
#[derive(Clone)]
pub struct DocumentSnapshot {
    project: Arc<dyn ProjectSnapshot>,
    state: Arc<DocumentState>,
}

impl DocumentSnapshot {
    pub fn new(project: Arc<dyn ProjectSnapshot>, state: Arc<DocumentState>) -> Self {
        Self { project, state }
    }

    pub fn project(&self) -> &Arc<dyn ProjectSnapshot> {
        &self.project
    }

    pub fn state(&self) -> &Arc<DocumentState> {
        &self.state
    }

    pub fn file_kind(&self) -> FileKind {
        self.state.host_document().file_kind()
    }

    pub fn file_path(&self) -> &Path {
        self.state.host_document().file_path()
    }

    pub fn target_path(&self) -> &Path {
        self.state.host_document().target_path()
    }

    /// Whether generated output can be requested for this document.
    pub fn supports_output(&self) -> bool {
        true
    }

    /// Snapshots of the import documents that apply to this document.
    pub fn imports(&self) -> Vec<DocumentSnapshot> {
        self.state
            .imports(self.project.as_ref())
            .into_iter()
            .map(|state| DocumentSnapshot::new(self.project.clone(), state))
            .collect()
    }

    pub fn text(&self) -> &SourceBuffer {
        self.state.text()
    }

    pub fn text_version(&self) -> VersionStamp {
        self.state.text_version()
    }

    /// Generated output, computing it if needed.
    pub async fn generated_output(&self) -> Result<Arc<ProjectedOutputs>, CoreError> {
        self.state.generated_output(&self.project).await
    }

    pub async fn generated_primary_version(&self) -> Result<VersionStamp, CoreError> {
        self.state.generated_primary_version(&self.project).await
    }

    pub async fn generated_secondary_version(&self) -> Result<VersionStamp, CoreError> {
        self.state.generated_secondary_version(&self.project).await
    }

    /// Generated output if already computed. Never waits.
    pub fn try_get_generated_output(&self) -> Option<Arc<ProjectedOutputs>> {
        self.state.try_get_generated_output()
    }

    pub fn try_get_generated_primary_version(&self) -> Option<VersionStamp> {
        self.try_get_generated_output()
            .map(|output| output.primary_version())
    }

    pub fn try_get_generated_secondary_version(&self) -> Option<VersionStamp> {
        self.try_get_generated_output()
            .map(|output| output.secondary_version())
    }
}

impl fmt::Debug for DocumentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSnapshot")
            .field("project", &self.project.file_path())
            .field("state", &self.state)
            .finish()
    }
}

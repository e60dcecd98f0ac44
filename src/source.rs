//! Source buffers and host document metadata.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CoreError;

/// Immutable document text.
///
/// Cloning is cheap; all clones share the same allocation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceBuffer {
    text: Arc<str>,
}

impl SourceBuffer {
    /// Create a buffer from text.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    /// Create a buffer from raw bytes, rejecting malformed UTF-8.
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self, CoreError> {
        String::from_utf8(bytes)
            .map(Self::new)
            .map_err(|e| CoreError::invalid_argument(format!("source buffer is not UTF-8: {e}")))
    }

    /// The buffer contents.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Shared handle to the underlying text.
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    /// Returns true if both buffers point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.text, &other.text)
    }
}

impl fmt::Debug for SourceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBuffer")
            .field("len", &self.text.len())
            .finish()
    }
}

impl From<&str> for SourceBuffer {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SourceBuffer {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// The flavor of a templated document, which selects the code generation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A component file (`.razor`).
    Component,
    /// A component import file (`_Imports.razor`), applied to its sibling components.
    ComponentImport,
    /// A view or page file (`.cshtml`).
    Legacy,
}

impl FileKind {
    /// Infer the kind from a file path.
    pub fn from_path(path: &Path) -> Self {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if file_name.eq_ignore_ascii_case("_Imports.razor") {
            FileKind::ComponentImport
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("razor"))
        {
            FileKind::Component
        } else {
            FileKind::Legacy
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, FileKind::Component | FileKind::ComponentImport)
    }
}

/// Identity of a document as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostDocument {
    file_path: PathBuf,
    target_path: PathBuf,
    file_kind: FileKind,
}

impl HostDocument {
    /// Create a host document, inferring the file kind from `file_path`.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidArgument` if `file_path` is empty.
    pub fn new(
        file_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
    ) -> Result<Self, CoreError> {
        let file_path = file_path.into();
        let file_kind = FileKind::from_path(&file_path);
        Self::with_kind(file_path, target_path, file_kind)
    }

    /// Create a host document with an explicit file kind.
    pub fn with_kind(
        file_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
        file_kind: FileKind,
    ) -> Result<Self, CoreError> {
        let file_path = file_path.into();
        if file_path.as_os_str().is_empty() {
            return Err(CoreError::invalid_argument("host document file path is empty"));
        }
        Ok(Self {
            file_path,
            target_path: target_path.into(),
            file_kind,
        })
    }

    /// Absolute path of the document on disk.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Project-relative path used for code generation.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn file_kind(&self) -> FileKind {
        self.file_kind
    }
}

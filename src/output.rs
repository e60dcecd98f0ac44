//! Derived outputs of a document version.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::project::CompiledOutput;
use crate::source::{FileKind, SourceBuffer};
use crate::state::DocumentState;
use crate::version::VersionStamp;
use crate::views::{DerivedViewCache, IndexedText, ViewKey};

/// One generated projection together with the version of its text.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    text: Arc<str>,
    version: VersionStamp,
}

impl GeneratedArtifact {
    pub fn new(text: impl Into<Arc<str>>, version: VersionStamp) -> Self {
        Self {
            text: text.into(),
            version,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Version of the text. Only changes when the generated text changes.
    pub fn version(&self) -> VersionStamp {
        self.version
    }

    /// Reuse `prior`'s version if the generated text did not change.
    fn carry_forward(text: String, prior: Option<&GeneratedArtifact>, fresh: VersionStamp) -> Self {
        match prior {
            Some(prior) if *prior.text == *text => prior.clone(),
            _ => Self::new(text, fresh),
        }
    }
}

impl fmt::Debug for GeneratedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedArtifact")
            .field("len", &self.text.len())
            .field("version", &self.version)
            .finish()
    }
}

/// The compiled form of one document version.
///
/// Owns the [`DerivedViewCache`] for its text views, so views are computed at
/// most once per compiled document.
pub struct CodeDocument {
    file_path: PathBuf,
    file_kind: FileKind,
    source: SourceBuffer,
    primary: GeneratedArtifact,
    secondary: GeneratedArtifact,
    views: DerivedViewCache,
}

impl CodeDocument {
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_kind(&self) -> FileKind {
        self.file_kind
    }

    /// The source buffer this document was compiled from.
    pub fn source(&self) -> &SourceBuffer {
        &self.source
    }

    pub fn primary(&self) -> &GeneratedArtifact {
        &self.primary
    }

    pub fn secondary(&self) -> &GeneratedArtifact {
        &self.secondary
    }

    pub fn views(&self) -> &DerivedViewCache {
        &self.views
    }

    /// Line-indexed view of the source text.
    pub fn source_text(&self) -> Arc<IndexedText> {
        self.views.get_or_create(ViewKey::SourceText, || {
            IndexedText::new(self.source.text().clone())
        })
    }

    /// Line-indexed view of the generated primary text.
    pub fn primary_text(&self) -> Arc<IndexedText> {
        self.views.get_or_create(ViewKey::PrimaryText, || {
            IndexedText::new(self.primary.text.clone())
        })
    }

    /// Line-indexed view of the generated markup text.
    pub fn secondary_text(&self) -> Arc<IndexedText> {
        self.views.get_or_create(ViewKey::SecondaryText, || {
            IndexedText::new(self.secondary.text.clone())
        })
    }
}

impl fmt::Debug for CodeDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeDocument")
            .field("file_path", &self.file_path)
            .field("file_kind", &self.file_kind)
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .finish_non_exhaustive()
    }
}

/// Result of deriving one [`DocumentState`].
///
/// `source_version` is always the version of the state this was computed from,
/// which is how callers detect that a result is stale.
#[derive(Debug)]
pub struct ProjectedOutputs {
    document: CodeDocument,
    source_version: VersionStamp,
}

impl ProjectedOutputs {
    /// Wrap raw compiler output for the state with `source_version`.
    ///
    /// Artifact versions are carried forward from `prior` when the generated text
    /// is unchanged; otherwise they take `source_version`.
    pub(crate) fn new(
        file_path: PathBuf,
        file_kind: FileKind,
        source: SourceBuffer,
        source_version: VersionStamp,
        compiled: CompiledOutput,
        prior: Option<&ProjectedOutputs>,
    ) -> Self {
        let primary = GeneratedArtifact::carry_forward(
            compiled.primary,
            prior.map(|p| &p.document.primary),
            source_version,
        );
        let secondary = GeneratedArtifact::carry_forward(
            compiled.secondary,
            prior.map(|p| &p.document.secondary),
            source_version,
        );
        Self {
            document: CodeDocument {
                file_path,
                file_kind,
                source,
                primary,
                secondary,
                views: DerivedViewCache::new(),
            },
            source_version,
        }
    }

    pub fn document(&self) -> &CodeDocument {
        &self.document
    }

    pub fn source_version(&self) -> VersionStamp {
        self.source_version
    }

    pub fn generated_primary(&self) -> &GeneratedArtifact {
        &self.document.primary
    }

    pub fn generated_secondary(&self) -> &GeneratedArtifact {
        &self.document.secondary
    }

    pub fn primary_version(&self) -> VersionStamp {
        self.document.primary.version
    }

    pub fn secondary_version(&self) -> VersionStamp {
        self.document.secondary.version
    }

    /// Returns true if this output was computed from `state`'s version.
    pub fn is_current_for(&self, state: &DocumentState) -> bool {
        self.source_version == state.text_version()
    }
}

//! Versioned document state.
//!
//! A [`DocumentState`] is one immutable version of a document. Edits never
//! mutate a state; [`DocumentState::with_text`] produces a successor with a newer
//! [`VersionStamp`], so snapshots of older versions keep seeing exactly what they
//! saw before. Each state owns the memoization slot for its generated output.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::CoreError;
use crate::memo::MemoSlot;
use crate::output::ProjectedOutputs;
use crate::project::{ImportSource, ProjectSnapshot};
use crate::source::{HostDocument, SourceBuffer};
use crate::version::VersionStamp;

/// Imports captured the first time a state asks its project for them.
struct ResolvedImports {
    /// Weak so import chains never keep old versions alive.
    states: Vec<Weak<DocumentState>>,
    /// What derivation compiles against. Fixed at resolution so the output
    /// depends on this state alone, whatever happens to the import states later.
    sources: Vec<ImportSource>,
}

pub struct DocumentState {
    host: HostDocument,
    buffer: SourceBuffer,
    version: VersionStamp,
    imports: OnceLock<ResolvedImports>,
    output: MemoSlot<Arc<ProjectedOutputs>>,
    /// Output of the predecessor, if it was already computed when this state was
    /// created. Used to carry artifact versions forward; released once our own
    /// output completes.
    prior_output: Mutex<Option<Arc<ProjectedOutputs>>>,
}

impl DocumentState {
    /// Create a state for `host` holding `buffer`.
    ///
    /// With a `prior` state the new version is strictly greater than the prior
    /// one; without one the state starts a new lineage.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidArgument` if `prior` describes a different document.
    pub fn create(
        host: HostDocument,
        buffer: SourceBuffer,
        prior: Option<&DocumentState>,
    ) -> Result<Arc<Self>, CoreError> {
        let prior_output = match prior {
            Some(prior) => {
                if prior.host.file_path() != host.file_path() {
                    return Err(CoreError::invalid_argument(format!(
                        "prior state belongs to {}, not {}",
                        prior.host.file_path().display(),
                        host.file_path().display()
                    )));
                }
                prior.try_get_generated_output()
            }
            None => None,
        };
        // A prior's stamp came from the same counter, so a fresh one is newer.
        let version = VersionStamp::next();

        debug!(
            file_path = %host.file_path().display(),
            %version,
            len = buffer.len(),
            "created document state"
        );

        Ok(Arc::new(Self {
            host,
            buffer,
            version,
            imports: OnceLock::new(),
            output: MemoSlot::new(),
            prior_output: Mutex::new(prior_output),
        }))
    }

    /// Produce the successor state holding `buffer`. `self` is left untouched.
    pub fn with_text(&self, buffer: SourceBuffer) -> Arc<Self> {
        // Every state's stamp came from the counter, so a fresh one is newer.
        let version = VersionStamp::next();
        debug!(
            file_path = %self.host.file_path().display(),
            from = %self.version,
            to = %version,
            "document text changed"
        );
        Arc::new(Self {
            host: self.host.clone(),
            buffer,
            version,
            imports: OnceLock::new(),
            output: MemoSlot::new(),
            prior_output: Mutex::new(self.try_get_generated_output()),
        })
    }

    pub fn host_document(&self) -> &HostDocument {
        &self.host
    }

    pub fn text(&self) -> &SourceBuffer {
        &self.buffer
    }

    /// Version of this state's text. Never requires derivation.
    pub fn text_version(&self) -> VersionStamp {
        self.version
    }

    /// Import documents applying to this state, resolved through `project` on
    /// first access and memoized for the life of the state.
    ///
    /// Imports whose state has since been dropped are skipped here; derivation
    /// still sees the text they had when they were resolved. `project` must not
    /// call back into `imports` on the same state while resolving.
    pub fn imports(&self, project: &dyn ProjectSnapshot) -> Vec<Arc<DocumentState>> {
        self.resolved_imports(project)
            .states
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn resolved_imports(&self, project: &dyn ProjectSnapshot) -> &ResolvedImports {
        self.imports.get_or_init(|| {
            let resolved = project.resolve_imports(self);
            trace!(
                file_path = %self.host.file_path().display(),
                version = %self.version,
                count = resolved.len(),
                "resolved imports"
            );
            ResolvedImports {
                states: resolved.iter().map(Arc::downgrade).collect(),
                sources: resolved
                    .iter()
                    .map(|import| ImportSource {
                        file_path: import.host.file_path().to_path_buf(),
                        text: import.buffer.clone(),
                    })
                    .collect(),
            }
        })
    }

    /// Returns true if generated output is ready to be read without waiting.
    pub fn is_generated_output_available(&self) -> bool {
        self.output.is_completed()
    }

    /// Generated output if it has already been computed.
    ///
    /// Never starts a derivation and never waits for one in flight.
    pub fn try_get_generated_output(&self) -> Option<Arc<ProjectedOutputs>> {
        self.output.get()
    }

    /// Generated output for this state, computing it on first request.
    ///
    /// Concurrent callers share one computation and receive the same `Arc`.
    /// A failure is returned to the callers awaiting that attempt and is not
    /// remembered; the next call starts a new attempt.
    ///
    /// The derivation only makes progress while some caller is awaiting it. If
    /// every caller drops its future, the attempt stays pending and the next
    /// call resumes it rather than compiling again.
    pub async fn generated_output(
        &self,
        project: &Arc<dyn ProjectSnapshot>,
    ) -> Result<Arc<ProjectedOutputs>, CoreError> {
        if let Some(output) = self.output.get() {
            trace!(
                file_path = %self.host.file_path().display(),
                version = %self.version,
                "generated output cache hit"
            );
            return Ok(output);
        }

        let imports = self.resolved_imports(project.as_ref()).sources.clone();
        // Gathered before the slot lock is taken; the project is foreign code.
        let engine = project.engine();
        let prior = self.prior_output.lock().clone();

        let result = self
            .output
            .get_or_compute(|| {
                let host = self.host.clone();
                let buffer = self.buffer.clone();
                let version = self.version;
                async move {
                    debug!(
                        file_path = %host.file_path().display(),
                        %version,
                        imports = imports.len(),
                        "deriving generated output"
                    );
                    let compiled = engine
                        .compile(&host, &buffer, &imports)
                        .await
                        .map_err(|cause| {
                            warn!(
                                file_path = %host.file_path().display(),
                                %version,
                                error = %cause,
                                "derivation failed"
                            );
                            CoreError::DerivationFailed {
                                file_path: host.file_path().to_path_buf(),
                                version,
                                cause: Arc::new(cause),
                            }
                        })?;
                    debug!(
                        file_path = %host.file_path().display(),
                        %version,
                        "derived generated output"
                    );
                    Ok(Arc::new(ProjectedOutputs::new(
                        host.file_path().to_path_buf(),
                        host.file_kind(),
                        buffer,
                        version,
                        compiled,
                        prior.as_deref(),
                    )))
                }
            })
            .await;

        if result.is_ok() {
            self.prior_output.lock().take();
        }
        result
    }

    /// Version of the generated primary text. Shares the generated output slot.
    pub async fn generated_primary_version(
        &self,
        project: &Arc<dyn ProjectSnapshot>,
    ) -> Result<VersionStamp, CoreError> {
        Ok(self.generated_output(project).await?.primary_version())
    }

    /// Version of the generated markup text. Shares the generated output slot.
    pub async fn generated_secondary_version(
        &self,
        project: &Arc<dyn ProjectSnapshot>,
    ) -> Result<VersionStamp, CoreError> {
        Ok(self.generated_output(project).await?.secondary_version())
    }
}

impl fmt::Debug for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentState")
            .field("file_path", &self.host.file_path())
            .field("version", &self.version)
            .field("buffer", &self.buffer)
            .field("output", &self.output)
            .finish()
    }
}

//! Razor-derive: versioned document snapshots and memoized derivation for
//! templated-source language tooling.
//!
//! # Key Pieces
//!
//! - **[`DocumentState`]**: one immutable version of a document; edits create successors
//! - **[`DocumentSnapshot`]**: read handle binding a state to its project
//! - **Generated output cache**: each state derives its [`ProjectedOutputs`] at most once,
//!   coalescing concurrent callers and retrying after failures
//! - **[`DerivedViewCache`]**: per-document memoized text views
//! - **[`ResolveCache`]**: bounded token cache for two-phase request/resolve protocols
//!
//! # Example
//!
//! ```ignore
//! let state = DocumentState::create(host, "<h1>@title</h1>".into(), None)?;
//! let snapshot = DocumentSnapshot::new(project, state.clone());
//!
//! // Fast path, never waits
//! if let Some(output) = snapshot.try_get_generated_output() { /* ... */ }
//!
//! // Computes once, shared with concurrent callers
//! let output = snapshot.generated_output().await?;
//! assert_eq!(output.source_version(), state.text_version());
//! ```

mod config;
mod error;
mod memo;
mod output;
mod project;
mod resolve;
mod snapshot;
mod source;
mod state;
mod version;
mod views;

pub use config::{CoreConfig, CoreConfigBuilder, DEFAULT_RESOLVE_CAPACITY};
pub use error::CoreError;
pub use memo::MemoSlot;
pub use output::{CodeDocument, GeneratedArtifact, ProjectedOutputs};
pub use project::{CompiledOutput, ImportSource, ProjectEngine, ProjectSnapshot};
pub use resolve::{ResolveCache, ResolveToken};
pub use snapshot::DocumentSnapshot;
pub use source::{FileKind, HostDocument, SourceBuffer};
pub use state::DocumentState;
pub use version::VersionStamp;
pub use views::{DerivedViewCache, IndexedText, LinePosition, ViewKey};

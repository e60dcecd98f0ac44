//! Version stamps for document states and generated artifacts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Process-wide source of version stamps. Zero is never handed out.
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Highest raw value [`VersionStamp::after`] accepts as a prior. Keeps the
/// counter far enough from `u64::MAX` that [`VersionStamp::next`] cannot wrap.
const LAST_FOREIGN_STAMP: u64 = u64::MAX >> 1;

/// A totally ordered token identifying one version of a document's input.
///
/// Stamps are allocated from a monotonically increasing counter, so a stamp
/// created later always compares greater than one created earlier. Two stamps are
/// equal only when they were copied from the same allocation, i.e. they describe
/// the same input.
///
/// # Examples
///
/// ```
/// # use razor_derive::VersionStamp;
/// let v1 = VersionStamp::next();
/// let v2 = VersionStamp::next();
/// assert!(v1 < v2);
/// assert!(v2.is_newer_than(v1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionStamp(u64);

impl VersionStamp {
    /// Allocate a fresh stamp, strictly greater than every stamp allocated before.
    pub fn next() -> Self {
        Self(NEXT_STAMP.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate a fresh stamp that is strictly greater than `prior`.
    ///
    /// The global counter already guarantees this for stamps it produced; the
    /// check only matters for stamps rebuilt with [`VersionStamp::from_raw`] or
    /// deserialized from a payload.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidArgument` if `prior` is so large that no greater stamp
    /// can be handed out without running the counter into overflow.
    pub fn after(prior: VersionStamp) -> Result<Self, CoreError> {
        if prior.0 >= LAST_FOREIGN_STAMP {
            return Err(CoreError::invalid_argument(format!(
                "version {prior} leaves no room for a newer stamp"
            )));
        }
        NEXT_STAMP.fetch_max(prior.0 + 1, Ordering::Relaxed);
        Ok(Self::next())
    }

    /// Rebuild a stamp from its raw value, e.g. after it travelled through a payload.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw counter value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Returns true if this stamp was created after `other`.
    pub fn is_newer_than(&self, other: VersionStamp) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

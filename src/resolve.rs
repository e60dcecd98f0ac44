//! Bounded token cache for two-phase request/resolve protocols.
//!
//! A request handler stores the result set it produced and embeds the returned
//! [`ResolveToken`] in its response. A later resolve request hands the token back
//! and gets the result set without the client re-sending any context.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::CoreConfig;
use crate::error::CoreError;

/// Opaque reference to a stored result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolveToken(u64);

impl ResolveToken {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResolveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored result set. Tokens increase with every store, so the token also
/// records insertion order.
struct Entry<T> {
    token: ResolveToken,
    payload: Arc<T>,
}

struct Inner<T> {
    /// Oldest first.
    entries: VecDeque<Entry<T>>,
    next_token: u64,
}

/// FIFO-bounded map from [`ResolveToken`] to result sets.
///
/// When a store would exceed the capacity, the oldest entry is evicted. Lookups
/// do not refresh an entry's position. All operations take one short lock.
pub struct ResolveCache<T> {
    capacity: usize,
    inner: Mutex<Inner<T>>,
}

impl<T> ResolveCache<T> {
    /// Create a cache holding at most `capacity` result sets.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CoreError> {
        Self::from_config(&CoreConfig {
            resolve_capacity: capacity,
        })
    }

    pub fn from_config(config: &CoreConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            capacity: config.resolve_capacity,
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(config.resolve_capacity),
                next_token: 1,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Store `payload` and return the token that resolves to it.
    pub fn store(&self, payload: T) -> ResolveToken {
        self.store_shared(Arc::new(payload))
    }

    /// Like [`ResolveCache::store`] for a payload that is already shared.
    pub fn store_shared(&self, payload: Arc<T>) -> ResolveToken {
        let mut inner = self.inner.lock();

        // Tokens are never reused, so an evicted token can't resolve to a newer entry.
        let token = ResolveToken(inner.next_token);
        inner.next_token += 1;

        while inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.entries.pop_front() {
                debug!(token = %evicted.token, "evicted resolve cache entry");
            }
        }
        inner.entries.push_back(Entry { token, payload });
        trace!(%token, len = inner.entries.len(), "stored resolve cache entry");
        token
    }

    /// The result set for `token`, or `None` if it is unknown or was evicted.
    pub fn resolve(&self, token: ResolveToken) -> Option<Arc<T>> {
        let inner = self.inner.lock();
        let found = inner
            .entries
            .iter()
            .rev()
            .find(|entry| entry.token == token)
            .map(|entry| entry.payload.clone());
        if found.is_none() {
            trace!(%token, "resolve cache miss");
        }
        found
    }
}

impl<T> fmt::Debug for ResolveCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

//! Memoization slot that coalesces concurrent computations.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::error::CoreError;

type SharedComputation<T> = Shared<BoxFuture<'static, Result<T, CoreError>>>;

enum SlotState<T> {
    Empty,
    Pending(SharedComputation<T>),
    Completed(T),
}

/// Holds at most one in-flight or completed computation of a `T`.
///
/// The slot moves `Empty -> Pending -> Completed`. A failed computation moves
/// it back to `Empty` so the next caller retries instead of replaying the error.
/// The lock only guards the state transition; the computation itself is polled
/// by the awaiting callers outside of it.
pub struct MemoSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> Default for MemoSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Returns true if a computation has been started but not observed to finish.
    pub fn is_pending(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Pending(_))
    }

    pub fn is_completed(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Completed(_))
    }
}

impl<T> MemoSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Get the completed value without starting or waiting for a computation.
    pub fn get(&self) -> Option<T> {
        match &*self.state.lock() {
            SlotState::Completed(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Get the completed value, join the pending computation, or start one.
    ///
    /// `compute` is only called by the caller that wins the `Empty -> Pending`
    /// transition. It runs while the slot is locked, so it must only build the
    /// future; the work belongs inside the future.
    ///
    /// The shared future is driven by whoever awaits it. Dropping every caller
    /// pauses the computation in place; it stays `Pending` and the next call
    /// picks it up where it stopped.
    pub async fn get_or_compute<F, Fut>(&self, compute: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let computation = {
            let mut state = self.state.lock();
            match &*state {
                SlotState::Completed(value) => return Ok(value.clone()),
                SlotState::Pending(computation) => computation.clone(),
                SlotState::Empty => {
                    let computation = compute().boxed().shared();
                    *state = SlotState::Pending(computation.clone());
                    computation
                }
            }
        };

        let result = computation.clone().await;

        let mut state = self.state.lock();
        // Only the computation we awaited may be settled; a retry started after
        // a failure belongs to someone else.
        if let SlotState::Pending(current) = &*state {
            if current.ptr_eq(&computation) {
                *state = match &result {
                    Ok(value) => SlotState::Completed(value.clone()),
                    Err(_) => SlotState::Empty,
                };
            }
        }
        result
    }
}

impl<T> fmt::Debug for MemoSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.lock() {
            SlotState::Empty => "Empty",
            SlotState::Pending(_) => "Pending",
            SlotState::Completed(_) => "Completed",
        };
        f.debug_tuple("MemoSlot").field(&state).finish()
    }
}

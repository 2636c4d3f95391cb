//! Fetch ownership tokens.
//!
//! A fetch attempt owns the controller while its [`OperationToken`] is the
//! current one. `refresh`, `cancel` and `dispose` clear the slot; the attempt
//! notices at commit time that its token is stale and drops its result.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Identity of one fetch attempt.
///
/// Tokens come from a per-controller generation counter, so two attempts
/// never share a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationToken(u64);

impl OperationToken {
    /// The generation number of this attempt, starting at 1.
    #[inline]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "op#{}", self.0)
    }
}

/// The current-operation slot.
///
/// Every controller state transition runs while holding this slot's lock.
/// The lock is re-entrant so that an observer notified during a transition
/// can call back into the controller on the same thread; it is never held
/// across an `.await`.
pub(crate) struct OperationSlot {
    current: ReentrantMutex<Cell<Option<OperationToken>>>,
    generation: AtomicU64,
}

pub(crate) type OperationGuard<'a> = ReentrantMutexGuard<'a, Cell<Option<OperationToken>>>;

impl OperationSlot {
    pub(crate) const fn new() -> Self {
        Self {
            current: ReentrantMutex::new(Cell::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn lock(&self) -> OperationGuard<'_> {
        self.current.lock()
    }

    pub(crate) fn current(&self) -> Option<OperationToken> {
        self.current.lock().get()
    }

    pub(crate) fn next_token(&self) -> OperationToken {
        OperationToken(self.generation.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

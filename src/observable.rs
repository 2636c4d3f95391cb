//! A single-value publish/subscribe slot.
//!
//! [`Observable`] holds the current value behind an [`Arc`] and notifies its
//! listeners synchronously whenever the value is replaced. It is the sink the
//! paging controller publishes snapshots into, and the hook a UI layer uses
//! to re-render.
//!
//! Notification rules:
//!
//! - every [`set`](Observable::set) notifies, even if the new value equals
//!   the old one
//! - listeners run in registration order on the calling thread
//! - no internal lock is held while a listener runs, so a listener may read
//!   or replace the value
//!
//! # Examples
//!
//! ```rust
//! use pageloom::observable::Observable;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let slot = Observable::new(1);
//! let seen = Arc::new(AtomicUsize::new(0));
//! let seen_clone = Arc::clone(&seen);
//! slot.subscribe(move |value: &i32| {
//!     seen_clone.store(*value as usize, Ordering::SeqCst);
//! });
//!
//! slot.set(5);
//! assert_eq!(seen.load(Ordering::SeqCst), 5);
//! assert_eq!(*slot.get(), 5);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A current-value holder that notifies listeners on every reassignment.
pub struct Observable<T> {
    value: RwLock<Arc<T>>,
    listeners: Mutex<Vec<(ListenerId, Listener<T>)>>,
    next_listener_id: AtomicU64,
    disposed: AtomicBool,
}

impl<T> Observable<T> {
    /// Creates a slot holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(Arc::new(value)),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the current value.
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.value.read())
    }

    /// Replaces the value and notifies every listener with it.
    pub fn set(&self, value: T) {
        let published = Arc::new(value);
        *self.value.write() = Arc::clone(&published);

        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::trace!(listeners = listeners.len(), "notifying observers");
        for listener in listeners {
            listener(&published);
        }
    }

    /// Registers `listener` and returns its id.
    ///
    /// On a disposed slot the listener is dropped immediately and never
    /// called.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        if self.is_disposed() {
            tracing::warn!(listener = id.0, "subscribe on a disposed observable ignored");
            return id;
        }
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Drops every listener and refuses new ones.
    ///
    /// The value stays readable and writable.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        self.listeners.lock().clear();
    }

    /// Returns `true` once [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Observable")
            .field("value", &self.get())
            .field("listeners", &self.listener_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

static_assertions::assert_impl_all!(Observable<i32>: Send, Sync);

//! Error types for the paging controller.
//!
//! Two layers of error exist:
//!
//! - [`FetchFault`] is what a page fetch callback reports. It is a two-tag
//!   value: a `Recoverable` fault is an ordinary application-level failure
//!   (network down, server returned 500), a `Defect` fault signals a
//!   programming error that should reach logs or crash reporters.
//! - [`PagingError`] is what the controller records in
//!   [`PagingState::error`](crate::state::PagingState::error) and returns to
//!   callers. It wraps fetch faults and adds the structural failures the
//!   controller detects itself.
//!
//! Propagation is decided by [`PagingError::is_recoverable`]: recoverable
//! errors are only recorded in state, everything else is recorded and then
//! returned from [`fetch_next_page`](crate::controller::PagingController::fetch_next_page).
//!
//! # Examples
//!
//! ```rust
//! use pageloom::error::{FetchFault, PagingError};
//!
//! let fault = FetchFault::message("connection reset");
//! assert!(fault.is_recoverable());
//!
//! let error = PagingError::from(fault);
//! assert!(error.is_recoverable());
//! assert_eq!(format!("{error}"), "page fetch failed: connection reset");
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Shared, thread-safe error object carried by a [`FetchFault`].
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// A plain-text error used by [`FetchFault::message`] and
/// [`FetchFault::defect_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultMessage(pub String);

impl fmt::Display for FaultMessage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl Error for FaultMessage {}

/// The failure reported by a page fetch callback.
///
/// The tag decides what the controller does with the failure after it has
/// been recorded in state: `Recoverable` stops there, `Defect` is also
/// returned to the caller of `fetch_next_page`.
///
/// # Examples
///
/// ```rust
/// use pageloom::error::FetchFault;
/// use std::io;
///
/// let recoverable = FetchFault::recoverable(io::Error::other("timeout"));
/// let defect = FetchFault::defect_message("page size must not be zero");
///
/// assert!(recoverable.is_recoverable());
/// assert!(!defect.is_recoverable());
/// ```
#[derive(Clone)]
pub enum FetchFault {
    /// An expected, application-level failure.
    Recoverable(SharedError),
    /// An unexpected failure caused by a programming defect.
    Defect(SharedError),
}

impl FetchFault {
    /// Wraps `error` as a recoverable fault.
    pub fn recoverable<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Recoverable(Arc::new(error))
    }

    /// Wraps `error` as a defect-class fault.
    pub fn defect<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Defect(Arc::new(error))
    }

    /// Creates a recoverable fault from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::recoverable(FaultMessage(message.into()))
    }

    /// Creates a defect-class fault from a message.
    pub fn defect_message(message: impl Into<String>) -> Self {
        Self::defect(FaultMessage(message.into()))
    }

    /// Returns `true` for the `Recoverable` tag.
    #[inline]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// Returns the wrapped error regardless of tag.
    pub fn inner(&self) -> &SharedError {
        match self {
            Self::Recoverable(error) | Self::Defect(error) => error,
        }
    }

    const fn tag(&self) -> &'static str {
        match self {
            Self::Recoverable(_) => "Recoverable",
            Self::Defect(_) => "Defect",
        }
    }
}

impl fmt::Debug for FetchFault {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple(self.tag())
            .field(&format_args!("{}", self.inner()))
            .finish()
    }
}

impl fmt::Display for FetchFault {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.inner())
    }
}

// Two faults are equal when they carry the same tag and either share the
// same error object or render the same message.
impl PartialEq for FetchFault {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag()
            && (Arc::ptr_eq(self.inner(), other.inner())
                || self.inner().to_string() == other.inner().to_string())
    }
}

impl Error for FetchFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner().as_ref())
    }
}

/// Errors produced by the paging controller.
///
/// # Examples
///
/// ```rust
/// use pageloom::error::PagingError;
///
/// let error = PagingError::DuplicateItemId { id: "42".to_string() };
/// assert!(!error.is_recoverable());
/// assert_eq!(format!("{error}"), "duplicate item id: 42");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PagingError {
    /// The fetch callback failed.
    Fetch(FetchFault),
    /// An item id would appear twice in the accumulated state.
    DuplicateItemId {
        /// The offending id.
        id: String,
    },
    /// A manual insertion targeted a position past the end of the items.
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// The total item count at the time of the request.
        len: usize,
    },
}

impl PagingError {
    /// Returns `true` when the error is an ordinary application-level
    /// failure that should only be recorded in state.
    ///
    /// Duplicate ids and out-of-range indices are structural failures and
    /// therefore not recoverable.
    #[inline]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(fault) if fault.is_recoverable())
    }
}

impl fmt::Display for PagingError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(fault) => write!(formatter, "page fetch failed: {fault}"),
            Self::DuplicateItemId { id } => write!(formatter, "duplicate item id: {id}"),
            Self::IndexOutOfRange { index, len } => write!(
                formatter,
                "insertion index {index} is out of range for {len} items"
            ),
        }
    }
}

impl Error for PagingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(fault) => Some(fault),
            Self::DuplicateItemId { .. } | Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<FetchFault> for PagingError {
    fn from(fault: FetchFault) -> Self {
        Self::Fetch(fault)
    }
}

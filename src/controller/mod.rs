//! The paging controller.
//!
//! This module provides:
//!
//! - [`PagingController`]: owns the published [`PagingState`](crate::state::PagingState)
//!   and runs the fetch / refresh / cancel / insert operations
//! - [`PagingControllerBuilder`]: construction-time configuration
//! - [`PageLoad`]: what a fetch callback returns, synchronously or not
//! - [`OperationToken`]: identity of an in-flight fetch
//!
//! # Fetch lifecycle
//!
//! ```text
//! fetch_next_page()
//!   ├─ token already set ─────────────► return (no-op)
//!   ├─ claim token, publish is_loading = true, error = None
//!   ├─ has_next_page == false ────────► commit
//!   ├─ next_page_key() == None ───────► has_next_page = false, commit
//!   ├─ fetch_page(key) (await if pending)
//!   └─ commit, under the transition lock:
//!        token still current?
//!          re-read published state, check ids, append page,
//!          publish is_loading = false
//!        otherwise discard
//! ```
//!
//! # Examples
//!
//! ```rust
//! use futures::executor::block_on;
//! use pageloom::controller::PagingController;
//! use pageloom::error::FetchFault;
//! use pageloom::state::{PagingState, PagingStatus};
//!
//! let controller = PagingController::new(
//!     |_: &PagingState<u32, String>| Some(1),
//!     |_: u32| Err::<Vec<String>, _>(FetchFault::message("offline")),
//!     |item: &String| item.clone(),
//! );
//!
//! // Recoverable failures are recorded, not returned.
//! assert!(block_on(controller.fetch_next_page()).is_ok());
//! assert_eq!(controller.value().status(), PagingStatus::FirstPageError);
//! ```

mod builder;
mod operation;
mod page_load;
mod paging_controller;

#[cfg(feature = "tokio")]
mod spawn;

pub use builder::PagingControllerBuilder;
pub use operation::OperationToken;
pub use page_load::{FetchResult, PageLoad};
pub use paging_controller::PagingController;

//! # pageloom
//!
//! A pagination state controller: incremental page loading, single-flight
//! fetches and identity-checked item merges, meant to sit underneath a UI
//! list that loads more items as it scrolls.
//!
//! ## Overview
//!
//! - **State**: [`PagingState`](state::PagingState), an immutable snapshot of
//!   the loaded pages, their item ids and keys, and the loading / error flags
//! - **Observable**: [`Observable`](observable::Observable), the slot the
//!   controller publishes snapshots into
//! - **Controller**: [`PagingController`](controller::PagingController), the
//!   fetch / refresh / cancel / insert protocol
//! - **Errors**: [`PagingError`](error::PagingError) and the two-tag
//!   [`FetchFault`](error::FetchFault)
//!
//! ## Feature Flags
//!
//! - `tokio` (default): `spawn_fetch_next_page` on the ambient runtime
//! - `serde`: `Serialize` / `Deserialize` for the state types
//! - `fxhash`: use `rustc-hash` for the item id index
//! - `ahash`: use `ahash` for the item id index
//! - `full`: `tokio` and `serde`
//!
//! ## Example
//!
//! ```rust
//! use futures::executor::block_on;
//! use pageloom::prelude::*;
//!
//! let controller = PagingController::new(
//!     |state: &PagingState<u32, String>| Some(state.last_key().map_or(1, |key| key + 1)),
//!     |page: u32| vec![format!("post-{page}")],
//!     |item: &String| item.clone(),
//! );
//!
//! block_on(controller.fetch_next_page()).unwrap();
//! controller.insert_item("draft", "draft".to_string(), 0).unwrap();
//!
//! let state = controller.value();
//! assert_eq!(state.items().collect::<Vec<_>>(), vec!["draft", "post-1"]);
//! assert_eq!(state.status(), PagingStatus::Ongoing);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use pageloom::prelude::*;
/// ```
pub mod prelude {
    pub use crate::controller::{PageLoad, PagingController, PagingControllerBuilder};
    pub use crate::error::{FetchFault, PagingError};
    pub use crate::observable::Observable;
    pub use crate::state::{PagingState, PagingStatus};
}

pub mod controller;
pub mod error;
pub mod observable;
pub mod state;

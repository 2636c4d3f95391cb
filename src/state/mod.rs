//! Paging snapshots.
//!
//! This module provides the value types the controller publishes:
//!
//! - [`PagingState`]: the accumulated pages, their item ids and keys, plus
//!   the loading, has-next-page and error flags
//! - [`PagingStatus`]: a coarse, UI-oriented reading of a snapshot
//!
//! Snapshots are never mutated by the controller; each transition publishes
//! a fresh one.
//!
//! # Examples
//!
//! ```rust
//! use pageloom::state::{PagingState, PagingStatus};
//!
//! let state: PagingState<u32, String> = PagingState::default();
//! assert_eq!(state.status(), PagingStatus::LoadingFirstPage);
//! assert_eq!(state.item_count(), 0);
//! ```

mod item_ids;
mod paging_state;
mod status;

pub(crate) use item_ids::{ItemIdIndex, materialize_item_ids};
pub use paging_state::PagingState;
pub use status::PagingStatus;

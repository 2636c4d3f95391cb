//! Coarse paging status derived from a snapshot.

use super::PagingState;

/// What a UI should be showing for a given [`PagingState`].
///
/// | has items | has next page | error | status                  |
/// |-----------|---------------|-------|-------------------------|
/// | yes       | yes           | no    | `Ongoing`               |
/// | yes       | no            | any   | `Completed`             |
/// | no        | yes           | no    | `LoadingFirstPage`      |
/// | yes       | yes           | yes   | `SubsequentPageError`   |
/// | no        | no            | no    | `NoItemsFound`          |
/// | no        | any           | yes   | `FirstPageError`        |
///
/// # Examples
///
/// ```rust
/// use pageloom::state::{PagingState, PagingStatus};
///
/// let state: PagingState<u32, i32> = PagingState::default();
/// assert_eq!(state.status(), PagingStatus::LoadingFirstPage);
///
/// let state = state.with_pages(Some(vec![vec![1]])).with_has_next_page(false);
/// assert_eq!(state.status(), PagingStatus::Completed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PagingStatus {
    /// Nothing loaded yet and no error; the first page is pending.
    LoadingFirstPage,
    /// Items are loaded and more pages may follow.
    Ongoing,
    /// Items are loaded and no page follows.
    Completed,
    /// Loading finished without a single item.
    NoItemsFound,
    /// The first page failed.
    FirstPageError,
    /// A page after the first one failed.
    SubsequentPageError,
}

impl<Key, Item> PagingState<Key, Item> {
    /// Derives the [`PagingStatus`] of this snapshot.
    pub fn status(&self) -> PagingStatus {
        let has_items = self.item_count() > 0;
        let has_error = self.error.is_some();

        match (has_items, self.has_next_page, has_error) {
            (true, true, false) => PagingStatus::Ongoing,
            (true, false, _) => PagingStatus::Completed,
            (false, true, false) => PagingStatus::LoadingFirstPage,
            (true, true, true) => PagingStatus::SubsequentPageError,
            (false, false, false) => PagingStatus::NoItemsFound,
            (false, _, true) => PagingStatus::FirstPageError,
        }
    }
}

//! The immutable paging snapshot.

use crate::error::PagingError;

/// A snapshot of everything the controller has loaded so far.
///
/// `PagingState` is a value type: every transition produces a new snapshot
/// through the `with_*` methods or [`reset`](Self::reset) instead of
/// mutating an existing one. The fields are public so that integrations can
/// build a state by hand and splice it into a controller; nothing here
/// validates the length invariants, that is the controller's job.
///
/// `pages`, `item_ids` and `keys` run in parallel: `item_ids[i]` holds the
/// identifiers of `pages[i]` in the same order, and `keys[i]` is the key
/// page `i` was fetched with.
///
/// # Type Parameters
///
/// * `Key` - The page key passed to the fetch callback (page number, cursor)
/// * `Item` - The item type
///
/// # Examples
///
/// ```rust
/// use pageloom::state::PagingState;
///
/// let state: PagingState<u32, &str> = PagingState::default()
///     .with_pages(Some(vec![vec!["a", "b"]]))
///     .with_keys(Some(vec![1]))
///     .with_loading(true);
///
/// assert_eq!(state.item_count(), 2);
/// assert_eq!(state.last_key(), Some(&1));
/// assert!(state.is_loading);
///
/// let empty = state.reset();
/// assert_eq!(empty, PagingState::default());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PagingState<Key, Item> {
    /// The loaded pages, or `None` before anything was loaded.
    pub pages: Option<Vec<Vec<Item>>>,
    /// Per-page item identifiers, parallel to `pages`.
    pub item_ids: Option<Vec<Vec<String>>>,
    /// The key each page was fetched with.
    pub keys: Option<Vec<Key>>,
    /// The last error, cleared when the next fetch starts.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub error: Option<PagingError>,
    /// `false` once the key callback reported that no page follows.
    pub has_next_page: bool,
    /// `true` while a fetch is owned by the controller.
    pub is_loading: bool,
}

impl<Key, Item> Default for PagingState<Key, Item> {
    fn default() -> Self {
        Self {
            pages: None,
            item_ids: None,
            keys: None,
            error: None,
            has_next_page: true,
            is_loading: false,
        }
    }
}

impl<Key, Item> PagingState<Key, Item> {
    /// Creates an empty state: no pages, not loading, more pages expected.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the empty state, discarding pages, ids, keys and the error.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self::default()
    }

    /// Returns a copy with `pages` replaced.
    #[must_use]
    pub fn with_pages(self, pages: Option<Vec<Vec<Item>>>) -> Self {
        Self { pages, ..self }
    }

    /// Returns a copy with `item_ids` replaced.
    #[must_use]
    pub fn with_item_ids(self, item_ids: Option<Vec<Vec<String>>>) -> Self {
        Self { item_ids, ..self }
    }

    /// Returns a copy with `keys` replaced.
    #[must_use]
    pub fn with_keys(self, keys: Option<Vec<Key>>) -> Self {
        Self { keys, ..self }
    }

    /// Returns a copy with `error` replaced.
    #[must_use]
    pub fn with_error(self, error: Option<PagingError>) -> Self {
        Self { error, ..self }
    }

    /// Returns a copy with `has_next_page` replaced.
    #[must_use]
    pub fn with_has_next_page(self, has_next_page: bool) -> Self {
        Self {
            has_next_page,
            ..self
        }
    }

    /// Returns a copy with `is_loading` replaced.
    #[must_use]
    pub fn with_loading(self, is_loading: bool) -> Self {
        Self { is_loading, ..self }
    }

    /// Iterates over every item of every page, in order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.pages.iter().flatten().flatten()
    }

    /// Total number of items across all pages.
    pub fn item_count(&self) -> usize {
        self.pages
            .as_ref()
            .map_or(0, |pages| pages.iter().map(Vec::len).sum())
    }

    /// Number of loaded pages.
    pub fn page_count(&self) -> usize {
        self.pages.as_ref().map_or(0, Vec::len)
    }

    /// The key of the most recently fetched page.
    ///
    /// Handy for key callbacks that count pages:
    ///
    /// ```rust
    /// use pageloom::state::PagingState;
    ///
    /// let next = |state: &PagingState<u32, String>| Some(state.last_key().map_or(1, |key| key + 1));
    /// assert_eq!(next(&PagingState::default()), Some(1));
    /// ```
    pub fn last_key(&self) -> Option<&Key> {
        self.keys.as_ref().and_then(|keys| keys.last())
    }

    /// Returns `true` when `id` is present in the materialised id pages.
    ///
    /// Pages spliced in without ids are not consulted; the controller derives
    /// their ids before it checks for duplicates.
    pub fn contains_item_id(&self, id: &str) -> bool {
        self.item_ids
            .iter()
            .flatten()
            .flatten()
            .any(|existing| existing == id)
    }

    /// Checks the parallel-array invariants.
    ///
    /// `item_ids`, when set, must mirror `pages` page by page. `keys` may be
    /// shorter than `pages` (a page inserted by hand carries no key) but
    /// never longer.
    pub fn is_consistent(&self) -> bool {
        let page_lengths: Vec<usize> = self
            .pages
            .as_ref()
            .map(|pages| pages.iter().map(Vec::len).collect())
            .unwrap_or_default();

        let ids_match = self.item_ids.as_ref().is_none_or(|item_ids| {
            item_ids.len() == page_lengths.len()
                && item_ids
                    .iter()
                    .zip(&page_lengths)
                    .all(|(ids, length)| ids.len() == *length)
        });
        let keys_fit = self
            .keys
            .as_ref()
            .is_none_or(|keys| keys.len() <= page_lengths.len());

        ids_match && keys_fit
    }

    /// Maps every item, keeping pages, ids and keys in place.
    ///
    /// The mapping must preserve item identity: ids are carried over
    /// unchanged rather than recomputed.
    ///
    /// ```rust
    /// use pageloom::state::PagingState;
    ///
    /// let state: PagingState<u32, i32> = PagingState::default().with_pages(Some(vec![vec![1, 2], vec![3]]));
    /// let doubled = state.map_items(|item| item * 2);
    /// assert_eq!(doubled.pages, Some(vec![vec![2, 4], vec![6]]));
    /// ```
    pub fn map_items<Mapped, F>(self, mut function: F) -> PagingState<Key, Mapped>
    where
        F: FnMut(Item) -> Mapped,
    {
        let pages = self.pages.map(|pages| {
            pages
                .into_iter()
                .map(|page| page.into_iter().map(&mut function).collect())
                .collect()
        });

        PagingState {
            pages,
            item_ids: self.item_ids,
            keys: self.keys,
            error: self.error,
            has_next_page: self.has_next_page,
            is_loading: self.is_loading,
        }
    }
}

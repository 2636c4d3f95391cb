//! Item-identity bookkeeping shared by page merges and manual insertion.
//!
//! The hasher backing [`ItemIdIndex`] follows the crate features:
//! `fxhash` selects `rustc-hash`, `ahash` selects `ahash`, otherwise the
//! standard library's SipHash is used. When both features are enabled,
//! `fxhash` wins.

use std::collections::HashSet;

use crate::error::PagingError;

#[cfg(feature = "fxhash")]
type IdHasher = rustc_hash::FxBuildHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
type IdHasher = ahash::RandomState;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
type IdHasher = std::collections::hash_map::RandomState;

/// Returns the per-page id lists for `pages`, deriving any page whose ids
/// are missing or no longer match the page length.
///
/// Pages spliced in from outside the controller often arrive without ids;
/// this is where they get them.
pub(crate) fn materialize_item_ids<Item>(
    pages: &[Vec<Item>],
    item_ids: Option<&[Vec<String>]>,
    item_id: impl Fn(&Item) -> String,
) -> Vec<Vec<String>> {
    pages
        .iter()
        .enumerate()
        .map(|(page_index, page)| {
            match item_ids.and_then(|item_ids| item_ids.get(page_index)) {
                Some(ids) if ids.len() == page.len() => ids.clone(),
                _ => page.iter().map(&item_id).collect(),
            }
        })
        .collect()
}

/// A lookup set over every id already present in a state.
pub(crate) struct ItemIdIndex<'a> {
    ids: HashSet<&'a str, IdHasher>,
}

impl<'a> ItemIdIndex<'a> {
    pub(crate) fn new(item_ids: &'a [Vec<String>]) -> Self {
        let mut ids = HashSet::with_hasher(IdHasher::default());
        ids.extend(item_ids.iter().flatten().map(String::as_str));
        Self { ids }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Checks that `batch` has no internal repeats and shares no id with the
    /// index. Reports the first offending id.
    pub(crate) fn check_batch(&self, batch: &[String]) -> Result<(), PagingError> {
        let mut seen: HashSet<&str, IdHasher> = HashSet::with_hasher(IdHasher::default());
        for id in batch {
            if self.contains(id) || !seen.insert(id.as_str()) {
                return Err(PagingError::DuplicateItemId { id: id.clone() });
            }
        }
        Ok(())
    }
}

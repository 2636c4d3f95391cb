//! Construction-time configuration for [`PagingController`].

use std::borrow::Cow;
use std::sync::Arc;

use super::PagingController;
use super::operation::OperationSlot;
use super::page_load::PageLoad;
use super::paging_controller::{ControllerInner, FetchPageFn, ItemIdFn, NextPageKeyFn};
use crate::observable::Observable;
use crate::state::PagingState;

const DEFAULT_LABEL: &str = "paging";

/// Builder for [`PagingController`].
///
/// The three callbacks are required and taken up front; everything else has
/// a default.
///
/// # Examples
///
/// ```rust
/// use pageloom::controller::PagingController;
/// use pageloom::state::PagingState;
///
/// let seeded: PagingState<u32, String> = PagingState::default()
///     .with_pages(Some(vec![vec!["cached".to_string()]]))
///     .with_keys(Some(vec![1]));
///
/// let controller = PagingController::builder(
///     |state: &PagingState<u32, String>| Some(state.last_key().map_or(1, |key| key + 1)),
///     |page: u32| vec![format!("item-{page}")],
///     |item: &String| item.clone(),
/// )
/// .initial_state(seeded)
/// .label("feed")
/// .build();
///
/// assert_eq!(controller.label(), "feed");
/// assert_eq!(controller.value().item_count(), 1);
/// ```
pub struct PagingControllerBuilder<Key, Item> {
    next_page_key: NextPageKeyFn<Key, Item>,
    fetch_page: FetchPageFn<Key, Item>,
    item_id: ItemIdFn<Item>,
    initial_state: PagingState<Key, Item>,
    label: Cow<'static, str>,
}

impl<Key, Item> PagingControllerBuilder<Key, Item>
where
    Key: 'static,
    Item: 'static,
{
    pub(crate) fn new<N, F, R, I>(next_page_key: N, fetch_page: F, item_id: I) -> Self
    where
        N: Fn(&PagingState<Key, Item>) -> Option<Key> + Send + Sync + 'static,
        F: Fn(Key) -> R + Send + Sync + 'static,
        R: Into<PageLoad<Item>> + 'static,
        I: Fn(&Item) -> String + Send + Sync + 'static,
    {
        Self {
            next_page_key: Box::new(next_page_key),
            fetch_page: Box::new(move |key: Key| -> PageLoad<Item> { fetch_page(key).into() }),
            item_id: Box::new(item_id),
            initial_state: PagingState::default(),
            label: Cow::Borrowed(DEFAULT_LABEL),
        }
    }
}

impl<Key, Item> PagingControllerBuilder<Key, Item> {
    /// Starts the controller from `state` instead of the empty state.
    #[must_use]
    pub fn initial_state(mut self, state: PagingState<Key, Item>) -> Self {
        self.initial_state = state;
        self
    }

    /// Names the controller in log events. Defaults to `"paging"`.
    #[must_use]
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Builds the controller.
    pub fn build(self) -> PagingController<Key, Item> {
        tracing::debug!(controller = %self.label, "paging controller created");
        PagingController {
            inner: Arc::new(ControllerInner {
                label: self.label,
                state: Observable::new(self.initial_state),
                operations: OperationSlot::new(),
                next_page_key: self.next_page_key,
                fetch_page: self.fetch_page,
                item_id: self.item_id,
            }),
        }
    }
}

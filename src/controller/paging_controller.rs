//! The paging controller and its fetch protocol.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::builder::PagingControllerBuilder;
use super::operation::{OperationSlot, OperationToken};
use super::page_load::PageLoad;
use crate::error::PagingError;
use crate::observable::{ListenerId, Observable};
use crate::state::{ItemIdIndex, PagingState, materialize_item_ids};

pub(crate) type NextPageKeyFn<Key, Item> =
    Box<dyn Fn(&PagingState<Key, Item>) -> Option<Key> + Send + Sync>;
pub(crate) type FetchPageFn<Key, Item> = Box<dyn Fn(Key) -> PageLoad<Item> + Send + Sync>;
pub(crate) type ItemIdFn<Item> = Box<dyn Fn(&Item) -> String + Send + Sync>;

/// Drives incremental page loading and publishes every state transition.
///
/// The controller owns one [`PagingState`] inside an [`Observable`]. Each
/// operation replaces that state with a new snapshot and notifies the
/// observers synchronously.
///
/// Three callbacks are injected at construction:
///
/// - `next_page_key` computes the key of the next page from the current
///   state, or `None` when the listing is exhausted
/// - `fetch_page` loads the page for a key, synchronously or asynchronously
///   (see [`PageLoad`])
/// - `item_id` returns the stable identity of an item
///
/// # Single flight
///
/// At most one fetch is owned by the controller at a time. While one is in
/// flight, further [`fetch_next_page`](Self::fetch_next_page) calls return
/// immediately without invoking any callback.
///
/// # Live merges
///
/// After the page arrives, the controller re-reads the *published* state
/// and merges into that, not into the snapshot it started from. Changes
/// made through [`set_value`](Self::set_value) while the fetch was suspended
/// therefore survive the merge.
///
/// # Cloning
///
/// `PagingController` is a handle: clones share the same state, observers
/// and in-flight operation.
///
/// # Examples
///
/// ```rust
/// use futures::executor::block_on;
/// use pageloom::controller::PagingController;
/// use pageloom::state::PagingState;
///
/// let controller = PagingController::new(
///     |state: &PagingState<u32, String>| match state.last_key() {
///         None => Some(1),
///         Some(&key) if key < 2 => Some(key + 1),
///         Some(_) => None,
///     },
///     |page: u32| vec![format!("{page}-a"), format!("{page}-b")],
///     |item: &String| item.clone(),
/// );
///
/// block_on(controller.fetch_next_page()).unwrap();
/// block_on(controller.fetch_next_page()).unwrap();
/// block_on(controller.fetch_next_page()).unwrap();
///
/// let state = controller.value();
/// assert_eq!(state.keys, Some(vec![1, 2]));
/// assert_eq!(state.item_count(), 4);
/// assert!(!state.has_next_page);
/// ```
pub struct PagingController<Key, Item> {
    pub(crate) inner: Arc<ControllerInner<Key, Item>>,
}

pub(crate) struct ControllerInner<Key, Item> {
    pub(crate) label: Cow<'static, str>,
    pub(crate) state: Observable<PagingState<Key, Item>>,
    pub(crate) operations: OperationSlot,
    pub(crate) next_page_key: NextPageKeyFn<Key, Item>,
    pub(crate) fetch_page: FetchPageFn<Key, Item>,
    pub(crate) item_id: ItemIdFn<Item>,
}

impl<Key, Item> PagingController<Key, Item>
where
    Key: 'static,
    Item: 'static,
{
    /// Creates a controller starting from the empty state.
    ///
    /// `fetch_page` may return anything convertible into a [`PageLoad`]:
    /// a `Vec<Item>`, a `Result<Vec<Item>, FetchFault>` or a
    /// [`PageLoad::pending`] future.
    pub fn new<N, F, R, I>(next_page_key: N, fetch_page: F, item_id: I) -> Self
    where
        N: Fn(&PagingState<Key, Item>) -> Option<Key> + Send + Sync + 'static,
        F: Fn(Key) -> R + Send + Sync + 'static,
        R: Into<PageLoad<Item>> + 'static,
        I: Fn(&Item) -> String + Send + Sync + 'static,
    {
        Self::builder(next_page_key, fetch_page, item_id).build()
    }

    /// Starts a [`PagingControllerBuilder`] for further configuration.
    pub fn builder<N, F, R, I>(
        next_page_key: N,
        fetch_page: F,
        item_id: I,
    ) -> PagingControllerBuilder<Key, Item>
    where
        N: Fn(&PagingState<Key, Item>) -> Option<Key> + Send + Sync + 'static,
        F: Fn(Key) -> R + Send + Sync + 'static,
        R: Into<PageLoad<Item>> + 'static,
        I: Fn(&Item) -> String + Send + Sync + 'static,
    {
        PagingControllerBuilder::new(next_page_key, fetch_page, item_id)
    }
}

impl<Key, Item> PagingController<Key, Item> {
    /// The label this controller carries in log events.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The currently published state.
    pub fn value(&self) -> Arc<PagingState<Key, Item>> {
        self.inner.state.get()
    }

    /// Replaces the published state from outside the controller.
    ///
    /// Intended for integrations and tests that splice in externally
    /// modified state. An in-flight fetch merges into whatever is published
    /// when its page arrives.
    pub fn set_value(&self, state: PagingState<Key, Item>) {
        self.inner.state.set(state);
    }

    /// The slot the controller publishes into.
    pub fn observable(&self) -> &Observable<PagingState<Key, Item>> {
        &self.inner.state
    }

    /// Registers an observer called after every state transition.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PagingState<Key, Item>) + Send + Sync + 'static,
    {
        self.inner.state.subscribe(listener)
    }

    /// Removes an observer.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.state.unsubscribe(id)
    }

    /// The token of the fetch currently owned by the controller, if any.
    ///
    /// Meant for extensions layered on top of the controller; regular
    /// callers should watch `is_loading` instead.
    pub fn current_operation(&self) -> Option<OperationToken> {
        self.inner.operations.current()
    }
}

impl<Key, Item> PagingController<Key, Item>
where
    Key: Clone,
    Item: Clone,
{
    /// Loads the next page and merges it into the published state.
    ///
    /// Returns `Ok(())` when the attempt finished, failed recoverably, was
    /// superseded by [`refresh`](Self::refresh) / [`cancel`](Self::cancel),
    /// or did not start because another fetch is in flight. Any error is
    /// also recorded in [`PagingState::error`]. Defect-class errors (a
    /// [`FetchFault::Defect`](crate::error::FetchFault::Defect) or a
    /// duplicate item id) are additionally returned after the state has been
    /// committed, leaving the controller ready for the next attempt.
    ///
    /// Dropping the returned future before it completes releases the fetch
    /// as if [`cancel`](Self::cancel) had been called.
    ///
    /// A successful page is merged into the state published when it
    /// arrives, so items inserted meanwhile are kept. A failed fetch instead
    /// records its error on the state read when the attempt started:
    /// insertions made while it was suspended are dropped with it.
    ///
    /// The `item_id` callback runs while the controller's transition lock
    /// is held, and must not wait on another thread that uses the
    /// controller.
    ///
    /// # Errors
    ///
    /// Returns the recorded error when it is not recoverable.
    pub async fn fetch_next_page(&self) -> Result<(), PagingError> {
        let Some(token) = self.begin_fetch() else {
            tracing::trace!(controller = %self.inner.label, "fetch already in flight, ignoring");
            return Ok(());
        };

        let mut abandon_guard = AbandonGuard {
            inner: &self.inner,
            token,
            armed: true,
        };

        let mut working = self.snapshot();
        let fetched = self.load_next_page(&mut working).await;

        abandon_guard.armed = false;
        self.inner.commit(token, working, fetched)
    }

    /// Discards every page and publishes the empty state.
    ///
    /// An in-flight fetch keeps running but its result is dropped.
    pub fn refresh(&self) {
        let current = self.inner.operations.lock();
        if let Some(token) = current.take() {
            tracing::debug!(controller = %self.inner.label, %token, "refresh superseded in-flight fetch");
        }
        tracing::debug!(controller = %self.inner.label, "refresh");
        self.inner.state.set(self.inner.state.get().reset());
    }

    /// Stops waiting for the in-flight fetch, keeping the loaded pages.
    ///
    /// Publishes the current state with `is_loading` cleared, so a
    /// subsequent [`fetch_next_page`](Self::fetch_next_page) starts a fresh
    /// attempt immediately.
    pub fn cancel(&self) {
        let current = self.inner.operations.lock();
        let cancelled = current.take();
        tracing::debug!(controller = %self.inner.label, token = ?cancelled, "cancel");
        self.inner.state.set(self.snapshot().with_loading(false));
    }

    /// Inserts `item` with identity `id` at flat position `index`.
    ///
    /// Positions count across all pages; `index == item_count()` appends to
    /// the last page, and on an empty state a single page holding the item
    /// is created. Ids of pages that were spliced in without them are
    /// derived with the `item_id` callback first.
    ///
    /// # Errors
    ///
    /// - [`PagingError::DuplicateItemId`] if `id` already exists
    /// - [`PagingError::IndexOutOfRange`] if `index > item_count()`
    ///
    /// The published state is left untouched on error.
    pub fn insert_item(
        &self,
        id: impl Into<String>,
        item: Item,
        index: usize,
    ) -> Result<(), PagingError> {
        let id = id.into();
        let _transition = self.inner.operations.lock();
        let mut state = self.snapshot();

        let mut item_ids = self.inner.materialize(&state);
        if ItemIdIndex::new(&item_ids).contains(&id) {
            return Err(PagingError::DuplicateItemId { id });
        }

        let len = state.item_count();
        if index > len {
            return Err(PagingError::IndexOutOfRange { index, len });
        }

        let mut pages = state.pages.take().unwrap_or_default();
        if pages.is_empty() {
            pages.push(vec![item]);
            item_ids = vec![vec![id.clone()]];
        } else {
            let (page_index, offset) = locate_insertion(&pages, index);
            pages[page_index].insert(offset, item);
            item_ids[page_index].insert(offset, id.clone());
        }

        tracing::debug!(controller = %self.inner.label, %id, index, "item inserted");
        self.inner
            .state
            .set(state.with_pages(Some(pages)).with_item_ids(Some(item_ids)));
        Ok(())
    }

    /// Replaces every item with `function(item)`, keeping ids and keys.
    ///
    /// The mapping must not change item identity.
    pub fn map_items<F>(&self, function: F)
    where
        F: FnMut(Item) -> Item,
    {
        let _transition = self.inner.operations.lock();
        self.inner.state.set(self.snapshot().map_items(function));
    }

    /// Releases the in-flight fetch and every observer.
    ///
    /// The state stays readable; an in-flight fetch will find its token
    /// stale and drop its result.
    pub fn dispose(&self) {
        let current = self.inner.operations.lock();
        current.set(None);
        self.inner.state.dispose();
        tracing::debug!(controller = %self.inner.label, "disposed");
    }

    fn snapshot(&self) -> PagingState<Key, Item> {
        PagingState::clone(&self.inner.state.get())
    }

    /// Claims the controller for a new fetch and publishes the loading
    /// state. Returns `None` if a fetch is already in flight.
    fn begin_fetch(&self) -> Option<OperationToken> {
        let current = self.inner.operations.lock();
        if current.get().is_some() {
            return None;
        }

        let token = self.inner.operations.next_token();
        current.set(Some(token));
        tracing::debug!(controller = %self.inner.label, %token, "fetch started");
        self.inner
            .state
            .set(self.snapshot().with_loading(true).with_error(None));
        Some(token)
    }

    /// Fetches the next page, if any. Returns `None` when the listing is
    /// exhausted, recording that on `working`.
    async fn load_next_page(
        &self,
        working: &mut PagingState<Key, Item>,
    ) -> Result<Option<FetchedPage<Key, Item>>, PagingError> {
        if !working.has_next_page {
            return Ok(None);
        }

        let Some(key) = (self.inner.next_page_key)(&*working) else {
            tracing::debug!(controller = %self.inner.label, "no next page key, listing exhausted");
            working.has_next_page = false;
            return Ok(None);
        };

        let items = (self.inner.fetch_page)(key.clone()).resolve().await?;
        Ok(Some((key, items)))
    }
}

type FetchedPage<Key, Item> = (Key, Vec<Item>);

impl<Key, Item> ControllerInner<Key, Item>
where
    Key: Clone,
    Item: Clone,
{
    fn materialize(&self, state: &PagingState<Key, Item>) -> Vec<Vec<String>> {
        materialize_item_ids(
            state.pages.as_deref().unwrap_or_default(),
            state.item_ids.as_deref(),
            |item: &Item| (self.item_id)(item),
        )
    }

    /// Appends a fetched page to `state`. Leaves `state` untouched if any id
    /// of the page collides.
    fn merge_page(
        &self,
        state: &mut PagingState<Key, Item>,
        key: Key,
        items: Vec<Item>,
    ) -> Result<(), PagingError> {
        let mut item_ids = self.materialize(state);
        let page_ids: Vec<String> = items.iter().map(|item| (self.item_id)(item)).collect();
        ItemIdIndex::new(&item_ids).check_batch(&page_ids)?;

        item_ids.push(page_ids);
        state.pages.get_or_insert_with(Vec::new).push(items);
        state.item_ids = Some(item_ids);
        state.keys.get_or_insert_with(Vec::new).push(key);
        Ok(())
    }

    /// Merges `fetched` and publishes the outcome of `token`'s attempt if it
    /// still owns the controller. Returns the error to escalate, if any.
    ///
    /// The re-read, merge and publish all happen under the transition lock,
    /// so no other transition can slip in between them.
    fn commit(
        &self,
        token: OperationToken,
        mut working: PagingState<Key, Item>,
        fetched: Result<Option<FetchedPage<Key, Item>>, PagingError>,
    ) -> Result<(), PagingError> {
        let current = self.operations.lock();
        let owned = current.get() == Some(token);

        let outcome = match fetched {
            Ok(Some((key, items))) if owned => {
                // The page may have been suspended for a long time; merge
                // into what is published now.
                working = PagingState::clone(&self.state.get());
                self.merge_page(&mut working, key, items)
            }
            Ok(_) => Ok(()),
            Err(error) => Err(error),
        };

        let escalated = match outcome {
            Ok(()) => None,
            Err(error) => {
                if error.is_recoverable() {
                    tracing::debug!(controller = %self.label, %token, %error, "page fetch failed");
                } else {
                    tracing::warn!(controller = %self.label, %token, %error, "page fetch failed with a defect");
                }
                let escalated = (!error.is_recoverable()).then(|| error.clone());
                working.error = Some(error);
                escalated
            }
        };

        if owned {
            tracing::debug!(
                controller = %self.label,
                %token,
                pages = working.page_count(),
                has_next_page = working.has_next_page,
                "fetch committed"
            );
            self.state.set(working.with_loading(false));
            current.set(None);
        } else {
            tracing::debug!(controller = %self.label, %token, "stale fetch result discarded");
        }

        escalated.map_or(Ok(()), Err)
    }
}

impl<Key, Item> ControllerInner<Key, Item> {
    /// Releases `token` when its future was dropped before committing.
    fn abandon(&self, token: OperationToken)
    where
        Key: Clone,
        Item: Clone,
    {
        let current = self.operations.lock();
        if current.get() != Some(token) {
            return;
        }

        current.set(None);
        tracing::debug!(controller = %self.label, %token, "fetch abandoned");
        if !std::thread::panicking() {
            self.state
                .set(PagingState::clone(&self.state.get()).with_loading(false));
        }
    }
}

/// Releases the fetch token if the fetch future is dropped mid-flight.
struct AbandonGuard<'a, Key, Item>
where
    Key: Clone,
    Item: Clone,
{
    inner: &'a ControllerInner<Key, Item>,
    token: OperationToken,
    armed: bool,
}

impl<Key, Item> Drop for AbandonGuard<'_, Key, Item>
where
    Key: Clone,
    Item: Clone,
{
    fn drop(&mut self) {
        if self.armed {
            self.inner.abandon(self.token);
        }
    }
}

/// Finds the page and intra-page offset for flat position `index`.
///
/// `pages` must not be empty and `index` must not exceed the item count.
fn locate_insertion<Item>(pages: &[Vec<Item>], index: usize) -> (usize, usize) {
    let mut offset = 0;
    for (page_index, page) in pages.iter().enumerate() {
        if index < offset + page.len() {
            return (page_index, index - offset);
        }
        offset += page.len();
    }

    let last = pages.len().saturating_sub(1);
    (last, pages.get(last).map_or(0, Vec::len))
}

impl<Key, Item> Clone for PagingController<Key, Item> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Key: fmt::Debug, Item: fmt::Debug> fmt::Debug for PagingController<Key, Item> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PagingController")
            .field("label", &self.inner.label)
            .field("state", &self.inner.state.get())
            .field("operation", &self.inner.operations.current())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(PagingController<u32, String>: Send, Sync, Clone);

//! Fire-and-forget fetches on the ambient tokio runtime.

use tokio::task::JoinHandle;

use super::PagingController;
use crate::error::PagingError;

impl<Key, Item> PagingController<Key, Item>
where
    Key: Clone + Send + Sync + 'static,
    Item: Clone + Send + Sync + 'static,
{
    /// Spawns [`fetch_next_page`](Self::fetch_next_page) onto the current
    /// tokio runtime.
    ///
    /// Useful from synchronous UI callbacks (a list scrolled near its end)
    /// that cannot await. The single-flight rule still applies: spawning
    /// while a fetch is in flight produces a task that completes at once.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like [`tokio::spawn`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pageloom::controller::PagingController;
    /// use pageloom::state::PagingState;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let controller = PagingController::new(
    ///     |state: &PagingState<u32, u32>| state.last_key().map_or(Some(1), |_| None),
    ///     |page: u32| vec![page * 10],
    ///     |item: &u32| item.to_string(),
    /// );
    ///
    /// controller.spawn_fetch_next_page().await.unwrap().unwrap();
    /// assert_eq!(controller.value().pages, Some(vec![vec![10]]));
    /// # }
    /// ```
    pub fn spawn_fetch_next_page(&self) -> JoinHandle<Result<(), PagingError>> {
        let controller = self.clone();
        tokio::spawn(async move { controller.fetch_next_page().await })
    }
}

//! The result of invoking a page fetch callback.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::FetchFault;

/// What a page fetch eventually yields.
pub type FetchResult<Item> = Result<Vec<Item>, FetchFault>;

/// A page that is either already available or still on its way.
///
/// Fetch callbacks may answer synchronously (cached pages, in-memory
/// sources) or asynchronously (network). The controller only suspends for
/// the `Pending` case.
///
/// Most callbacks do not need to build a `PageLoad` by hand: anything that
/// converts into one can be returned, such as `Vec<Item>`,
/// `Result<Vec<Item>, FetchFault>` or a boxed future.
///
/// # Examples
///
/// ```rust
/// use pageloom::controller::PageLoad;
/// use pageloom::error::FetchFault;
///
/// let ready: PageLoad<i32> = vec![1, 2, 3].into();
/// assert!(ready.is_ready());
///
/// let pending: PageLoad<i32> = PageLoad::pending(async { Ok(vec![4]) });
/// assert!(!pending.is_ready());
///
/// let failed: PageLoad<i32> = PageLoad::failed(FetchFault::message("offline"));
/// assert!(failed.is_ready());
/// ```
pub enum PageLoad<Item> {
    /// The result is available now.
    Ready(FetchResult<Item>),
    /// The result arrives when the future resolves.
    Pending(BoxFuture<'static, FetchResult<Item>>),
}

impl<Item> PageLoad<Item> {
    /// A successfully loaded page.
    pub const fn ready(items: Vec<Item>) -> Self {
        Self::Ready(Ok(items))
    }

    /// A page that failed synchronously.
    pub const fn failed(fault: FetchFault) -> Self {
        Self::Ready(Err(fault))
    }

    /// A page produced by `future`.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = FetchResult<Item>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// Returns `true` when no suspension is needed.
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Waits for the page. Completes on first poll for `Ready`.
    pub async fn resolve(self) -> FetchResult<Item> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.await,
        }
    }
}

impl<Item> From<Vec<Item>> for PageLoad<Item> {
    fn from(items: Vec<Item>) -> Self {
        Self::ready(items)
    }
}

impl<Item> From<FetchResult<Item>> for PageLoad<Item> {
    fn from(result: FetchResult<Item>) -> Self {
        Self::Ready(result)
    }
}

impl<Item> From<BoxFuture<'static, FetchResult<Item>>> for PageLoad<Item> {
    fn from(future: BoxFuture<'static, FetchResult<Item>>) -> Self {
        Self::Pending(future)
    }
}

impl<Item: fmt::Debug> fmt::Debug for PageLoad<Item> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => formatter.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => formatter.write_str("Pending(..)"),
        }
    }
}

//! Common test helpers for integration tests.
//!
//! This module provides a hand-driven fetch callback whose pages only arrive
//! when a test says so, plus small constructors for controllers and states.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate. Helpers used only by some test
//! files would otherwise generate dead code warnings in the others.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::channel::oneshot;
use pageloom::controller::{FetchResult, PageLoad, PagingController};
use pageloom::error::FetchFault;
use pageloom::state::PagingState;
use parking_lot::Mutex;

type PendingPage<Item> = (u32, oneshot::Sender<FetchResult<Item>>);

/// A fetch callback whose pages are resolved manually.
///
/// Every call records its key and returns a pending [`PageLoad`]; the page
/// arrives when the test calls [`complete`](Self::complete).
pub struct ManualFetcher<Item> {
    pending: Arc<Mutex<VecDeque<PendingPage<Item>>>>,
    calls: Arc<AtomicUsize>,
}

impl<Item: Send + 'static> ManualFetcher<Item> {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The callback to hand to the controller.
    pub fn callback(&self) -> impl Fn(u32) -> PageLoad<Item> + Send + Sync + 'static {
        let pending = Arc::clone(&self.pending);
        let calls = Arc::clone(&self.calls);
        move |key: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            let (sender, receiver) = oneshot::channel();
            pending.lock().push_back((key, sender));
            PageLoad::pending(async move {
                receiver
                    .await
                    .unwrap_or_else(|_| Err(FetchFault::message("fetch abandoned")))
            })
        }
    }

    /// Number of times the callback was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Keys of the fetches still waiting for a page.
    pub fn pending_keys(&self) -> Vec<u32> {
        self.pending.lock().iter().map(|(key, _)| *key).collect()
    }

    /// Resolves the oldest pending fetch and returns its key.
    pub fn complete(&self, result: FetchResult<Item>) -> u32 {
        let (key, sender) = self
            .pending
            .lock()
            .pop_front()
            .expect("no fetch is waiting for a page");
        // The fetch future may already be gone; that is fine.
        let _ = sender.send(result);
        key
    }
}

/// Key callback counting pages from 1.
pub fn next_numbered_key<Item>(state: &PagingState<u32, Item>) -> Option<u32> {
    Some(state.last_key().map_or(1, |key| key + 1))
}

/// A controller over string items whose id is the item itself.
pub fn manual_controller(fetcher: &ManualFetcher<String>) -> PagingController<u32, String> {
    PagingController::new(
        next_numbered_key::<String>,
        fetcher.callback(),
        |item: &String| item.clone(),
    )
}

/// A controller whose fetch answers synchronously with `"{page}a"`, `"{page}b"`.
pub fn synchronous_controller() -> PagingController<u32, String> {
    PagingController::new(
        next_numbered_key::<String>,
        |page: u32| vec![format!("{page}a"), format!("{page}b")],
        |item: &String| item.clone(),
    )
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// A state holding `pages`, with ids equal to the items and keys `1..`.
pub fn loaded_state(pages: &[&[&str]]) -> PagingState<u32, String> {
    let pages: Vec<Vec<String>> = pages.iter().map(|page| strings(page)).collect();
    let keys = (1..).take(pages.len()).collect();
    PagingState::default()
        .with_item_ids(Some(pages.clone()))
        .with_pages(Some(pages))
        .with_keys(Some(keys))
}

//! Fetch protocol tests: single flight, key exhaustion, merging, duplicate
//! detection and fault classification.

mod common;

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{
    ManualFetcher, loaded_state, manual_controller, next_numbered_key, strings,
    synchronous_controller,
};
use futures::poll;
use pageloom::controller::PagingController;
use pageloom::error::{FetchFault, PagingError};
use pageloom::state::{PagingState, PagingStatus};
use parking_lot::Mutex;
use rstest::rstest;

// =============================================================================
// Successful Fetches
// =============================================================================

#[rstest]
#[tokio::test]
async fn fetch_on_empty_state_appends_first_page() {
    let controller = synchronous_controller();

    controller.fetch_next_page().await.unwrap();

    let state = controller.value();
    assert_eq!(state.pages, Some(vec![strings(&["1a", "1b"])]));
    assert_eq!(state.item_ids, Some(vec![strings(&["1a", "1b"])]));
    assert_eq!(state.keys, Some(vec![1]));
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert!(controller.current_operation().is_none());
}

#[rstest]
#[tokio::test]
async fn consecutive_fetches_append_pages_in_order() {
    let controller = synchronous_controller();

    for _ in 0..3 {
        controller.fetch_next_page().await.unwrap();
    }

    let state = controller.value();
    assert_eq!(state.keys, Some(vec![1, 2, 3]));
    assert_eq!(
        state.items().cloned().collect::<Vec<_>>(),
        strings(&["1a", "1b", "2a", "2b", "3a", "3b"])
    );
    assert!(state.is_consistent());
}

#[rstest]
#[tokio::test]
async fn fetch_publishes_loading_then_result() {
    let controller = synchronous_controller();
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);
    controller.subscribe(move |state: &PagingState<u32, String>| {
        events_clone
            .lock()
            .push((state.is_loading, state.page_count()));
    });

    controller.fetch_next_page().await.unwrap();

    assert_eq!(*events.lock(), vec![(true, 0), (false, 1)]);
}

// =============================================================================
// Single Flight
// =============================================================================

#[rstest]
#[tokio::test]
async fn overlapping_fetches_dispatch_once() {
    let fetcher = ManualFetcher::new();
    let controller = manual_controller(&fetcher);

    let mut first = pin!(controller.fetch_next_page());
    assert!(poll!(first.as_mut()).is_pending());
    assert!(controller.value().is_loading);
    let token = controller.current_operation();
    assert!(token.is_some());

    for _ in 0..3 {
        controller.fetch_next_page().await.unwrap();
    }
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(controller.current_operation(), token);

    fetcher.complete(Ok(strings(&["1a"])));
    first.await.unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(controller.value().page_count(), 1);
    assert!(controller.current_operation().is_none());
}

#[rstest]
#[tokio::test]
async fn fetch_after_commit_starts_new_attempt() {
    let fetcher = ManualFetcher::new();
    let controller = manual_controller(&fetcher);

    let mut first = pin!(controller.fetch_next_page());
    assert!(poll!(first.as_mut()).is_pending());
    fetcher.complete(Ok(strings(&["1a"])));
    first.await.unwrap();

    let mut second = pin!(controller.fetch_next_page());
    assert!(poll!(second.as_mut()).is_pending());
    assert_eq!(fetcher.pending_keys(), vec![2]);
    fetcher.complete(Ok(strings(&["2a"])));
    second.await.unwrap();

    assert_eq!(controller.value().keys, Some(vec![1, 2]));
}

// =============================================================================
// End of Listing
// =============================================================================

#[rstest]
#[tokio::test]
async fn missing_next_key_marks_listing_exhausted() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let fetches_clone = Arc::clone(&fetches);
    let controller = PagingController::new(
        |_: &PagingState<u32, String>| None,
        move |_: u32| {
            fetches_clone.fetch_add(1, Ordering::SeqCst);
            Vec::<String>::new()
        },
        |item: &String| item.clone(),
    );

    controller.fetch_next_page().await.unwrap();

    let state = controller.value();
    assert!(!state.has_next_page);
    assert!(!state.is_loading);
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert_eq!(state.status(), PagingStatus::NoItemsFound);
}

#[rstest]
#[tokio::test]
async fn exhausted_listing_invokes_no_callback() {
    let key_calls = Arc::new(AtomicUsize::new(0));
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let key_calls_clone = Arc::clone(&key_calls);
    let fetch_calls_clone = Arc::clone(&fetch_calls);
    let controller = PagingController::builder(
        move |state: &PagingState<u32, String>| {
            key_calls_clone.fetch_add(1, Ordering::SeqCst);
            next_numbered_key(state)
        },
        move |_: u32| {
            fetch_calls_clone.fetch_add(1, Ordering::SeqCst);
            Vec::<String>::new()
        },
        |item: &String| item.clone(),
    )
    .initial_state(loaded_state(&[&["a"]]).with_has_next_page(false))
    .build();

    controller.fetch_next_page().await.unwrap();

    assert_eq!(key_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    let state = controller.value();
    assert!(!state.is_loading);
    assert_eq!(state.page_count(), 1);
    assert_eq!(state.status(), PagingStatus::Completed);
}

// =============================================================================
// Duplicate Identifiers
// =============================================================================

#[rstest]
#[tokio::test]
async fn duplicate_ids_within_batch_are_rejected() {
    let controller = PagingController::new(
        next_numbered_key::<String>,
        |_: u32| strings(&["Dup", "Dup"]),
        |item: &String| item.clone(),
    );

    let result = controller.fetch_next_page().await;

    let expected = PagingError::DuplicateItemId {
        id: "Dup".to_string(),
    };
    assert_eq!(result, Err(expected.clone()));
    let state = controller.value();
    assert!(state.pages.is_none());
    assert!(state.keys.is_none());
    assert_eq!(state.error, Some(expected));
    assert!(!state.is_loading);
    assert!(controller.current_operation().is_none());
}

#[rstest]
#[tokio::test]
async fn duplicate_ids_across_batches_are_rejected() {
    let controller = PagingController::new(
        next_numbered_key::<String>,
        |page: u32| {
            if page == 1 {
                strings(&["a", "b"])
            } else {
                strings(&["c", "a"])
            }
        },
        |item: &String| item.clone(),
    );

    controller.fetch_next_page().await.unwrap();
    let result = controller.fetch_next_page().await;

    assert_eq!(
        result,
        Err(PagingError::DuplicateItemId { id: "a".to_string() })
    );
    let state = controller.value();
    assert_eq!(state.pages, Some(vec![strings(&["a", "b"])]));
    assert_eq!(state.keys, Some(vec![1]));
    assert!(state.is_consistent());
}

// =============================================================================
// Fault Classification
// =============================================================================

#[rstest]
#[tokio::test]
async fn recoverable_fault_is_recorded_not_returned() {
    let controller = PagingController::new(
        next_numbered_key::<String>,
        |_: u32| Err::<Vec<String>, _>(FetchFault::message("offline")),
        |item: &String| item.clone(),
    );

    let result = controller.fetch_next_page().await;

    assert_eq!(result, Ok(()));
    let state = controller.value();
    assert_eq!(
        state.error,
        Some(PagingError::Fetch(FetchFault::message("offline")))
    );
    assert!(!state.is_loading);
    assert_eq!(state.status(), PagingStatus::FirstPageError);
    assert!(controller.current_operation().is_none());
}

#[rstest]
#[tokio::test]
async fn defect_fault_is_recorded_and_returned() {
    let controller = PagingController::new(
        next_numbered_key::<String>,
        |_: u32| Err::<Vec<String>, _>(FetchFault::defect_message("negative page size")),
        |item: &String| item.clone(),
    );

    let result = controller.fetch_next_page().await;

    let expected = PagingError::Fetch(FetchFault::defect_message("negative page size"));
    assert_eq!(result, Err(expected.clone()));
    let state = controller.value();
    assert_eq!(state.error, Some(expected));
    assert!(!state.is_loading);
    assert!(controller.current_operation().is_none());
}

#[rstest]
#[tokio::test]
async fn next_attempt_clears_previous_error() {
    let fetcher = ManualFetcher::new();
    let controller = manual_controller(&fetcher);

    let mut failing = pin!(controller.fetch_next_page());
    assert!(poll!(failing.as_mut()).is_pending());
    fetcher.complete(Err(FetchFault::message("timeout")));
    failing.await.unwrap();
    assert!(controller.value().error.is_some());

    let mut retry = pin!(controller.fetch_next_page());
    assert!(poll!(retry.as_mut()).is_pending());
    let state = controller.value();
    assert!(state.error.is_none());
    assert!(state.is_loading);

    fetcher.complete(Ok(strings(&["1a"])));
    retry.await.unwrap();
    assert_eq!(controller.value().status(), PagingStatus::Ongoing);
}

#[rstest]
#[tokio::test]
async fn failure_after_first_page_keeps_loaded_pages() {
    let fetcher = ManualFetcher::new();
    let controller = manual_controller(&fetcher);

    let mut first = pin!(controller.fetch_next_page());
    assert!(poll!(first.as_mut()).is_pending());
    fetcher.complete(Ok(strings(&["1a", "1b"])));
    first.await.unwrap();

    let mut second = pin!(controller.fetch_next_page());
    assert!(poll!(second.as_mut()).is_pending());
    fetcher.complete(Err(FetchFault::message("server error")));
    second.await.unwrap();

    let state = controller.value();
    assert_eq!(state.pages, Some(vec![strings(&["1a", "1b"])]));
    assert_eq!(state.status(), PagingStatus::SubsequentPageError);
}

// =============================================================================
// Live Merge
// =============================================================================

#[rstest]
#[tokio::test]
async fn external_mutation_during_fetch_survives_merge() {
    let fetcher = ManualFetcher::new();
    let controller = manual_controller(&fetcher);

    let mut fetch = pin!(controller.fetch_next_page());
    assert!(poll!(fetch.as_mut()).is_pending());

    let spliced = PagingState::clone(&controller.value())
        .with_pages(Some(vec![strings(&["external"])]))
        .with_keys(Some(vec![0]));
    controller.set_value(spliced);

    assert_eq!(fetcher.complete(Ok(strings(&["1a"]))), 1);
    fetch.await.unwrap();

    let state = controller.value();
    assert_eq!(
        state.pages,
        Some(vec![strings(&["external"]), strings(&["1a"])])
    );
    assert_eq!(
        state.item_ids,
        Some(vec![strings(&["external"]), strings(&["1a"])])
    );
    assert_eq!(state.keys, Some(vec![0, 1]));
    assert!(!state.is_loading);
}

#[rstest]
#[tokio::test]
async fn fetched_id_colliding_with_external_item_is_rejected() {
    let fetcher = ManualFetcher::new();
    let controller = manual_controller(&fetcher);

    let mut fetch = pin!(controller.fetch_next_page());
    assert!(poll!(fetch.as_mut()).is_pending());
    controller.set_value(
        PagingState::clone(&controller.value()).with_pages(Some(vec![strings(&["1a"])])),
    );

    fetcher.complete(Ok(strings(&["1a", "1b"])));
    let result = fetch.await;

    assert_eq!(
        result,
        Err(PagingError::DuplicateItemId {
            id: "1a".to_string()
        })
    );
    let state = controller.value();
    assert_eq!(state.pages, Some(vec![strings(&["1a"])]));
    assert!(!state.is_loading);
}

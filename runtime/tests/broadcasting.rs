//! Integration tests for Store action broadcasting
//!
//! Tests the request/response waiting the facade is built on: a command is
//! sent, its effect settles, and the caller picks out its own result by
//! correlation id.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use marketplace_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use marketplace_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum CatalogAction {
    /// Start a fetch with a correlation id
    Fetch { request: u64, delay_ms: u64 },
    /// Fetch succeeded (terminal action)
    Fetched { request: u64, items: Vec<String> },
    /// Fetch failed (terminal action)
    Failed { request: u64, message: String },
    /// Record a page view
    Visit,
    /// Result of `Visit`
    Visited { value: u32 },
}

#[derive(Debug, Clone, Default)]
struct Catalog {
    visits: u32,
    items: Vec<String>,
    loading: bool,
}

struct Offline;

struct CatalogReducer;

impl Reducer for CatalogReducer {
    type State = Catalog;
    type Action = CatalogAction;
    type Environment = Offline;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CatalogAction::Fetch { request, delay_ms } => {
                state.loading = true;
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Some(CatalogAction::Fetched {
                        request,
                        items: vec![format!("product-{request}")],
                    })
                }))]
            },
            CatalogAction::Fetched { items, .. } => {
                state.loading = false;
                state.items = items;
                smallvec![Effect::None]
            },
            CatalogAction::Failed { .. } => {
                state.loading = false;
                smallvec![Effect::None]
            },
            CatalogAction::Visit => {
                state.visits += 1;
                let value = state.visits;
                smallvec![Effect::Future(Box::pin(async move {
                    Some(CatalogAction::Visited { value })
                }))]
            },
            CatalogAction::Visited { .. } => smallvec![Effect::None],
        }
    }
}

fn store() -> Store<Catalog, CatalogAction, Offline, CatalogReducer> {
    Store::new(Catalog::default(), CatalogReducer, Offline)
}

fn settles(request: u64) -> impl Fn(&CatalogAction) -> bool {
    move |action| {
        matches!(
            action,
            CatalogAction::Fetched { request: id, .. } | CatalogAction::Failed { request: id, .. }
                if *id == request
        )
    }
}

#[tokio::test]
async fn waits_for_immediate_result() {
    let store = store();

    let result = store
        .send_and_wait_for(
            CatalogAction::Visit,
            |action| matches!(action, CatalogAction::Visited { .. }),
            Duration::from_secs(1),
        )
        .await;

    tokio_test::assert_ok!(&result);
    assert_eq!(result.unwrap(), CatalogAction::Visited { value: 1 });
}

/// The matched action has already been reduced when the wait returns
#[tokio::test]
async fn state_is_reduced_before_wait_returns() {
    let store = store();

    let result = store
        .send_and_wait_for(
            CatalogAction::Fetch {
                request: 7,
                delay_ms: 5,
            },
            settles(7),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert!(matches!(result, CatalogAction::Fetched { request: 7, .. }));
    let (loading, items) = store.state(|s| (s.loading, s.items.clone())).await;
    assert!(!loading);
    assert_eq!(items, vec!["product-7".to_string()]);
}

#[tokio::test]
async fn wait_times_out_on_slow_response() {
    let store = store();

    let result = store
        .send_and_wait_for(
            CatalogAction::Fetch {
                request: 99,
                delay_ms: 200,
            },
            settles(99),
            Duration::from_millis(20),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test]
async fn wait_is_refused_after_shutdown() {
    let store = store();
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let result = store
        .send_and_wait_for(CatalogAction::Visit, |_| true, Duration::from_secs(1))
        .await;

    assert_eq!(result, Err(StoreError::ShutdownInProgress));
}

/// Concurrent callers each receive their own result, even when responses
/// arrive in a different order than the requests were sent
#[tokio::test]
async fn callers_receive_their_own_response() {
    let store = Arc::new(store());

    let slow = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    CatalogAction::Fetch {
                        request: 1,
                        delay_ms: 40,
                    },
                    settles(1),
                    Duration::from_secs(1),
                )
                .await
        })
    };
    let fast = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    CatalogAction::Fetch {
                        request: 2,
                        delay_ms: 5,
                    },
                    settles(2),
                    Duration::from_secs(1),
                )
                .await
        })
    };

    let slow = slow.await.expect("task 1 panicked").unwrap();
    let fast = fast.await.expect("task 2 panicked").unwrap();

    assert_eq!(
        slow,
        CatalogAction::Fetched {
            request: 1,
            items: vec!["product-1".to_string()]
        }
    );
    assert_eq!(
        fast,
        CatalogAction::Fetched {
            request: 2,
            items: vec!["product-2".to_string()]
        }
    );
}

#[tokio::test]
async fn observers_see_settled_actions() {
    let store = Arc::new(store());
    let mut rx = store.subscribe_actions();

    let received = Arc::new(Mutex::new(Vec::new()));
    let collector = {
        let received = Arc::clone(&received);
        tokio::spawn(async move {
            while received.lock().await.len() < 2 {
                if let Ok(action) = rx.recv().await {
                    received.lock().await.push(action);
                }
            }
        })
    };

    store.send(CatalogAction::Visit).await.unwrap();
    store.send(CatalogAction::Visit).await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), collector)
        .await
        .expect("collector timed out")
        .unwrap();

    let mut values: Vec<u32> = received
        .lock()
        .await
        .iter()
        .filter_map(|action| match action {
            CatalogAction::Visited { value } => Some(*value),
            _ => None,
        })
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2]);
}

/// Initial actions passed to `send` are not broadcast
#[tokio::test]
async fn commands_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(CatalogAction::Visit).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(rx.recv().await.unwrap(), CatalogAction::Visited { value: 1 });
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn slow_observer_lags() {
    let store = Store::with_broadcast_capacity(
        Catalog::default(),
        CatalogReducer,
        Offline,
        4,
    );
    let mut rx = store.subscribe_actions();

    let mut handles = Vec::new();
    for _ in 0..20 {
        handles.push(store.send(CatalogAction::Visit).await.unwrap());
    }
    for mut handle in handles {
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();
    }

    let mut received = 0;
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => lagged = true,
            Err(_) => break,
        }
    }

    assert!(lagged, "expected subscriber to lag");
    assert!(received > 0);
    assert!(received < 20);
}

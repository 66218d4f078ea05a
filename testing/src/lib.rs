//! # Marketplace Testing
//!
//! Testing utilities for the marketplace client state layer.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (`FixedClock`, `MockApi`)
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Effect helpers that resolve effects without a running store
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_testing::{MockApi, test_clock};
//!
//! #[tokio::test]
//! async fn fetch_cart() {
//!     let api = Arc::new(MockApi::new());
//!     api.respond_ok(Method::Get, "/buyer/cart", json!({"data": []}));
//!
//!     let marketplace = Marketplace::new(environment_with(api.clone()));
//!     marketplace.cart().fetch_cart().await?;
//!     assert_eq!(api.request_count(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use marketplace_core::environment::Clock;

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions, effects};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use marketplace_core::environment::{ApiClient, ApiFuture};
    use marketplace_core::http::{ApiError, ApiRequest, Method};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use marketplace_testing::mocks::FixedClock;
    /// use marketplace_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never happens.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    #[derive(Debug, Clone)]
    struct Scripted {
        delay: Duration,
        result: Result<Value, ApiError>,
    }

    #[derive(Debug, Default)]
    struct Script {
        responses: HashMap<(Method, String), VecDeque<Scripted>>,
        requests: Vec<ApiRequest>,
    }

    /// Scripted stand-in for the HTTP wrapper
    ///
    /// Responses are queued per method and path and handed out in order.
    /// The last response for a route is reused once the queue is down to it.
    /// Unscripted routes fail with [`ApiError::Network`]. Every executed
    /// request is recorded.
    #[derive(Debug, Default)]
    pub struct MockApi {
        script: Mutex<Script>,
    }

    impl MockApi {
        /// Create a mock with nothing scripted
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a raw result for a route
        pub fn respond(&self, method: Method, path: &str, result: Result<Value, ApiError>) {
            self.respond_after(method, path, Duration::ZERO, result);
        }

        /// Queue a result that is delivered after `delay`
        pub fn respond_after(
            &self,
            method: Method,
            path: &str,
            delay: Duration,
            result: Result<Value, ApiError>,
        ) {
            self.lock()
                .responses
                .entry((method, path.to_string()))
                .or_default()
                .push_back(Scripted { delay, result });
        }

        /// Queue a 2xx response body
        pub fn respond_ok(&self, method: Method, path: &str, body: Value) {
            self.respond(method, path, Ok(body));
        }

        /// Queue a non-2xx response
        pub fn respond_status(&self, method: Method, path: &str, status: u16, body: Value) {
            self.respond(method, path, Err(ApiError::Status { status, body }));
        }

        /// Every request executed so far, in order
        #[must_use]
        pub fn requests(&self) -> Vec<ApiRequest> {
            self.lock().requests.clone()
        }

        /// Number of requests executed so far
        #[must_use]
        pub fn request_count(&self) -> usize {
            self.lock().requests.len()
        }

        /// The most recent request
        #[must_use]
        pub fn last_request(&self) -> Option<ApiRequest> {
            self.lock().requests.last().cloned()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
            self.script.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn next_response(&self, request: &ApiRequest) -> Scripted {
            let mut script = self.lock();
            script.requests.push(request.clone());

            let key = (request.method, request.path.clone());
            let scripted = match script.responses.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            };
            scripted.unwrap_or_else(|| Scripted {
                delay: Duration::ZERO,
                result: Err(ApiError::Network(format!("no response scripted for {request}"))),
            })
        }
    }

    impl ApiClient for MockApi {
        fn execute(&self, request: ApiRequest) -> ApiFuture<'_> {
            let scripted = self.next_response(&request);
            Box::pin(async move {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.result
            })
        }
    }
}

pub use mocks::{FixedClock, MockApi, test_clock};

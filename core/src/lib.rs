//! # Marketplace Core
//!
//! Core traits and types for the marketplace client state layer.
//!
//! The client keeps all server-derived data in a single store made of
//! per-domain slices. Every remote operation follows the same contract:
//! a command marks the slice as loading and describes one HTTP request as an
//! [`Effect`](effect::Effect); the request settles into a fulfilled or
//! rejected event that the slice reducer merges into its state.
//!
//! ## Core Concepts
//!
//! - **State**: one slice record per resource domain (collections, detail, status)
//! - **Action**: commands (request started) and settled events (fulfilled / rejected)
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: description of the HTTP call, executed by the runtime
//! - **Environment**: injected API client, session storage and clock
//!
//! ## Example
//!
//! ```ignore
//! use marketplace_core::*;
//!
//! impl Reducer for CartReducer {
//!     type State = CartState;
//!     type Action = CartAction;
//!     type Environment = MarketplaceEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CartState,
//!         action: CartAction,
//!         env: &MarketplaceEnvironment,
//!     ) -> SmallVec<[Effect<CartAction>; 4]> {
//!         match action {
//!             CartAction::FetchCart { request } => {
//!                 state.status.begin(&FETCH_CART, request);
//!                 smallvec![remote(env, request, ApiRequest::get("/buyer/cart"), CartAction::CartFetched)]
//!             }
//!             CartAction::CartFetched(settled) => {
//!                 settled.apply(&mut state.status, &FETCH_CART, env.settlement(), |items| {
//!                     merge::replace(&mut state.cart, items);
//!                 });
//!                 SmallVec::new()
//!             }
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer composition utilities
pub mod composition;

/// Declarative macros for building effects
pub mod effect_macros;

/// HTTP request/response vocabulary shared by the API client and the slices
pub mod http;

/// Collection merge strategies used when a request is fulfilled
pub mod merge;

/// Per-slice request lifecycle bookkeeping
pub mod slice;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never perform I/O themselves; remote calls are returned as effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for slice logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The slice state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions for the
        /// runtime to execute. Must not block or perform I/O.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (alert auto-dismiss timers)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation, typically one HTTP request
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns true for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Lift an effect into a parent action type
        ///
        /// Used when a slice reducer is embedded in the root reducer: every
        /// action the child effect eventually produces is wrapped with `f`.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Clone + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => {
                    Effect::Parallel(effects.into_iter().map(|e| e.map(f.clone())).collect())
                },
                Effect::Sequential(effects) => {
                    Effect::Sequential(effects.into_iter().map(|e| e.map(f.clone())).collect())
                },
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies (time, the remote API, session persistence) are
/// abstracted behind traits and injected via the Environment parameter.
pub mod environment {
    use crate::http::{ApiError, ApiRequest};
    use chrono::{DateTime, Utc};
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::{PoisonError, RwLock};
    use thiserror::Error;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Future returned by [`ApiClient::execute`]
    pub type ApiFuture<'a> = BoxFuture<'a, Result<serde_json::Value, ApiError>>;

    /// The HTTP wrapper seam
    ///
    /// Implementations perform exactly one request, attach the bearer token
    /// for authenticated requests, and resolve to the parsed JSON body of a
    /// 2xx response. Non-2xx responses become [`ApiError::Status`].
    pub trait ApiClient: Send + Sync {
        /// Execute a request against the remote API
        fn execute(&self, request: ApiRequest) -> ApiFuture<'_>;
    }

    /// Errors raised by session storage backends
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum SessionError {
        /// The backing medium could not be read or written
        #[error("Session storage I/O failed: {0}")]
        Io(String),

        /// A stored value could not be encoded or decoded
        #[error("Session value could not be serialized: {0}")]
        Serialization(String),
    }

    /// Key/value session store
    ///
    /// Holds the cached user profile and the access token between requests.
    /// Written on sign-in, read by every authenticated request, cleared on logout.
    pub trait SessionStorage: Send + Sync {
        /// Read a value
        fn get(&self, key: &str) -> Option<String>;

        /// Write a value, replacing any previous one
        ///
        /// # Errors
        ///
        /// Returns [`SessionError`] if the backend cannot persist the value.
        fn set(&self, key: &str, value: String) -> Result<(), SessionError>;

        /// Remove a value
        ///
        /// # Errors
        ///
        /// Returns [`SessionError`] if the backend cannot persist the removal.
        fn remove(&self, key: &str) -> Result<(), SessionError>;

        /// Remove every value
        ///
        /// # Errors
        ///
        /// Returns [`SessionError`] if the backend cannot persist the change.
        fn clear(&self) -> Result<(), SessionError>;

        /// Write several values so that either all of them are stored or none
        ///
        /// The provided implementation writes them one at a time and puts the
        /// earlier keys back when a later write fails. Backends that can
        /// persist a batch in one step should override it.
        ///
        /// # Errors
        ///
        /// Returns the [`SessionError`] of the write that failed.
        fn set_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError> {
            let previous: Vec<(&str, Option<String>)> =
                entries.iter().map(|(key, _)| (*key, self.get(key))).collect();

            for (written, (key, value)) in entries.iter().enumerate() {
                if let Err(error) = self.set(key, value.clone()) {
                    for (key, old) in previous.iter().take(written).rev() {
                        // The failed write is the error reported to the caller
                        let _ = match old {
                            Some(old) => self.set(key, old.clone()),
                            None => self.remove(key),
                        };
                    }
                    return Err(error);
                }
            }
            Ok(())
        }
    }

    /// In-process session storage, lost when the process exits
    #[derive(Debug, Default)]
    pub struct MemorySessionStorage {
        entries: RwLock<HashMap<String, String>>,
    }

    impl MemorySessionStorage {
        /// Create an empty session
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of stored keys
        #[must_use]
        pub fn len(&self) -> usize {
            self.entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether the session holds no keys
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl SessionStorage for MemorySessionStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        }

        fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_string(), value);
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), SessionError> {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(key);
            Ok(())
        }

        fn set_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError> {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(entries.iter().map(|(key, value)| ((*key).to_string(), value.clone())));
            Ok(())
        }

        fn clear(&self) -> Result<(), SessionError> {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{MemorySessionStorage, SessionStorage};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Child {
        Loaded(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[tokio::test]
    async fn map_wraps_future_output() {
        let effect: Effect<Child> = Effect::Future(Box::pin(async { Some(Child::Loaded(3)) }));
        let Effect::Future(fut) = effect.map(Parent::Child) else {
            unreachable!("map keeps the variant");
        };
        assert_eq!(fut.await, Some(Parent::Child(Child::Loaded(3))));
    }

    #[test]
    fn map_wraps_delayed_action() {
        let effect = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(Child::Loaded(1)),
        };
        match effect.map(Parent::Child) {
            Effect::Delay { duration, action } => {
                assert_eq!(duration, Duration::from_millis(5));
                assert_eq!(*action, Parent::Child(Child::Loaded(1)));
            },
            other => unreachable!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn map_recurses_into_parallel() {
        let effect: Effect<Child> = Effect::merge(vec![Effect::None, Effect::None]);
        let Effect::Parallel(effects) = effect.map(Parent::Child) else {
            unreachable!("map keeps the variant");
        };
        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(Effect::is_none));
    }

    #[test]
    fn memory_session_roundtrip() -> Result<(), super::environment::SessionError> {
        let session = MemorySessionStorage::new();
        assert!(session.is_empty());

        session.set("access_token", "abc".to_string())?;
        assert_eq!(session.get("access_token").as_deref(), Some("abc"));

        session.remove("access_token")?;
        assert_eq!(session.get("access_token"), None);

        session.set("user", "{}".to_string())?;
        session.clear()?;
        assert!(session.is_empty());
        Ok(())
    }

    /// Storage that refuses writes to one key
    struct RefusingKey {
        inner: MemorySessionStorage,
        refused: &'static str,
    }

    impl SessionStorage for RefusingKey {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> Result<(), super::environment::SessionError> {
            if key == self.refused {
                return Err(super::environment::SessionError::Io("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), super::environment::SessionError> {
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<(), super::environment::SessionError> {
            self.inner.clear()
        }
    }

    #[test]
    fn set_many_restores_earlier_keys_when_a_write_fails() {
        let session = RefusingKey {
            inner: MemorySessionStorage::new(),
            refused: "access_token",
        };
        session.inner.set("user", "old".to_string()).ok();

        let result = session.set_many(&[
            ("user", "new".to_string()),
            ("theme", "dark".to_string()),
            ("access_token", "tok".to_string()),
        ]);

        assert!(result.is_err());
        assert_eq!(session.get("user").as_deref(), Some("old"));
        assert_eq!(session.get("theme"), None);
        assert_eq!(session.get("access_token"), None);
    }

    #[test]
    fn memory_set_many_writes_every_key() -> Result<(), super::environment::SessionError> {
        let session = MemorySessionStorage::new();
        session.set_many(&[("user", "{}".to_string()), ("access_token", "t".to_string())])?;
        assert_eq!(session.len(), 2);
        Ok(())
    }
}

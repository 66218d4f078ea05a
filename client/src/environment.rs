//! Injected dependencies of every slice reducer, plus the helpers that turn
//! an [`ApiRequest`] into the effect that settles it

use marketplace_core::effect::Effect;
use marketplace_core::{async_effect, delay};
use marketplace_core::environment::{ApiClient, Clock, SessionStorage, SystemClock};
use marketplace_core::http::{ApiError, ApiRequest, Envelope, Failure, decode_response};
use marketplace_core::slice::{RequestId, Settled, Settlement, StalePolicy};
use crate::session::SessionGuard;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::Arc;
use std::time::Duration;

/// Environment shared by the root reducer and every slice
#[derive(Clone)]
pub struct MarketplaceEnvironment {
    /// Remote API
    pub api: Arc<dyn ApiClient>,
    /// Session storage (cached user, access token)
    pub session: Arc<dyn SessionStorage>,
    /// Orders response-driven session writes against logout
    pub session_guard: Arc<SessionGuard>,
    /// Time source for `fetched_at`
    pub clock: Arc<dyn Clock>,
    /// How superseded responses are treated
    pub stale_policy: StalePolicy,
    /// When set, every settled transition schedules a `ClearAlert` after this delay
    pub alert_dismiss: Option<Duration>,
}

impl MarketplaceEnvironment {
    /// Create an environment with the system clock, the default stale
    /// policy and no alert auto-dismiss
    #[must_use]
    pub fn new(api: Arc<dyn ApiClient>, session: Arc<dyn SessionStorage>) -> Self {
        Self {
            api,
            session,
            session_guard: Arc::new(SessionGuard::new()),
            clock: Arc::new(SystemClock),
            stale_policy: StalePolicy::default(),
            alert_dismiss: None,
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the stale policy
    #[must_use]
    pub const fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// Enable or disable alert auto-dismiss
    #[must_use]
    pub const fn with_alert_dismiss(mut self, delay: Option<Duration>) -> Self {
        self.alert_dismiss = delay;
        self
    }

    /// Policy and current time for a settled transition
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        Settlement::new(self.stale_policy, self.clock.now())
    }

    /// The delayed `ClearAlert` scheduled after a settled transition, if enabled
    #[must_use]
    pub fn dismiss_later<A>(&self, clear_alert: A) -> Option<Effect<A>> {
        self.alert_dismiss.map(|duration| delay! {
            duration: duration,
            action: clear_alert
        })
    }
}

impl std::fmt::Debug for MarketplaceEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceEnvironment")
            .field("stale_policy", &self.stale_policy)
            .field("alert_dismiss", &self.alert_dismiss)
            .finish_non_exhaustive()
    }
}

/// Effect that executes `request` and settles with its decoded payload
pub fn remote<T, A>(
    env: &MarketplaceEnvironment,
    id: RequestId,
    request: ApiRequest,
    settled: fn(Settled<T>) -> A,
) -> Effect<A>
where
    T: DeserializeOwned + Send + 'static,
    A: Send + 'static,
{
    let api = Arc::clone(&env.api);
    async_effect! {
        let result = api.execute(request).await;
        Some(settled(Settled::new(id, decode_response(result))))
    }
}

/// Like [`remote`], with a JSON body
///
/// A body that cannot be serialized settles as rejected without a request.
pub fn remote_json<B, T, A>(
    env: &MarketplaceEnvironment,
    id: RequestId,
    request: ApiRequest,
    body: &B,
    settled: fn(Settled<T>) -> A,
) -> Effect<A>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned + Send + 'static,
    A: Send + 'static,
{
    match request.json(body) {
        Ok(request) => remote(env, id, request, settled),
        Err(e) => rejected_now(id, &e, settled),
    }
}

/// Effect for a request whose response body carries nothing the slice needs
///
/// Settles with `value` (typically the id the request acted on) and the
/// server message.
pub fn remote_ack<T, A>(
    env: &MarketplaceEnvironment,
    id: RequestId,
    request: ApiRequest,
    value: T,
    settled: fn(Settled<T>) -> A,
) -> Effect<A>
where
    T: Send + 'static,
    A: Send + 'static,
{
    let api = Arc::clone(&env.api);
    async_effect! {
        let result = decode_response::<IgnoredAny>(api.execute(request).await)
            .map(|envelope| envelope.map(|_| value));
        Some(settled(Settled::new(id, result)))
    }
}

/// Like [`remote_ack`], with a JSON body
pub fn remote_ack_json<B, T, A>(
    env: &MarketplaceEnvironment,
    id: RequestId,
    request: ApiRequest,
    body: &B,
    value: T,
    settled: fn(Settled<T>) -> A,
) -> Effect<A>
where
    B: Serialize + ?Sized,
    T: Send + 'static,
    A: Send + 'static,
{
    match request.json(body) {
        Ok(request) => remote_ack(env, id, request, value, settled),
        Err(e) => rejected_now(id, &e, settled),
    }
}

/// Effect that settles immediately with `result`, for operations served
/// from the session instead of the network
pub fn local<T, A>(
    id: RequestId,
    result: Result<Envelope<T>, Failure>,
    settled: fn(Settled<T>) -> A,
) -> Effect<A>
where
    T: Send + 'static,
    A: Send + 'static,
{
    async_effect! {
        Some(settled(Settled::new(id, result)))
    }
}

fn rejected_now<T, A>(id: RequestId, error: &ApiError, settled: fn(Settled<T>) -> A) -> Effect<A>
where
    T: Send + 'static,
    A: Send + 'static,
{
    tracing::warn!(request = %id, error = %error, "Request could not be built");
    local(id, Err(Failure::from(error)), settled)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marketplace_core::environment::MemorySessionStorage;
    use marketplace_core::http::Method;
    use marketplace_testing::{MockApi, effects, test_clock};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Probe {
        Items(Settled<Vec<u32>>),
        Deleted(Settled<String>),
    }

    fn env(api: Arc<MockApi>) -> MarketplaceEnvironment {
        MarketplaceEnvironment::new(api, Arc::new(MemorySessionStorage::new()))
            .with_clock(Arc::new(test_clock()))
    }

    #[tokio::test]
    async fn remote_decodes_envelope() {
        let api = Arc::new(MockApi::new());
        api.respond_ok(Method::Get, "/items", json!({"data": [1, 2], "message": "ok"}));

        let effect = remote(&env(api), RequestId::new(3), ApiRequest::get("/items"), Probe::Items);
        let actions = effects::resolve([effect]).await;

        assert_eq!(
            actions,
            vec![Probe::Items(Settled::new(
                RequestId::new(3),
                Ok(Envelope::new(vec![1, 2]).with_message("ok"))
            ))]
        );
    }

    #[tokio::test]
    async fn remote_ack_ignores_body_and_keeps_value() {
        let api = Arc::new(MockApi::new());
        api.respond_ok(Method::Delete, "/items/9", json!({"message": "Removed"}));

        let effect = remote_ack(
            &env(api),
            RequestId::new(1),
            ApiRequest::delete("/items/9"),
            "9".to_string(),
            Probe::Deleted,
        );
        let actions = effects::resolve([effect]).await;

        assert_eq!(
            actions,
            vec![Probe::Deleted(Settled::new(
                RequestId::new(1),
                Ok(Envelope::new("9".to_string()).with_message("Removed"))
            ))]
        );
    }

    #[tokio::test]
    async fn remote_normalizes_failures() {
        let api = Arc::new(MockApi::new());
        api.respond_status(Method::Get, "/items", 403, json!({"message": "Sellers only"}));

        let effect = remote(&env(api), RequestId::new(2), ApiRequest::get("/items"), Probe::Items);
        let actions = effects::resolve([effect]).await;

        assert_eq!(
            actions,
            vec![Probe::Items(Settled::rejected(
                RequestId::new(2),
                Failure::new("Sellers only")
            ))]
        );
    }

    #[test]
    fn dismiss_later_only_when_enabled() {
        let api = Arc::new(MockApi::new());
        let base = env(api);
        assert!(base.dismiss_later(()).is_none());

        let timed = base.with_alert_dismiss(Some(Duration::from_secs(3)));
        assert!(matches!(
            timed.dismiss_later(()),
            Some(Effect::Delay { duration, .. }) if duration == Duration::from_secs(3)
        ));
    }
}

//! Request lifecycle bookkeeping shared by every slice
//!
//! Each remote operation moves its slice through three transitions:
//! pending (the command), then fulfilled or rejected (the [`Settled`] event).
//! [`SliceStatus`] holds the scalar fields those transitions touch, so slice
//! reducers only have to say how a successful payload merges into their
//! collections.

use crate::http::{Envelope, Failure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlation id of one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`RequestId`]s
#[derive(Debug, Default)]
pub struct RequestIds {
    last: AtomicU64,
}

impl RequestIds {
    /// Start counting from zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Allocate the next id; ids only ever increase
    pub fn next(&self) -> RequestId {
        RequestId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Banner kind shown for the last completed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertType {
    /// No banner
    #[default]
    #[serde(rename = "")]
    None,
    /// Green banner
    #[serde(rename = "success")]
    Success,
    /// Red banner
    #[serde(rename = "error")]
    Error,
}

impl AlertType {
    /// Wire representation: `""`, `"success"` or `"error"`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// What to do with a response that arrives after a newer request for the same operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Apply every response in arrival order (older responses may overwrite newer data)
    LastWriteWins,
    /// Ignore responses superseded by a newer request for the same operation
    #[default]
    LatestWins,
}

impl FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" => Ok(Self::LastWriteWins),
            "latest-wins" | "latest_wins" => Ok(Self::LatestWins),
            other => Err(format!("unknown stale policy: {other}")),
        }
    }
}

/// Descriptor of one remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Identifier stored in `loading` / `api_name`, e.g. `cart/fetchBuyerCart`
    pub name: &'static str,
    /// Message used when a successful response carries none
    pub success_message: &'static str,
}

impl Operation {
    /// Declare an operation
    #[must_use]
    pub const fn new(name: &'static str, success_message: &'static str) -> Self {
        Self {
            name,
            success_message,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Inputs a settled transition needs from the environment
#[derive(Debug, Clone, Copy)]
pub struct Settlement {
    /// How stale responses are treated
    pub policy: StalePolicy,
    /// Time recorded as `fetched_at` on success
    pub now: DateTime<Utc>,
}

impl Settlement {
    /// Bundle the policy and the current time
    #[must_use]
    pub const fn new(policy: StalePolicy, now: DateTime<Utc>) -> Self {
        Self { policy, now }
    }
}

/// Scalar fields shared by every slice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceStatus {
    /// Empty when idle, otherwise the in-flight operation (last write wins)
    pub loading: String,
    /// Last operation attempted
    pub api_name: String,
    /// Banner kind
    pub alert_type: AlertType,
    /// Outcome message of the last completed operation
    pub message: String,
    /// Mirrors `alert_type == Error`
    pub error: bool,
    /// When the slice last received a successful response
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    newest: BTreeMap<&'static str, RequestId>,
}

impl SliceStatus {
    /// Pending transition
    pub fn begin(&mut self, op: &Operation, request: RequestId) {
        self.loading = op.name.to_string();
        self.api_name = op.name.to_string();
        self.clear_alert();

        let newest = self.newest.entry(op.name).or_insert(request);
        if request > *newest {
            *newest = request;
        }
    }

    /// Whether a response for `request` should be applied under `policy`
    #[must_use]
    pub fn accepts(&self, op: &Operation, request: RequestId, policy: StalePolicy) -> bool {
        match policy {
            StalePolicy::LastWriteWins => true,
            StalePolicy::LatestWins => self
                .newest
                .get(op.name)
                .is_none_or(|newest| request >= *newest),
        }
    }

    /// Fulfilled transition
    pub fn succeed(&mut self, op: &Operation, message: Option<String>, now: DateTime<Utc>) {
        self.finish(op);
        self.alert_type = AlertType::Success;
        self.error = false;
        self.message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| op.success_message.to_string());
        self.fetched_at = Some(now);
    }

    /// Rejected transition
    pub fn fail(&mut self, op: &Operation, failure: &Failure) {
        self.finish(op);
        self.alert_type = AlertType::Error;
        self.error = true;
        self.message.clone_from(&failure.message);
    }

    /// Clear the banner fields, keeping data and in-flight bookkeeping
    pub fn clear_alert(&mut self) {
        self.alert_type = AlertType::None;
        self.message.clear();
        self.error = false;
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether any operation is marked as in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Whether `op` is the operation marked as in flight
    #[must_use]
    pub fn is_loading_op(&self, op: &Operation) -> bool {
        self.loading == op.name
    }

    /// The newest id per operation is kept so older responses stay rejected
    fn finish(&mut self, op: &Operation) {
        self.loading.clear();
        self.api_name = op.name.to_string();
    }
}

/// Terminal lifecycle event of one request
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<T> {
    /// The request this result belongs to
    pub request: RequestId,
    /// Fulfilled payload or normalized failure
    pub result: Result<Envelope<T>, Failure>,
}

impl<T> Settled<T> {
    /// Wrap a result
    #[must_use]
    pub const fn new(request: RequestId, result: Result<Envelope<T>, Failure>) -> Self {
        Self { request, result }
    }

    /// Fulfilled without a server message
    #[must_use]
    pub const fn fulfilled(request: RequestId, data: T) -> Self {
        Self::new(request, Ok(Envelope::new(data)))
    }

    /// Rejected with `failure`
    #[must_use]
    pub const fn rejected(request: RequestId, failure: Failure) -> Self {
        Self::new(request, Err(failure))
    }

    /// Whether the request succeeded
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        self.result.is_ok()
    }

    /// Drop the envelope, keeping payload or failure
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] of a rejected request.
    pub fn into_result(self) -> Result<T, Failure> {
        self.result.map(|envelope| envelope.data)
    }

    /// Run the fulfilled or rejected transition on `status`
    ///
    /// `merge` receives the payload only when the request succeeded and the
    /// response is not stale; a rejected request never reaches it. Returns
    /// whether the response was applied.
    pub fn apply<F>(self, status: &mut SliceStatus, op: &Operation, at: Settlement, merge: F) -> bool
    where
        F: FnOnce(T),
    {
        if !status.accepts(op, self.request, at.policy) {
            return false;
        }

        match self.result {
            Ok(envelope) => {
                merge(envelope.data);
                status.succeed(op, envelope.message, at.now);
            },
            Err(failure) => status.fail(op, &failure),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FETCH: Operation = Operation::new("items/fetch", "Items fetched successfully");
    const DELETE: Operation = Operation::new("items/delete", "Item deleted");

    fn at(policy: StalePolicy) -> Settlement {
        Settlement::new(policy, DateTime::<Utc>::UNIX_EPOCH)
    }

    #[test]
    fn request_ids_increase() {
        let ids = RequestIds::new();
        let first = ids.next();
        let second = ids.next();
        assert!(second > first);
        assert_eq!(first.to_string(), "#1");
    }

    #[test]
    fn begin_marks_loading_and_clears_alert() {
        let mut status = SliceStatus {
            alert_type: AlertType::Error,
            message: "old".to_string(),
            error: true,
            ..SliceStatus::default()
        };

        status.begin(&FETCH, RequestId::new(1));

        assert_eq!(status.loading, "items/fetch");
        assert_eq!(status.api_name, "items/fetch");
        assert_eq!(status.alert_type, AlertType::None);
        assert!(status.message.is_empty());
        assert!(!status.error);
    }

    #[test]
    fn fulfilled_uses_server_message_or_default() {
        let mut status = SliceStatus::default();
        let mut items = Vec::new();

        status.begin(&FETCH, RequestId::new(1));
        let applied = Settled::new(
            RequestId::new(1),
            Ok(Envelope::new(vec![1, 2]).with_message("Loaded 2 items")),
        )
        .apply(&mut status, &FETCH, at(StalePolicy::LatestWins), |data| items = data);

        assert!(applied);
        assert_eq!(items, vec![1, 2]);
        assert_eq!(status.loading, "");
        assert_eq!(status.alert_type, AlertType::Success);
        assert_eq!(status.message, "Loaded 2 items");
        assert_eq!(status.fetched_at, Some(DateTime::<Utc>::UNIX_EPOCH));

        status.begin(&FETCH, RequestId::new(2));
        Settled::fulfilled(RequestId::new(2), vec![3])
            .apply(&mut status, &FETCH, at(StalePolicy::LatestWins), |data| items = data);
        assert_eq!(status.message, "Items fetched successfully");
    }

    #[test]
    fn rejected_never_runs_merge() {
        let mut status = SliceStatus::default();
        let mut merged = false;

        status.begin(&DELETE, RequestId::new(4));
        Settled::<()>::rejected(RequestId::new(4), Failure::new("Not allowed"))
            .apply(&mut status, &DELETE, at(StalePolicy::LatestWins), |()| merged = true);

        assert!(!merged);
        assert_eq!(status.loading, "");
        assert_eq!(status.alert_type, AlertType::Error);
        assert!(status.error);
        assert_eq!(status.message, "Not allowed");
    }

    #[test]
    fn latest_wins_ignores_superseded_response() {
        let mut status = SliceStatus::default();
        let mut items = vec![0];

        status.begin(&FETCH, RequestId::new(1));
        status.begin(&FETCH, RequestId::new(2));

        let applied = Settled::fulfilled(RequestId::new(2), vec![2])
            .apply(&mut status, &FETCH, at(StalePolicy::LatestWins), |data| items = data);
        assert!(applied);

        let applied = Settled::fulfilled(RequestId::new(1), vec![1])
            .apply(&mut status, &FETCH, at(StalePolicy::LatestWins), |data| items = data);
        assert!(!applied);
        assert_eq!(items, vec![2]);
    }

    #[test]
    fn last_write_wins_applies_in_arrival_order() {
        let mut status = SliceStatus::default();
        let mut items = vec![0];

        status.begin(&FETCH, RequestId::new(1));
        status.begin(&FETCH, RequestId::new(2));

        Settled::fulfilled(RequestId::new(2), vec![2])
            .apply(&mut status, &FETCH, at(StalePolicy::LastWriteWins), |data| items = data);
        Settled::fulfilled(RequestId::new(1), vec![1])
            .apply(&mut status, &FETCH, at(StalePolicy::LastWriteWins), |data| items = data);

        assert_eq!(items, vec![1]);
    }

    #[test]
    fn operations_do_not_supersede_each_other() {
        let mut status = SliceStatus::default();
        status.begin(&FETCH, RequestId::new(1));
        status.begin(&DELETE, RequestId::new(2));

        assert!(status.accepts(&FETCH, RequestId::new(1), StalePolicy::LatestWins));
        assert!(status.accepts(&DELETE, RequestId::new(2), StalePolicy::LatestWins));
        // `loading` is a single marker: the second operation overwrote it
        assert!(status.is_loading_op(&DELETE));
    }

    #[test]
    fn alert_type_serializes_to_wire_strings() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&AlertType::None)?, "\"\"");
        assert_eq!(serde_json::to_string(&AlertType::Success)?, "\"success\"");
        assert_eq!(AlertType::Error.as_str(), "error");
        Ok(())
    }

    #[test]
    fn stale_policy_parses_config_values() {
        assert_eq!("latest-wins".parse::<StalePolicy>(), Ok(StalePolicy::LatestWins));
        assert_eq!(
            "LAST_WRITE_WINS".parse::<StalePolicy>(),
            Ok(StalePolicy::LastWriteWins)
        );
        assert!("newest".parse::<StalePolicy>().is_err());
    }

    #[test]
    fn reset_returns_to_defaults() {
        let mut status = SliceStatus::default();
        status.begin(&FETCH, RequestId::new(1));
        status.reset();
        assert_eq!(status, SliceStatus::default());
        assert!(!status.is_loading());
    }
}

//! The eight resource slices
//!
//! Every slice follows the same shape: a state record holding collections,
//! an optional detail object and a [`SliceStatus`]; an action enum with one
//! command and one settled event per remote operation plus `ClearAlert` and
//! `Reset`; and a unit reducer. Commands run the pending transition and
//! return the effect that performs the request. Settled events run the
//! fulfilled or rejected transition and merge the payload.

use crate::environment::MarketplaceEnvironment;
use marketplace_core::effect::Effect;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use marketplace_core::{SmallVec, smallvec};

pub mod auth;
pub mod cart;
pub mod category;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod user;

/// Pending transition for `op`, returning the request effect
fn begin<A>(
    status: &mut SliceStatus,
    op: &Operation,
    request: RequestId,
    effect: Effect<A>,
) -> SmallVec<[Effect<A>; 4]> {
    status.begin(op, request);
    tracing::debug!(operation = op.name, %request, "Request started");
    smallvec![effect]
}

/// Fulfilled or rejected transition for `op`
///
/// `merge` only sees accepted payloads. An applied transition schedules the
/// alert auto-dismiss when the environment enables it.
fn settle<T, A>(
    status: &mut SliceStatus,
    op: &Operation,
    settled: Settled<T>,
    env: &MarketplaceEnvironment,
    clear_alert: A,
    merge: impl FnOnce(T),
) -> SmallVec<[Effect<A>; 4]> {
    let request = settled.request;
    if settled.apply(status, op, env.settlement(), merge) {
        tracing::debug!(
            operation = op.name,
            %request,
            alert = status.alert_type.as_str(),
            "Request settled"
        );
        env.dismiss_later(clear_alert).into_iter().collect()
    } else {
        tracing::debug!(operation = op.name, %request, "Ignored superseded response");
        SmallVec::new()
    }
}

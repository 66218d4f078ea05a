//! Payments

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_json};
use crate::types::{EntityId, NewPayment, Payment};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::ApiRequest;
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};

/// POST `/buyer/payments`
pub const CREATE_PAYMENT: Operation =
    Operation::new("payment/createPayment", "Payment completed successfully");
/// GET `/buyer/payments`
pub const FETCH_PAYMENTS: Operation =
    Operation::new("payment/fetchPayments", "Payments fetched successfully");
/// GET `/buyer/payments/{id}`
pub const FETCH_PAYMENT_DETAIL: Operation =
    Operation::new("payment/fetchPaymentDetail", "Payment fetched successfully");
/// GET `/seller/payments`
pub const FETCH_SELLER_PAYMENTS: Operation =
    Operation::new("payment/fetchSellerPayments", "Payments fetched successfully");

/// Payment slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentState {
    /// The buyer's payments
    pub payments: Vec<Payment>,
    /// Payments received by the seller
    pub seller_payments: Vec<Payment>,
    /// Payment shown on the detail page
    pub payment_detail: Option<Payment>,
    /// Request lifecycle
    pub status: SliceStatus,
}

/// Payment slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentAction {
    /// Pay for an order
    CreatePayment {
        /// Correlation id
        request: RequestId,
        /// Payment form
        payment: NewPayment,
    },
    /// Payment made
    PaymentCreated(Settled<Payment>),
    /// Load the buyer's payments
    FetchPayments {
        /// Correlation id
        request: RequestId,
    },
    /// Payments loaded
    PaymentsFetched(Settled<Vec<Payment>>),
    /// Load one payment
    FetchPaymentDetail {
        /// Correlation id
        request: RequestId,
        /// Payment id
        id: EntityId,
    },
    /// Payment loaded
    PaymentDetailFetched(Settled<Payment>),
    /// Load the seller's received payments
    FetchSellerPayments {
        /// Correlation id
        request: RequestId,
    },
    /// Seller payments loaded
    SellerPaymentsFetched(Settled<Vec<Payment>>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl PaymentAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::PaymentCreated(Settled { request, .. })
            | Self::PaymentsFetched(Settled { request, .. })
            | Self::PaymentDetailFetched(Settled { request, .. })
            | Self::SellerPaymentsFetched(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }
}

/// Payment slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentReducer;

impl PaymentReducer {
    /// Create a new payment reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for PaymentReducer {
    type State = PaymentState;
    type Action = PaymentAction;
    type Environment = MarketplaceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = PaymentAction::ClearAlert;

        match action {
            PaymentAction::CreatePayment { request, payment } => begin(
                status,
                &CREATE_PAYMENT,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/buyer/payments"),
                    &payment,
                    PaymentAction::PaymentCreated,
                ),
            ),
            PaymentAction::PaymentCreated(settled) => {
                settle(status, &CREATE_PAYMENT, settled, env, clear, |payment| {
                    state.payment_detail = Some(payment.clone());
                    merge::append(&mut state.payments, payment);
                })
            },

            PaymentAction::FetchPayments { request } => begin(
                status,
                &FETCH_PAYMENTS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/buyer/payments"),
                    PaymentAction::PaymentsFetched,
                ),
            ),
            PaymentAction::PaymentsFetched(settled) => {
                settle(status, &FETCH_PAYMENTS, settled, env, clear, |payments| {
                    merge::replace(&mut state.payments, payments);
                })
            },

            PaymentAction::FetchPaymentDetail { request, id } => begin(
                status,
                &FETCH_PAYMENT_DETAIL,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get(format!("/buyer/payments/{id}")),
                    PaymentAction::PaymentDetailFetched,
                ),
            ),
            PaymentAction::PaymentDetailFetched(settled) => {
                settle(status, &FETCH_PAYMENT_DETAIL, settled, env, clear, |payment| {
                    state.payment_detail = Some(payment);
                })
            },

            PaymentAction::FetchSellerPayments { request } => begin(
                status,
                &FETCH_SELLER_PAYMENTS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/seller/payments"),
                    PaymentAction::SellerPaymentsFetched,
                ),
            ),
            PaymentAction::SellerPaymentsFetched(settled) => {
                settle(status, &FETCH_SELLER_PAYMENTS, settled, env, clear, |payments| {
                    merge::replace(&mut state.seller_payments, payments);
                })
            },

            PaymentAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            PaymentAction::Reset => {
                *state = PaymentState::default();
                SmallVec::new()
            },
        }
    }
}

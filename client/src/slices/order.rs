//! Buyer and seller orders

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_json};
use crate::types::{EntityId, NewOrder, Order, OrderStatusUpdate};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::ApiRequest;
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};

/// GET `/buyer/orders`
pub const FETCH_BUYER_ORDERS: Operation =
    Operation::new("order/fetchBuyerOrders", "Orders fetched successfully");
/// GET `/buyer/orders/{id}`
pub const FETCH_ORDER_DETAIL: Operation =
    Operation::new("order/fetchOrderDetail", "Order fetched successfully");
/// POST `/buyer/orders`
pub const PLACE_ORDER: Operation = Operation::new("order/placeOrder", "Order placed successfully");
/// PUT `/buyer/orders/{id}/cancel`
pub const CANCEL_ORDER: Operation =
    Operation::new("order/cancelOrder", "Order cancelled successfully");
/// GET `/seller/orders`
pub const FETCH_SELLER_ORDERS: Operation =
    Operation::new("order/fetchSellerOrders", "Orders fetched successfully");
/// PUT `/seller/orders/{id}/status`
pub const UPDATE_ORDER_STATUS: Operation =
    Operation::new("order/updateOrderStatus", "Order status updated");

/// Order slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderState {
    /// The buyer's orders
    pub buyer_orders: Vec<Order>,
    /// Orders for the seller's products
    pub seller_orders: Vec<Order>,
    /// Order shown on the detail page
    pub order_detail: Option<Order>,
    /// Request lifecycle
    pub status: SliceStatus,
}

/// Order slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Load the buyer's orders
    FetchBuyerOrders {
        /// Correlation id
        request: RequestId,
    },
    /// Buyer orders loaded
    BuyerOrdersFetched(Settled<Vec<Order>>),
    /// Load one order
    FetchOrderDetail {
        /// Correlation id
        request: RequestId,
        /// Order id
        id: EntityId,
    },
    /// Order loaded
    OrderDetailFetched(Settled<Order>),
    /// Check out
    PlaceOrder {
        /// Correlation id
        request: RequestId,
        /// Checkout form
        order: NewOrder,
    },
    /// Order placed
    OrderPlaced(Settled<Order>),
    /// Cancel one of the buyer's orders
    CancelOrder {
        /// Correlation id
        request: RequestId,
        /// Order id
        id: EntityId,
    },
    /// Order cancelled
    OrderCancelled(Settled<Order>),
    /// Load the seller's orders
    FetchSellerOrders {
        /// Correlation id
        request: RequestId,
    },
    /// Seller orders loaded
    SellerOrdersFetched(Settled<Vec<Order>>),
    /// Move an order to a new fulfilment status
    UpdateOrderStatus {
        /// Correlation id
        request: RequestId,
        /// Order id
        id: EntityId,
        /// New status
        update: OrderStatusUpdate,
    },
    /// Status updated
    OrderStatusUpdated(Settled<Order>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl OrderAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::BuyerOrdersFetched(Settled { request, .. })
            | Self::OrderDetailFetched(Settled { request, .. })
            | Self::OrderPlaced(Settled { request, .. })
            | Self::OrderCancelled(Settled { request, .. })
            | Self::SellerOrdersFetched(Settled { request, .. })
            | Self::OrderStatusUpdated(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }

    /// Whether this event is a successfully placed order
    #[must_use]
    pub const fn is_order_placed(&self) -> bool {
        matches!(self, Self::OrderPlaced(settled) if settled.is_fulfilled())
    }
}

/// Order slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderReducer;

impl OrderReducer {
    /// Create a new order reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for OrderReducer {
    type State = OrderState;
    type Action = OrderAction;
    type Environment = MarketplaceEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle event
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = OrderAction::ClearAlert;

        match action {
            OrderAction::FetchBuyerOrders { request } => begin(
                status,
                &FETCH_BUYER_ORDERS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/buyer/orders"),
                    OrderAction::BuyerOrdersFetched,
                ),
            ),
            OrderAction::BuyerOrdersFetched(settled) => {
                settle(status, &FETCH_BUYER_ORDERS, settled, env, clear, |orders| {
                    merge::replace(&mut state.buyer_orders, orders);
                })
            },

            OrderAction::FetchOrderDetail { request, id } => begin(
                status,
                &FETCH_ORDER_DETAIL,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get(format!("/buyer/orders/{id}")),
                    OrderAction::OrderDetailFetched,
                ),
            ),
            OrderAction::OrderDetailFetched(settled) => {
                settle(status, &FETCH_ORDER_DETAIL, settled, env, clear, |order| {
                    state.order_detail = Some(order);
                })
            },

            OrderAction::PlaceOrder { request, order } => begin(
                status,
                &PLACE_ORDER,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/buyer/orders"),
                    &order,
                    OrderAction::OrderPlaced,
                ),
            ),
            OrderAction::OrderPlaced(settled) => {
                settle(status, &PLACE_ORDER, settled, env, clear, |order| {
                    merge::append(&mut state.buyer_orders, order);
                })
            },

            OrderAction::CancelOrder { request, id } => begin(
                status,
                &CANCEL_ORDER,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::put(format!("/buyer/orders/{id}/cancel")),
                    OrderAction::OrderCancelled,
                ),
            ),
            OrderAction::OrderCancelled(settled) => {
                settle(status, &CANCEL_ORDER, settled, env, clear, |order| {
                    merge::refresh_detail(&mut state.order_detail, &order);
                    merge::map_replace(&mut state.buyer_orders, order);
                })
            },

            OrderAction::FetchSellerOrders { request } => begin(
                status,
                &FETCH_SELLER_ORDERS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/seller/orders"),
                    OrderAction::SellerOrdersFetched,
                ),
            ),
            OrderAction::SellerOrdersFetched(settled) => {
                settle(status, &FETCH_SELLER_ORDERS, settled, env, clear, |orders| {
                    merge::replace(&mut state.seller_orders, orders);
                })
            },

            OrderAction::UpdateOrderStatus {
                request,
                id,
                update,
            } => begin(
                status,
                &UPDATE_ORDER_STATUS,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::put(format!("/seller/orders/{id}/status")),
                    &update,
                    OrderAction::OrderStatusUpdated,
                ),
            ),
            OrderAction::OrderStatusUpdated(settled) => {
                settle(status, &UPDATE_ORDER_STATUS, settled, env, clear, |order| {
                    merge::refresh_detail(&mut state.order_detail, &order);
                    merge::map_replace(&mut state.seller_orders, order);
                })
            },

            OrderAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            OrderAction::Reset => {
                *state = OrderState::default();
                SmallVec::new()
            },
        }
    }
}

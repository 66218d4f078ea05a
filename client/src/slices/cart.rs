//! Buyer cart and wishlist

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_ack, remote_json};
use crate::types::{CartItem, EntityId, NewCartItem, WishlistItem};
use marketplace_core::effect::Effect;
use marketplace_core::http::ApiRequest;
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use marketplace_core::SmallVec;
use serde::{Deserialize, Serialize};
use serde_json::json;

// ============================================================================
// Operations
// ============================================================================

/// GET `/buyer/cart`
pub const FETCH_CART: Operation = Operation::new("cart/fetchBuyerCart", "Cart fetched successfully");
/// POST `/buyer/cart`
pub const ADD_TO_CART: Operation = Operation::new("cart/addToBuyerCart", "Item added to cart");
/// PUT `/buyer/cart/{id}`
pub const UPDATE_CART_ITEM: Operation = Operation::new("cart/updateBuyerCart", "Cart updated");
/// DELETE `/buyer/cart/{id}`
pub const DELETE_CART_ITEM: Operation =
    Operation::new("cart/deleteBuyerCart", "Item removed from cart");
/// GET `/buyer/wishlist`
pub const FETCH_WISHLIST: Operation =
    Operation::new("cart/fetchWishlist", "Wishlist fetched successfully");
/// POST `/buyer/wishlist`
pub const ADD_TO_WISHLIST: Operation =
    Operation::new("cart/addToWishlist", "Item added to wishlist");
/// DELETE `/buyer/wishlist/{id}`
pub const REMOVE_FROM_WISHLIST: Operation =
    Operation::new("cart/removeFromWishlist", "Item removed from wishlist");

// ============================================================================
// State
// ============================================================================

/// Cart slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    /// Cart lines, in server order
    pub cart: Vec<CartItem>,
    /// Saved products
    pub wishlist: Vec<WishlistItem>,
    /// Request lifecycle
    pub status: SliceStatus,
}

// ============================================================================
// Actions
// ============================================================================

/// Cart slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Load the cart
    FetchCart {
        /// Correlation id
        request: RequestId,
    },
    /// Cart loaded
    CartFetched(Settled<Vec<CartItem>>),
    /// Add a line
    AddToCart {
        /// Correlation id
        request: RequestId,
        /// Line to add
        item: NewCartItem,
    },
    /// Line added
    CartItemAdded(Settled<CartItem>),
    /// Change a line's quantity
    UpdateCartItem {
        /// Correlation id
        request: RequestId,
        /// Cart line id
        id: EntityId,
        /// New quantity
        quantity: u32,
    },
    /// Line updated
    CartItemUpdated(Settled<CartItem>),
    /// Remove a line
    DeleteCartItem {
        /// Correlation id
        request: RequestId,
        /// Cart line id
        id: EntityId,
    },
    /// Line removed; carries the id that was deleted
    CartItemDeleted(Settled<EntityId>),
    /// Load the wishlist
    FetchWishlist {
        /// Correlation id
        request: RequestId,
    },
    /// Wishlist loaded
    WishlistFetched(Settled<Vec<WishlistItem>>),
    /// Save a product
    AddToWishlist {
        /// Correlation id
        request: RequestId,
        /// Product to save
        product_id: EntityId,
    },
    /// Product saved
    WishlistItemAdded(Settled<WishlistItem>),
    /// Unsave a product
    RemoveFromWishlist {
        /// Correlation id
        request: RequestId,
        /// Wishlist entry id
        id: EntityId,
    },
    /// Product unsaved; carries the id that was removed
    WishlistItemRemoved(Settled<EntityId>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl CartAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::CartFetched(Settled { request, .. })
            | Self::CartItemAdded(Settled { request, .. })
            | Self::CartItemUpdated(Settled { request, .. })
            | Self::CartItemDeleted(Settled { request, .. })
            | Self::WishlistFetched(Settled { request, .. })
            | Self::WishlistItemAdded(Settled { request, .. })
            | Self::WishlistItemRemoved(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Cart slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Create a new cart reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = MarketplaceEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle event
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = CartAction::ClearAlert;

        match action {
            CartAction::FetchCart { request } => begin(
                status,
                &FETCH_CART,
                request,
                remote(env, request, ApiRequest::get("/buyer/cart"), CartAction::CartFetched),
            ),
            CartAction::CartFetched(settled) => {
                settle(status, &FETCH_CART, settled, env, clear, |items| {
                    merge::replace(&mut state.cart, items);
                })
            },

            CartAction::AddToCart { request, item } => begin(
                status,
                &ADD_TO_CART,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/buyer/cart"),
                    &item,
                    CartAction::CartItemAdded,
                ),
            ),
            CartAction::CartItemAdded(settled) => {
                settle(status, &ADD_TO_CART, settled, env, clear, |item| {
                    merge::append(&mut state.cart, item);
                })
            },

            CartAction::UpdateCartItem {
                request,
                id,
                quantity,
            } => begin(
                status,
                &UPDATE_CART_ITEM,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::put(format!("/buyer/cart/{id}")),
                    &json!({ "quantity": quantity }),
                    CartAction::CartItemUpdated,
                ),
            ),
            CartAction::CartItemUpdated(settled) => {
                settle(status, &UPDATE_CART_ITEM, settled, env, clear, |item| {
                    merge::map_replace(&mut state.cart, item);
                })
            },

            CartAction::DeleteCartItem { request, id } => begin(
                status,
                &DELETE_CART_ITEM,
                request,
                remote_ack(
                    env,
                    request,
                    ApiRequest::delete(format!("/buyer/cart/{id}")),
                    id,
                    CartAction::CartItemDeleted,
                ),
            ),
            CartAction::CartItemDeleted(settled) => {
                settle(status, &DELETE_CART_ITEM, settled, env, clear, |id| {
                    merge::filter_out(&mut state.cart, &id);
                })
            },

            CartAction::FetchWishlist { request } => begin(
                status,
                &FETCH_WISHLIST,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/buyer/wishlist"),
                    CartAction::WishlistFetched,
                ),
            ),
            CartAction::WishlistFetched(settled) => {
                settle(status, &FETCH_WISHLIST, settled, env, clear, |items| {
                    merge::replace(&mut state.wishlist, items);
                })
            },

            CartAction::AddToWishlist {
                request,
                product_id,
            } => begin(
                status,
                &ADD_TO_WISHLIST,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/buyer/wishlist"),
                    &json!({ "product_id": product_id }),
                    CartAction::WishlistItemAdded,
                ),
            ),
            CartAction::WishlistItemAdded(settled) => {
                settle(status, &ADD_TO_WISHLIST, settled, env, clear, |item| {
                    if !merge::append_unique(&mut state.wishlist, item) {
                        tracing::debug!("Product already in wishlist");
                    }
                })
            },

            CartAction::RemoveFromWishlist { request, id } => begin(
                status,
                &REMOVE_FROM_WISHLIST,
                request,
                remote_ack(
                    env,
                    request,
                    ApiRequest::delete(format!("/buyer/wishlist/{id}")),
                    id,
                    CartAction::WishlistItemRemoved,
                ),
            ),
            CartAction::WishlistItemRemoved(settled) => {
                settle(status, &REMOVE_FROM_WISHLIST, settled, env, clear, |id| {
                    merge::filter_out(&mut state.wishlist, &id);
                })
            },

            CartAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            CartAction::Reset => {
                *state = CartState::default();
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::slices::test_support::{env, env_with, id};
    use marketplace_core::http::{Failure, Method, RequestBody};
    use marketplace_core::slice::AlertType;
    use marketplace_testing::{MockApi, ReducerTest, assertions, effects};
    use std::sync::Arc;

    fn line(id: &str, product: &str, quantity: u32) -> CartItem {
        CartItem {
            id: Some(EntityId::from(id)),
            product_id: Some(EntityId::from(product)),
            quantity,
            ..CartItem::default()
        }
    }

    fn cart_of(items: Vec<CartItem>) -> CartState {
        CartState {
            cart: items,
            ..CartState::default()
        }
    }

    #[test]
    fn fetch_marks_loading() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(CartState::default())
            .when_action(CartAction::FetchCart { request: id(1) })
            .then_state(|state| {
                assert_eq!(state.status.loading, "cart/fetchBuyerCart");
                assert_eq!(state.status.api_name, "cart/fetchBuyerCart");
                assert_eq!(state.status.alert_type, AlertType::None);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn fetched_cart_replaces_collection() {
        let server = vec![line("1", "p1", 2)];
        let expected = server.clone();

        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("old", "p0", 1), line("older", "p9", 3)]))
            .when_action(CartAction::FetchCart { request: id(1) })
            .when_action(CartAction::CartFetched(Settled::fulfilled(id(1), server)))
            .then_state(move |state| {
                assert_eq!(state.cart, expected);
                assert_eq!(state.status.loading, "");
                assert_eq!(state.status.alert_type, AlertType::Success);
                assert_eq!(state.status.message, "Cart fetched successfully");
                assert!(state.status.fetched_at.is_some());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn added_item_goes_last() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("1", "p1", 2)]))
            .when_action(CartAction::CartItemAdded(Settled::fulfilled(
                id(2),
                line("2", "p2", 1),
            )))
            .then_state(|state| {
                assert_eq!(state.cart.len(), 2);
                assert_eq!(state.cart[1].product_id, Some(EntityId::from("p2")));
            })
            .run();
    }

    #[test]
    fn updated_item_replaced_in_place() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("1", "p1", 2), line("2", "p2", 1)]))
            .when_action(CartAction::CartItemUpdated(Settled::fulfilled(
                id(3),
                line("2", "p2", 5),
            )))
            .then_state(|state| {
                assert_eq!(state.cart.len(), 2);
                assert_eq!(state.cart[0], line("1", "p1", 2));
                assert_eq!(state.cart[1].quantity, 5);
            })
            .run();
    }

    #[test]
    fn deleted_item_filtered_out() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("1", "p1", 2), line("2", "p2", 1)]))
            .when_action(CartAction::CartItemDeleted(Settled::fulfilled(
                id(4),
                EntityId::from("1"),
            )))
            .then_state(|state| {
                assert_eq!(state.cart, vec![line("2", "p2", 1)]);
            })
            .run();
    }

    #[test]
    fn rejected_delete_keeps_cart() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("1", "p1", 2)]))
            .when_action(CartAction::DeleteCartItem {
                request: id(5),
                id: EntityId::from("1"),
            })
            .when_action(CartAction::CartItemDeleted(Settled::rejected(
                id(5),
                Failure::new("Cart is locked"),
            )))
            .then_state(|state| {
                assert_eq!(state.cart, vec![line("1", "p1", 2)]);
                assert_eq!(state.status.alert_type, AlertType::Error);
                assert!(state.status.error);
                assert_eq!(state.status.message, "Cart is locked");
                assert_eq!(state.status.loading, "");
            })
            .run();
    }

    #[test]
    fn wishlist_ignores_duplicates() {
        let saved = WishlistItem {
            id: Some(EntityId::from("w1")),
            product_id: Some(EntityId::from("p1")),
            ..WishlistItem::default()
        };
        let again = saved.clone();

        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(CartState {
                wishlist: vec![saved],
                ..CartState::default()
            })
            .when_action(CartAction::WishlistItemAdded(Settled::fulfilled(id(1), again)))
            .then_state(|state| {
                assert_eq!(state.wishlist.len(), 1);
                assert_eq!(state.status.alert_type, AlertType::Success);
            })
            .run();
    }

    #[test]
    fn superseded_fetch_is_ignored() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(CartState::default())
            .when_action(CartAction::FetchCart { request: id(1) })
            .when_action(CartAction::FetchCart { request: id(2) })
            .when_action(CartAction::CartFetched(Settled::fulfilled(
                id(2),
                vec![line("new", "p2", 1)],
            )))
            .when_action(CartAction::CartFetched(Settled::fulfilled(
                id(1),
                vec![line("old", "p1", 1)],
            )))
            .then_state(|state| {
                assert_eq!(state.cart, vec![line("new", "p2", 1)]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn settled_schedules_alert_dismiss() {
        let dismiss = std::time::Duration::from_secs(3);

        ReducerTest::new(CartReducer::new())
            .with_env(env().with_alert_dismiss(Some(dismiss)))
            .given_state(CartState::default())
            .when_action(CartAction::CartFetched(Settled::fulfilled(id(1), Vec::new())))
            .then_effects(move |effects| {
                assertions::assert_has_delay_effect(effects, dismiss, &CartAction::ClearAlert);
            })
            .run();
    }

    #[test]
    fn clear_alert_and_reset() {
        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("1", "p1", 2)]))
            .when_action(CartAction::CartItemDeleted(Settled::rejected(
                id(1),
                Failure::generic(),
            )))
            .when_action(CartAction::ClearAlert)
            .then_state(|state| {
                assert_eq!(state.status.alert_type, AlertType::None);
                assert!(state.status.message.is_empty());
                assert_eq!(state.cart.len(), 1);
            })
            .run();

        ReducerTest::new(CartReducer::new())
            .with_env(env())
            .given_state(cart_of(vec![line("1", "p1", 2)]))
            .when_action(CartAction::Reset)
            .then_state(|state| assert_eq!(*state, CartState::default()))
            .run();
    }

    #[tokio::test]
    async fn update_sends_quantity() {
        let api = Arc::new(MockApi::new());
        api.respond_ok(
            Method::Put,
            "/buyer/cart/2",
            json!({"data": {"id": "2", "product_id": "p2", "quantity": 4}}),
        );

        let mut state = CartState::default();
        let produced = CartReducer.reduce(
            &mut state,
            CartAction::UpdateCartItem {
                request: id(1),
                id: EntityId::from("2"),
                quantity: 4,
            },
            &env_with(Arc::clone(&api)),
        );
        let actions = effects::resolve(produced).await;

        let request = api.last_request().unwrap();
        assert_eq!(request.body, RequestBody::Json(json!({"quantity": 4})));
        assert!(request.authenticated);
        assert_eq!(
            actions,
            vec![CartAction::CartItemUpdated(Settled::fulfilled(
                id(1),
                line("2", "p2", 4)
            ))]
        );
    }
}

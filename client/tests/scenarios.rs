//! End-to-end scenarios through the facade and the store
//!
//! The HTTP layer is replaced by `MockApi`; everything else (root reducer,
//! store, effects, session storage) is the production wiring.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use marketplace_client::types::{
    CartItem, Credentials, EntityId, NewCartItem, NewOrder, OrderLine,
};
use marketplace_client::slices::auth;
use marketplace_client::{Failure, Marketplace, MarketplaceEnvironment, derived, session};
use marketplace_core::environment::{MemorySessionStorage, SessionStorage};
use marketplace_core::http::Method;
use marketplace_core::slice::{AlertType, StalePolicy};
use marketplace_testing::{MockApi, test_clock};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Test Fixtures
// ============================================================================

struct Harness {
    api: Arc<MockApi>,
    session: Arc<MemorySessionStorage>,
    market: Marketplace,
}

fn harness_with(policy: StalePolicy, dismiss: Option<Duration>) -> Harness {
    let api = Arc::new(MockApi::new());
    let session = Arc::new(MemorySessionStorage::new());
    let env = MarketplaceEnvironment::new(
        Arc::clone(&api) as Arc<dyn marketplace_core::environment::ApiClient>,
        Arc::clone(&session) as Arc<dyn SessionStorage>,
    )
    .with_clock(Arc::new(test_clock()))
    .with_stale_policy(policy)
    .with_alert_dismiss(dismiss);

    Harness {
        api,
        session,
        market: Marketplace::new(env).with_timeout(Duration::from_secs(5)),
    }
}

fn harness() -> Harness {
    harness_with(StalePolicy::LatestWins, None)
}

fn cart_line(id: &str, product: &str, quantity: u32) -> CartItem {
    serde_json::from_value(json!({"id": id, "product_id": product, "quantity": quantity})).unwrap()
}

fn script_sign_in(api: &MockApi) {
    api.respond_ok(
        Method::Post,
        "/auth/signin",
        json!({
            "data": {
                "user": {"id": "u1", "name": "Ada", "email": "ada@example.com", "role": "buyer"},
                "access_token": "tok-123"
            },
            "message": "Signed in"
        }),
    );
}

fn credentials() -> Credentials {
    Credentials {
        email: "ada@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn fetch_cart_replaces_collection() {
    let h = harness();
    h.api.respond_ok(
        Method::Get,
        "/buyer/cart",
        json!({"data": [{"id": "1", "product_id": "p1", "quantity": 2}]}),
    );

    let items = assert_ok!(h.market.cart().fetch_cart().await);

    assert_eq!(items, vec![cart_line("1", "p1", 2)]);
    let (cart, status) = h.market.state(|s| (s.cart.cart.clone(), s.cart.status.clone())).await;
    assert_eq!(cart, vec![cart_line("1", "p1", 2)]);
    assert_eq!(status.loading, "");
    assert_eq!(status.alert_type, AlertType::Success);
}

#[tokio::test]
async fn add_then_delete_cart_items() {
    let h = harness();
    h.api.respond_ok(
        Method::Get,
        "/buyer/cart",
        json!({"data": [{"id": "1", "product_id": "p1", "quantity": 2}]}),
    );
    h.api.respond_ok(
        Method::Post,
        "/buyer/cart",
        json!({"data": {"id": "2", "product_id": "p2", "quantity": 1}, "message": "Added to cart"}),
    );
    h.api.respond_ok(Method::Delete, "/buyer/cart/1", json!({"message": "Removed"}));

    assert_ok!(h.market.cart().fetch_cart().await);
    assert_ok!(
        h.market
            .cart()
            .add_to_cart(NewCartItem {
                product_id: EntityId::from("p2"),
                quantity: 1,
            })
            .await
    );

    let cart = h.market.state(|s| s.cart.cart.clone()).await;
    assert_eq!(cart, vec![cart_line("1", "p1", 2), cart_line("2", "p2", 1)]);
    assert_eq!(h.market.state(|s| s.cart.status.message.clone()).await, "Added to cart");

    let removed = assert_ok!(h.market.cart().delete_cart_item(EntityId::from("1")).await);
    assert_eq!(removed, EntityId::from("1"));

    let cart = h.market.state(|s| s.cart.cart.clone()).await;
    assert_eq!(cart, vec![cart_line("2", "p2", 1)]);
    assert_eq!(h.api.last_request().unwrap().to_string(), "DELETE /buyer/cart/1");
}

#[tokio::test]
async fn rejected_update_leaves_cart_untouched() {
    let h = harness();
    h.api.respond_ok(
        Method::Get,
        "/buyer/cart",
        json!({"data": [{"id": "1", "product_id": "p1", "quantity": 2}]}),
    );
    h.api.respond_status(
        Method::Put,
        "/buyer/cart/1",
        400,
        json!({"message": "Only 1 left in stock"}),
    );

    assert_ok!(h.market.cart().fetch_cart().await);
    let failure = assert_err!(h.market.cart().update_cart_item(EntityId::from("1"), 5).await);

    assert_eq!(failure, Failure::new("Only 1 left in stock"));
    let state = h.market.state(Clone::clone).await;
    assert_eq!(state.cart.cart, vec![cart_line("1", "p1", 2)]);
    assert!(state.cart.status.error);
    assert_eq!(state.cart.status.alert_type, AlertType::Error);
    assert_eq!(state.cart.status.api_name, "cart/updateBuyerCart");
}

#[tokio::test]
async fn network_failure_uses_generic_message() {
    let h = harness();

    let failure = assert_err!(h.market.cart().fetch_wishlist().await);

    assert_eq!(failure.message, Failure::GENERIC_MESSAGE);
    assert!(h.market.state(|s| s.cart.wishlist.is_empty()).await);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn sign_in_persists_session() {
    let h = harness();
    script_sign_in(&h.api);

    let user = assert_ok!(h.market.auth().sign_in(credentials()).await);

    assert_eq!(user.name.as_deref(), Some("Ada"));
    assert_eq!(session::access_token(h.session.as_ref()).as_deref(), Some("tok-123"));
    assert_eq!(session::cached_user(h.session.as_ref()), Some(user.clone()));
    assert_eq!(h.market.state(|s| s.auth.user.clone()).await, Some(user));
}

#[tokio::test]
async fn failed_sign_in_leaves_session_untouched() {
    let h = harness();
    h.api.respond_status(
        Method::Post,
        "/auth/signin",
        401,
        json!({"message": "Invalid email or password"}),
    );

    let failure = assert_err!(h.market.auth().sign_in(credentials()).await);

    assert_eq!(failure.message, "Invalid email or password");
    assert!(h.session.is_empty());
    let status = h.market.state(|s| s.auth.status.clone()).await;
    assert_eq!(status.alert_type, AlertType::Error);
    assert!(h.market.state(|s| s.auth.user.is_none()).await);
}

#[tokio::test]
async fn restore_session_reads_cached_user() {
    let h = harness();
    script_sign_in(&h.api);
    assert_ok!(h.market.auth().sign_in(credentials()).await);

    let restarted = {
        let env = MarketplaceEnvironment::new(
            Arc::clone(&h.api) as Arc<dyn marketplace_core::environment::ApiClient>,
            Arc::clone(&h.session) as Arc<dyn SessionStorage>,
        );
        Marketplace::new(env)
    };
    let restored = assert_ok!(restarted.auth().restore_session().await);

    assert_eq!(restored.and_then(|user| user.email).as_deref(), Some("ada@example.com"));
    assert!(restarted.state(|s| s.auth.is_authenticated()).await);
}

#[tokio::test]
async fn authenticated_requests_carry_token_flag() {
    let h = harness();
    script_sign_in(&h.api);
    h.api.respond_ok(Method::Get, "/buyer/orders", json!({"data": []}));

    assert_ok!(h.market.auth().sign_in(credentials()).await);
    assert_ok!(h.market.orders().fetch_buyer_orders().await);

    let requests = h.api.requests();
    assert!(!requests[0].authenticated);
    assert!(requests[1].authenticated);
}

// ============================================================================
// Cross-slice rules
// ============================================================================

#[tokio::test]
async fn log_out_resets_every_slice_and_clears_session() {
    let h = harness();
    script_sign_in(&h.api);
    h.api.respond_ok(
        Method::Get,
        "/buyer/cart",
        json!({"data": [{"id": "1", "product_id": "p1", "quantity": 2}]}),
    );
    h.api.respond_ok(Method::Get, "/buyer/categories", json!({"data": [{"id": "c1"}]}));

    assert_ok!(h.market.auth().sign_in(credentials()).await);
    assert_ok!(h.market.cart().fetch_cart().await);
    assert_ok!(h.market.categories().fetch_categories().await);

    assert_ok!(h.market.auth().log_out().await);

    let state = h.market.state(Clone::clone).await;
    assert!(state.auth.user.is_none());
    assert!(state.cart.cart.is_empty());
    assert!(state.category.categories.is_empty());
    assert_eq!(state.auth.status.message, "Logged out successfully");
    assert!(h.session.is_empty());
}

#[tokio::test]
async fn response_arriving_after_logout_is_dropped() {
    let h = harness();
    h.api.respond_after(
        Method::Get,
        "/buyer/orders",
        Duration::from_millis(150),
        Ok(json!({"data": [{"id": "o1", "status": "pending"}]})),
    );

    let order_handle = h.market.orders();
    let (orders, logged_out) = futures::join!(order_handle.fetch_buyer_orders(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.market.auth().log_out().await
    });

    // The caller still sees its own result
    assert_eq!(assert_ok!(orders).len(), 1);
    assert_ok!(logged_out);
    assert!(h.market.state(|s| s.order.buyer_orders.is_empty()).await);
}

#[tokio::test]
async fn sign_in_racing_logout_leaves_no_session() {
    let h = harness();
    h.api.respond_after(
        Method::Post,
        "/auth/signin",
        Duration::from_millis(150),
        Ok(json!({
            "data": {"user": {"id": "u1", "role": "buyer"}, "access_token": "tok-123"}
        })),
    );

    let auth = h.market.auth();
    let (signed_in, logged_out) = futures::join!(auth.sign_in(credentials()), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        auth.log_out().await
    });

    assert_ok!(logged_out);
    let failure = assert_err!(signed_in);
    assert_eq!(failure.message, auth::SIGNED_OUT);
    assert!(h.market.state(|s| s.auth.user.is_none()).await);
    assert_eq!(h.session.get(session::ACCESS_TOKEN_KEY), None);
    assert_eq!(h.session.get(session::USER_KEY), None);
}

#[tokio::test]
async fn placed_order_empties_cart() {
    let h = harness();
    h.api.respond_ok(
        Method::Get,
        "/buyer/cart",
        json!({"data": [{"id": "1", "product_id": "p1", "quantity": 2, "price": 4.5}]}),
    );
    h.api.respond_ok(
        Method::Post,
        "/buyer/orders",
        json!({"data": {"id": "o9", "status": "pending", "total_amount": 9.0}, "message": "Order placed"}),
    );

    assert_ok!(h.market.cart().fetch_cart().await);
    assert!(
        (h.market.state(|s| derived::cart_total(&s.cart.cart)).await - 9.0).abs() < f64::EPSILON
    );

    let order = assert_ok!(
        h.market
            .orders()
            .place_order(NewOrder {
                items: vec![OrderLine {
                    product_id: EntityId::from("p1"),
                    quantity: 2,
                }],
                shipping_address: Some("1 Analytical St".to_string()),
                payment_method: Some("card".to_string()),
            })
            .await
    );

    assert_eq!(order.id, Some(EntityId::from("o9")));
    let state = h.market.state(Clone::clone).await;
    assert!(state.cart.cart.is_empty());
    assert_eq!(state.order.buyer_orders, vec![order]);
}

// ============================================================================
// Stale responses
// ============================================================================

async fn overlapping_fetches(policy: StalePolicy) -> (Vec<CartItem>, Vec<CartItem>) {
    let h = harness_with(policy, None);
    h.api.respond_after(
        Method::Get,
        "/buyer/cart",
        Duration::from_millis(150),
        Ok(json!({"data": [{"id": "old", "product_id": "p1", "quantity": 1}]})),
    );
    h.api.respond_ok(
        Method::Get,
        "/buyer/cart",
        json!({"data": [{"id": "new", "product_id": "p2", "quantity": 1}]}),
    );

    let cart = h.market.cart();
    let (first, second) = futures::join!(cart.fetch_cart(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.market.cart().fetch_cart().await
    });
    assert_ok!(second);

    (assert_ok!(first), h.market.state(|s| s.cart.cart.clone()).await)
}

#[tokio::test]
async fn latest_wins_ignores_superseded_response() {
    let (first, cart) = overlapping_fetches(StalePolicy::LatestWins).await;

    assert_eq!(first, vec![cart_line("old", "p1", 1)]);
    assert_eq!(cart, vec![cart_line("new", "p2", 1)]);
}

#[tokio::test]
async fn last_write_wins_applies_arrival_order() {
    let (_, cart) = overlapping_fetches(StalePolicy::LastWriteWins).await;

    assert_eq!(cart, vec![cart_line("old", "p1", 1)]);
}

// ============================================================================
// Alerts
// ============================================================================

#[tokio::test]
async fn alert_is_dismissed_after_delay() {
    let h = harness_with(StalePolicy::LatestWins, Some(Duration::from_millis(50)));
    h.api.respond_ok(Method::Get, "/buyer/categories", json!({"data": []}));

    assert_ok!(h.market.categories().fetch_categories().await);
    assert_eq!(
        h.market.state(|s| s.category.status.alert_type).await,
        AlertType::Success
    );

    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = h.market.state(|s| s.category.status.clone()).await;
    assert_eq!(status.alert_type, AlertType::None);
    assert!(status.message.is_empty());
}

#[tokio::test]
async fn clear_alert_and_reset_apply_immediately() {
    let h = harness();
    h.api.respond_status(Method::Get, "/seller/products", 500, json!({}));

    assert_err!(h.market.products().fetch_seller_products().await);
    assert!(h.market.state(|s| s.product.status.error).await);

    assert_ok!(h.market.products().clear_alert().await);
    assert!(!h.market.state(|s| s.product.status.error).await);

    assert_ok!(h.market.products().reset().await);
    assert_eq!(
        h.market.state(|s| s.product.clone()).await,
        marketplace_client::slices::product::ProductState::default()
    );
}

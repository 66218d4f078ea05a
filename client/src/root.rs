//! Root state, action and reducer
//!
//! Each slice reducer is scoped onto its field of [`MarketplaceState`] and
//! its variant of [`MarketplaceAction`]. Rules that span slices live here:
//!
//! - a completed logout resets every slice
//! - a successfully placed order empties the local cart

use crate::environment::MarketplaceEnvironment;
use crate::slices::auth::{AuthAction, AuthReducer, AuthState};
use crate::slices::cart::{CartAction, CartReducer, CartState};
use crate::slices::category::{CategoryAction, CategoryReducer, CategoryState};
use crate::slices::order::{OrderAction, OrderReducer, OrderState, PLACE_ORDER};
use crate::slices::payment::{PaymentAction, PaymentReducer, PaymentState};
use crate::slices::product::{ProductAction, ProductReducer, ProductState};
use crate::slices::review::{ReviewAction, ReviewReducer, ReviewState};
use crate::slices::user::{UserAction, UserReducer, UserState};
use marketplace_core::SmallVec;
use marketplace_core::composition::{BoxedReducer, CombinedReducer, combine_reducers, scope_reducer};
use marketplace_core::effect::Effect;
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{RequestId, StalePolicy};
use serde::{Deserialize, Serialize};

/// The whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceState {
    /// Session
    pub auth: AuthState,
    /// Cart and wishlist
    pub cart: CartState,
    /// Categories and subcategories
    pub category: CategoryState,
    /// Orders
    pub order: OrderState,
    /// Payments
    pub payment: PaymentState,
    /// Products
    pub product: ProductState,
    /// Reviews
    pub review: ReviewState,
    /// Profile
    pub user: UserState,
    /// Responses to requests older than this were dispatched before the last logout
    #[serde(skip)]
    logged_out_at: Option<RequestId>,
}

impl MarketplaceState {
    /// Whether any slice has a request in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        [
            &self.auth.status,
            &self.cart.status,
            &self.category.status,
            &self.order.status,
            &self.payment.status,
            &self.product.status,
            &self.review.status,
            &self.user.status,
        ]
        .iter()
        .any(|status| status.is_loading())
    }
}

/// Root action: one variant per slice
#[derive(Debug, Clone, PartialEq)]
pub enum MarketplaceAction {
    /// Auth slice
    Auth(AuthAction),
    /// Cart slice
    Cart(CartAction),
    /// Category slice
    Category(CategoryAction),
    /// Order slice
    Order(OrderAction),
    /// Payment slice
    Payment(PaymentAction),
    /// Product slice
    Product(ProductAction),
    /// Review slice
    Review(ReviewAction),
    /// User slice
    User(UserAction),
}

impl MarketplaceAction {
    /// Correlation id of a settled event, `None` for commands
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::Auth(action) => action.settled_request(),
            Self::Cart(action) => action.settled_request(),
            Self::Category(action) => action.settled_request(),
            Self::Order(action) => action.settled_request(),
            Self::Payment(action) => action.settled_request(),
            Self::Product(action) => action.settled_request(),
            Self::Review(action) => action.settled_request(),
            Self::User(action) => action.settled_request(),
        }
    }
}

macro_rules! scoped {
    ($reducer:expr, $field:ident, $variant:ident) => {
        Box::new(scope_reducer(
            $reducer,
            |state: &mut MarketplaceState| &mut state.$field,
            |action| match action {
                MarketplaceAction::$variant(action) => Some(action),
                _ => None,
            },
            MarketplaceAction::$variant,
        )) as BoxedReducer<MarketplaceState, MarketplaceAction, MarketplaceEnvironment>
    };
}

/// Root reducer
pub struct MarketplaceReducer {
    slices: CombinedReducer<MarketplaceState, MarketplaceAction, MarketplaceEnvironment>,
}

impl MarketplaceReducer {
    /// Scope and combine the eight slice reducers
    #[must_use]
    pub fn new() -> Self {
        Self {
            slices: combine_reducers(vec![
                scoped!(AuthReducer::new(), auth, Auth),
                scoped!(CartReducer::new(), cart, Cart),
                scoped!(CategoryReducer::new(), category, Category),
                scoped!(OrderReducer::new(), order, Order),
                scoped!(PaymentReducer::new(), payment, Payment),
                scoped!(ProductReducer::new(), product, Product),
                scoped!(ReviewReducer::new(), review, Review),
                scoped!(UserReducer::new(), user, User),
            ]),
        }
    }
}

impl Default for MarketplaceReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for MarketplaceReducer {
    type State = MarketplaceState;
    type Action = MarketplaceAction;
    type Environment = MarketplaceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if env.stale_policy == StalePolicy::LatestWins
            && predates_logout(state.logged_out_at, action.settled_request())
        {
            tracing::debug!("Ignored response to a request sent before logout");
            return SmallVec::new();
        }

        let logged_out = match &action {
            MarketplaceAction::Auth(auth) if auth.is_logged_out() => auth.settled_request(),
            _ => None,
        };
        let order_placed = match &action {
            MarketplaceAction::Order(order) if order.is_order_placed() => {
                order.settled_request().is_some_and(|request| {
                    state.order.status.accepts(&PLACE_ORDER, request, env.stale_policy)
                })
            },
            _ => false,
        };

        let effects = self.slices.reduce(state, action, env);

        if order_placed {
            merge::replace(&mut state.cart.cart, Vec::new());
            tracing::debug!("Order placed; emptied local cart");
        }

        if let Some(request) = logged_out {
            let auth_status = std::mem::take(&mut state.auth.status);
            *state = MarketplaceState {
                logged_out_at: Some(request),
                ..MarketplaceState::default()
            };
            state.auth.status = auth_status;
            tracing::info!("Logged out; reset every slice");
        }

        effects
    }
}

fn predates_logout(logged_out_at: Option<RequestId>, settled: Option<RequestId>) -> bool {
    match (logged_out_at, settled) {
        (Some(logout), Some(request)) => request < logout,
        _ => false,
    }
}

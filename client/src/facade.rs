//! Typed facade over the store
//!
//! Each method allocates a [`RequestId`], dispatches the command and waits
//! for the settled event carrying that id. Callers get `Result<T, Failure>`
//! back instead of inspecting the action that came out of the store:
//!
//! ```ignore
//! let marketplace = Marketplace::from_config(&ClientConfig::from_env()?)?;
//!
//! match marketplace.cart().fetch_cart().await {
//!     Ok(items) => println!("{} items", items.len()),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```
//!
//! The store state has already absorbed the result when a method returns.

use crate::config::ClientConfig;
use crate::environment::MarketplaceEnvironment;
use crate::http::HttpClient;
use crate::root::{MarketplaceAction, MarketplaceReducer, MarketplaceState};
use crate::session::FileSessionStorage;
use crate::slices::auth::AuthAction;
use crate::slices::cart::CartAction;
use crate::slices::category::CategoryAction;
use crate::slices::order::OrderAction;
use crate::slices::payment::PaymentAction;
use crate::slices::product::ProductAction;
use crate::slices::review::ReviewAction;
use crate::slices::user::UserAction;
use crate::types::{
    CartItem, Category, CategoryForm, Credentials, EntityId, NewCartItem, NewOrder, NewPayment,
    NewProduct, NewReview, NewSubcategory, Order, OrderStatusUpdate, PasswordChange,
    PasswordReset, Payment, Product, ProductQuery, ProductUpdate, ProfileUpdate, Review,
    ReviewUpdate, Role, SignUp, Subcategory, User, WishlistItem,
};
use marketplace_core::environment::{MemorySessionStorage, SessionStorage};
use marketplace_core::http::Failure;
use marketplace_core::slice::{RequestId, RequestIds};
use marketplace_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// The store type behind [`Marketplace`]
pub type MarketplaceStore =
    Store<MarketplaceState, MarketplaceAction, MarketplaceEnvironment, MarketplaceReducer>;

/// How long a facade call waits for its settled event by default
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Extract the outcome of one settled event variant
macro_rules! settled {
    ($slice:ident, $event:path) => {
        |action| match action {
            MarketplaceAction::$slice($event(settled)) => Some(settled.into_result()),
            _ => None,
        }
    };
}

/// Entry point for views
#[derive(Clone)]
pub struct Marketplace {
    store: MarketplaceStore,
    ids: Arc<RequestIds>,
    timeout: Duration,
}

impl Marketplace {
    /// Start an empty store over `environment`
    #[must_use]
    pub fn new(environment: MarketplaceEnvironment) -> Self {
        Self {
            store: Store::new(
                MarketplaceState::default(),
                MarketplaceReducer::new(),
                environment,
            ),
            ids: Arc::new(RequestIds::new()),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Change how long calls wait for their result
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wire the HTTP client, session storage and store from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be opened or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ClientConfig) -> crate::error::Result<Self> {
        let session: Arc<dyn SessionStorage> = match &config.session_file {
            Some(path) => Arc::new(FileSessionStorage::open(path)?),
            None => Arc::new(MemorySessionStorage::new()),
        };
        let api = HttpClient::new(&config.api_url, config.api_timeout(), Arc::clone(&session))?;

        tracing::info!(
            api_url = %config.api_url,
            stale_policy = ?config.stale_policy,
            persistent_session = config.session_file.is_some(),
            "Marketplace client configured"
        );

        let environment = MarketplaceEnvironment::new(Arc::new(api), session)
            .with_stale_policy(config.stale_policy)
            .with_alert_dismiss(config.alert_dismiss());
        Ok(Self::new(environment).with_timeout(config.request_timeout()))
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &MarketplaceStore {
        &self.store
    }

    /// Read the current state
    pub async fn state<T>(&self, f: impl FnOnce(&MarketplaceState) -> T) -> T {
        self.store.state(f).await
    }

    /// Stop accepting commands and wait for in-flight requests
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if requests are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    /// Sign-in, sign-up, password recovery and logout
    #[must_use]
    pub const fn auth(&self) -> AuthHandle<'_> {
        AuthHandle { market: self }
    }

    /// Cart and wishlist
    #[must_use]
    pub const fn cart(&self) -> CartHandle<'_> {
        CartHandle { market: self }
    }

    /// Categories and subcategories
    #[must_use]
    pub const fn categories(&self) -> CategoryHandle<'_> {
        CategoryHandle { market: self }
    }

    /// Buyer and seller orders
    #[must_use]
    pub const fn orders(&self) -> OrderHandle<'_> {
        OrderHandle { market: self }
    }

    /// Payments
    #[must_use]
    pub const fn payments(&self) -> PaymentHandle<'_> {
        PaymentHandle { market: self }
    }

    /// Catalogue and seller products
    #[must_use]
    pub const fn products(&self) -> ProductHandle<'_> {
        ProductHandle { market: self }
    }

    /// Reviews
    #[must_use]
    pub const fn reviews(&self) -> ReviewHandle<'_> {
        ReviewHandle { market: self }
    }

    /// Profile and password
    #[must_use]
    pub const fn users(&self) -> UserHandle<'_> {
        UserHandle { market: self }
    }

    /// Dispatch one command and wait for the event that settles it
    async fn dispatch<T>(
        &self,
        command: impl FnOnce(RequestId) -> MarketplaceAction,
        extract: fn(MarketplaceAction) -> Option<Result<T, Failure>>,
    ) -> Result<T, Failure> {
        let request = self.ids.next();
        let outcome = self
            .store
            .send_and_wait_for(
                command(request),
                |action| action.settled_request() == Some(request),
                self.timeout,
            )
            .await;

        match outcome {
            Ok(action) => extract(action).unwrap_or_else(|| {
                tracing::error!(%request, "Request settled with an unexpected event");
                Err(Failure::generic())
            }),
            Err(error) => {
                tracing::warn!(%request, error = %error, "Request did not settle");
                Err(Failure::generic())
            },
        }
    }

    /// Dispatch an action that settles synchronously
    async fn notify(&self, action: MarketplaceAction) -> Result<(), StoreError> {
        self.store.send(action).await.map(|_| ())
    }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("timeout", &self.timeout)
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}

/// Auth operations
#[derive(Clone, Copy)]
pub struct AuthHandle<'a> {
    market: &'a Marketplace,
}

impl AuthHandle<'_> {
    /// Sign in and persist the session
    ///
    /// # Errors
    ///
    /// Returns the server's message on bad credentials.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<User, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Auth(AuthAction::SignIn { request, credentials }),
                settled!(Auth, AuthAction::SignedIn),
            )
            .await
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns the server's message if registration is refused.
    pub async fn sign_up(&self, form: SignUp) -> Result<(), Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Auth(AuthAction::SignUp { request, form }),
                settled!(Auth, AuthAction::SignedUp),
            )
            .await
    }

    /// Request a password reset email
    ///
    /// # Errors
    ///
    /// Returns the server's message if the email is unknown.
    pub async fn forgot_password(&self, email: impl Into<String>) -> Result<(), Failure> {
        let email = email.into();
        self.market
            .dispatch(
                |request| MarketplaceAction::Auth(AuthAction::ForgotPassword { request, email }),
                settled!(Auth, AuthAction::ResetEmailSent),
            )
            .await
    }

    /// Set a new password with a reset token
    ///
    /// # Errors
    ///
    /// Returns the server's message if the token is invalid or expired.
    pub async fn reset_password(&self, reset: PasswordReset) -> Result<(), Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Auth(AuthAction::ResetPassword { request, reset }),
                settled!(Auth, AuthAction::PasswordReset),
            )
            .await
    }

    /// Load the cached user from the session, if any
    ///
    /// # Errors
    ///
    /// Only fails if the store is shutting down.
    pub async fn restore_session(&self) -> Result<Option<User>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Auth(AuthAction::RestoreSession { request }),
                settled!(Auth, AuthAction::SessionRestored),
            )
            .await
    }

    /// Clear the session and reset every slice
    ///
    /// # Errors
    ///
    /// Returns a failure if the session could not be cleared; state is kept.
    pub async fn log_out(&self) -> Result<(), Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Auth(AuthAction::LogOut { request }),
                settled!(Auth, AuthAction::LoggedOut),
            )
            .await
    }

    /// Clear the auth banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Auth(AuthAction::ClearAlert))
            .await
    }

    /// Return the auth slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market.notify(MarketplaceAction::Auth(AuthAction::Reset)).await
    }
}

/// Cart and wishlist operations
#[derive(Clone, Copy)]
pub struct CartHandle<'a> {
    market: &'a Marketplace,
}

impl CartHandle<'_> {
    /// Load the cart
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_cart(&self) -> Result<Vec<CartItem>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Cart(CartAction::FetchCart { request }),
                settled!(Cart, CartAction::CartFetched),
            )
            .await
    }

    /// Add a product to the cart
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Cart(CartAction::AddToCart { request, item }),
                settled!(Cart, CartAction::CartItemAdded),
            )
            .await
    }

    /// Change a line's quantity
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn update_cart_item(&self, id: EntityId, quantity: u32) -> Result<CartItem, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Cart(CartAction::UpdateCartItem {
                        request,
                        id,
                        quantity,
                    })
                },
                settled!(Cart, CartAction::CartItemUpdated),
            )
            .await
    }

    /// Remove a line; resolves to the removed id
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn delete_cart_item(&self, id: EntityId) -> Result<EntityId, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Cart(CartAction::DeleteCartItem { request, id }),
                settled!(Cart, CartAction::CartItemDeleted),
            )
            .await
    }

    /// Load the wishlist
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Cart(CartAction::FetchWishlist { request }),
                settled!(Cart, CartAction::WishlistFetched),
            )
            .await
    }

    /// Add a product to the wishlist
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn add_to_wishlist(&self, product_id: EntityId) -> Result<WishlistItem, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Cart(CartAction::AddToWishlist {
                        request,
                        product_id,
                    })
                },
                settled!(Cart, CartAction::WishlistItemAdded),
            )
            .await
    }

    /// Remove a wishlist entry; resolves to the removed id
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn remove_from_wishlist(&self, id: EntityId) -> Result<EntityId, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Cart(CartAction::RemoveFromWishlist { request, id }),
                settled!(Cart, CartAction::WishlistItemRemoved),
            )
            .await
    }

    /// Clear the cart banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Cart(CartAction::ClearAlert))
            .await
    }

    /// Return the cart slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market.notify(MarketplaceAction::Cart(CartAction::Reset)).await
    }
}

/// Category operations
#[derive(Clone, Copy)]
pub struct CategoryHandle<'a> {
    market: &'a Marketplace,
}

impl CategoryHandle<'_> {
    /// Load every category
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Category(CategoryAction::FetchCategories { request }),
                settled!(Category, CategoryAction::CategoriesFetched),
            )
            .await
    }

    /// Create a category
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn create_category(&self, form: CategoryForm) -> Result<Category, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Category(CategoryAction::CreateCategory { request, form })
                },
                settled!(Category, CategoryAction::CategoryCreated),
            )
            .await
    }

    /// Rename or redescribe a category
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn update_category(
        &self,
        id: EntityId,
        form: CategoryForm,
    ) -> Result<Category, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Category(CategoryAction::UpdateCategory {
                        request,
                        id,
                        form,
                    })
                },
                settled!(Category, CategoryAction::CategoryUpdated),
            )
            .await
    }

    /// Delete a category; resolves to the removed id
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn delete_category(&self, id: EntityId) -> Result<EntityId, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Category(CategoryAction::DeleteCategory { request, id })
                },
                settled!(Category, CategoryAction::CategoryDeleted),
            )
            .await
    }

    /// Load the subcategories of one category
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_subcategories(
        &self,
        category_id: EntityId,
    ) -> Result<Vec<Subcategory>, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Category(CategoryAction::FetchSubcategories {
                        request,
                        category_id,
                    })
                },
                settled!(Category, CategoryAction::SubcategoriesFetched),
            )
            .await
    }

    /// Create a subcategory
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn create_subcategory(&self, form: NewSubcategory) -> Result<Subcategory, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Category(CategoryAction::CreateSubcategory {
                        request,
                        form,
                    })
                },
                settled!(Category, CategoryAction::SubcategoryCreated),
            )
            .await
    }

    /// Delete a subcategory; resolves to the removed id
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn delete_subcategory(&self, id: EntityId) -> Result<EntityId, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Category(CategoryAction::DeleteSubcategory { request, id })
                },
                settled!(Category, CategoryAction::SubcategoryDeleted),
            )
            .await
    }

    /// Clear the category banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Category(CategoryAction::ClearAlert))
            .await
    }

    /// Return the category slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Category(CategoryAction::Reset))
            .await
    }
}

/// Order operations
#[derive(Clone, Copy)]
pub struct OrderHandle<'a> {
    market: &'a Marketplace,
}

impl OrderHandle<'_> {
    /// Load the buyer's orders
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_buyer_orders(&self) -> Result<Vec<Order>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Order(OrderAction::FetchBuyerOrders { request }),
                settled!(Order, OrderAction::BuyerOrdersFetched),
            )
            .await
    }

    /// Load one order
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_order_detail(&self, id: EntityId) -> Result<Order, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Order(OrderAction::FetchOrderDetail { request, id }),
                settled!(Order, OrderAction::OrderDetailFetched),
            )
            .await
    }

    /// Place an order; the local cart is emptied on success
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Order(OrderAction::PlaceOrder { request, order }),
                settled!(Order, OrderAction::OrderPlaced),
            )
            .await
    }

    /// Cancel one of the buyer's orders
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn cancel_order(&self, id: EntityId) -> Result<Order, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Order(OrderAction::CancelOrder { request, id }),
                settled!(Order, OrderAction::OrderCancelled),
            )
            .await
    }

    /// Load orders containing the seller's products
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_seller_orders(&self) -> Result<Vec<Order>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Order(OrderAction::FetchSellerOrders { request }),
                settled!(Order, OrderAction::SellerOrdersFetched),
            )
            .await
    }

    /// Move an order to a new status
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn update_order_status(
        &self,
        id: EntityId,
        update: OrderStatusUpdate,
    ) -> Result<Order, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Order(OrderAction::UpdateOrderStatus {
                        request,
                        id,
                        update,
                    })
                },
                settled!(Order, OrderAction::OrderStatusUpdated),
            )
            .await
    }

    /// Clear the order banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Order(OrderAction::ClearAlert))
            .await
    }

    /// Return the order slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market.notify(MarketplaceAction::Order(OrderAction::Reset)).await
    }
}

/// Payment operations
#[derive(Clone, Copy)]
pub struct PaymentHandle<'a> {
    market: &'a Marketplace,
}

impl PaymentHandle<'_> {
    /// Pay for an order
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn create_payment(&self, payment: NewPayment) -> Result<Payment, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Payment(PaymentAction::CreatePayment { request, payment })
                },
                settled!(Payment, PaymentAction::PaymentCreated),
            )
            .await
    }

    /// Load the buyer's payments
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_payments(&self) -> Result<Vec<Payment>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Payment(PaymentAction::FetchPayments { request }),
                settled!(Payment, PaymentAction::PaymentsFetched),
            )
            .await
    }

    /// Load one payment
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_payment_detail(&self, id: EntityId) -> Result<Payment, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Payment(PaymentAction::FetchPaymentDetail { request, id })
                },
                settled!(Payment, PaymentAction::PaymentDetailFetched),
            )
            .await
    }

    /// Load payments received by the seller
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_seller_payments(&self) -> Result<Vec<Payment>, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Payment(PaymentAction::FetchSellerPayments { request })
                },
                settled!(Payment, PaymentAction::SellerPaymentsFetched),
            )
            .await
    }

    /// Clear the payment banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Payment(PaymentAction::ClearAlert))
            .await
    }

    /// Return the payment slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Payment(PaymentAction::Reset))
            .await
    }
}

/// Product operations
#[derive(Clone, Copy)]
pub struct ProductHandle<'a> {
    market: &'a Marketplace,
}

impl ProductHandle<'_> {
    /// Search the catalogue
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_products(&self, query: ProductQuery) -> Result<Vec<Product>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Product(ProductAction::FetchProducts { request, query }),
                settled!(Product, ProductAction::ProductsFetched),
            )
            .await
    }

    /// Load one product
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_product_detail(&self, id: EntityId) -> Result<Product, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Product(ProductAction::FetchProductDetail { request, id })
                },
                settled!(Product, ProductAction::ProductDetailFetched),
            )
            .await
    }

    /// Load the seller's own products
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_seller_products(&self) -> Result<Vec<Product>, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Product(ProductAction::FetchSellerProducts { request })
                },
                settled!(Product, ProductAction::SellerProductsFetched),
            )
            .await
    }

    /// List a new product, uploading its images
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Product(ProductAction::CreateProduct { request, product })
                },
                settled!(Product, ProductAction::ProductCreated),
            )
            .await
    }

    /// Edit a product
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn update_product(
        &self,
        id: EntityId,
        update: ProductUpdate,
    ) -> Result<Product, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Product(ProductAction::UpdateProduct {
                        request,
                        id,
                        update,
                    })
                },
                settled!(Product, ProductAction::ProductUpdated),
            )
            .await
    }

    /// Delist a product; resolves to the removed id
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn delete_product(&self, id: EntityId) -> Result<EntityId, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Product(ProductAction::DeleteProduct { request, id }),
                settled!(Product, ProductAction::ProductDeleted),
            )
            .await
    }

    /// Clear the product banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Product(ProductAction::ClearAlert))
            .await
    }

    /// Return the product slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Product(ProductAction::Reset))
            .await
    }
}

/// Review operations
#[derive(Clone, Copy)]
pub struct ReviewHandle<'a> {
    market: &'a Marketplace,
}

impl ReviewHandle<'_> {
    /// Load a product's reviews
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_product_reviews(&self, product_id: EntityId) -> Result<Vec<Review>, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Review(ReviewAction::FetchProductReviews {
                        request,
                        product_id,
                    })
                },
                settled!(Review, ReviewAction::ProductReviewsFetched),
            )
            .await
    }

    /// Post a review
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn add_review(&self, review: NewReview) -> Result<Review, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Review(ReviewAction::AddReview { request, review }),
                settled!(Review, ReviewAction::ReviewAdded),
            )
            .await
    }

    /// Edit a review
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn update_review(&self, id: EntityId, update: ReviewUpdate) -> Result<Review, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::Review(ReviewAction::UpdateReview {
                        request,
                        id,
                        update,
                    })
                },
                settled!(Review, ReviewAction::ReviewUpdated),
            )
            .await
    }

    /// Delete a review; resolves to the removed id
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn delete_review(&self, id: EntityId) -> Result<EntityId, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Review(ReviewAction::DeleteReview { request, id }),
                settled!(Review, ReviewAction::ReviewDeleted),
            )
            .await
    }

    /// Load reviews of the seller's products
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_seller_reviews(&self) -> Result<Vec<Review>, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::Review(ReviewAction::FetchSellerReviews { request }),
                settled!(Review, ReviewAction::SellerReviewsFetched),
            )
            .await
    }

    /// Clear the review banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Review(ReviewAction::ClearAlert))
            .await
    }

    /// Return the review slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::Review(ReviewAction::Reset))
            .await
    }
}

/// Profile operations
#[derive(Clone, Copy)]
pub struct UserHandle<'a> {
    market: &'a Marketplace,
}

impl UserHandle<'_> {
    /// Load the profile from the `role` endpoints
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn fetch_profile(&self, role: Role) -> Result<User, Failure> {
        self.market
            .dispatch(
                |request| MarketplaceAction::User(UserAction::FetchProfile { request, role }),
                settled!(User, UserAction::ProfileFetched),
            )
            .await
    }

    /// Edit the profile and refresh the cached session user
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn update_profile(&self, role: Role, update: ProfileUpdate) -> Result<User, Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::User(UserAction::UpdateProfile {
                        request,
                        role,
                        update,
                    })
                },
                settled!(User, UserAction::ProfileUpdated),
            )
            .await
    }

    /// Change the password
    ///
    /// # Errors
    ///
    /// Returns the server's message if the current password is wrong.
    pub async fn change_password(&self, role: Role, change: PasswordChange) -> Result<(), Failure> {
        self.market
            .dispatch(
                |request| {
                    MarketplaceAction::User(UserAction::ChangePassword {
                        request,
                        role,
                        change,
                    })
                },
                settled!(User, UserAction::PasswordChanged),
            )
            .await
    }

    /// Clear the profile banner
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_alert(&self) -> Result<(), StoreError> {
        self.market
            .notify(MarketplaceAction::User(UserAction::ClearAlert))
            .await
    }

    /// Return the user slice to its initial state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.market.notify(MarketplaceAction::User(UserAction::Reset)).await
    }
}

//! Product catalog (buyer view) and product listings (seller view)

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_ack, remote_json};
use crate::types::{EntityId, NewProduct, Product, ProductQuery, ProductUpdate};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::{ApiRequest, FormPart};
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};

/// GET `/buyer/products`
pub const FETCH_PRODUCTS: Operation =
    Operation::new("product/fetchProducts", "Products fetched successfully");
/// GET `/buyer/products/{id}`
pub const FETCH_PRODUCT_DETAIL: Operation =
    Operation::new("product/fetchProductDetail", "Product fetched successfully");
/// GET `/seller/products`
pub const FETCH_SELLER_PRODUCTS: Operation =
    Operation::new("product/fetchSellerProducts", "Products fetched successfully");
/// POST `/seller/products`
pub const CREATE_PRODUCT: Operation =
    Operation::new("product/createProduct", "Product created successfully");
/// PUT `/seller/products/{id}`
pub const UPDATE_PRODUCT: Operation =
    Operation::new("product/updateProduct", "Product updated successfully");
/// DELETE `/seller/products/{id}`
pub const DELETE_PRODUCT: Operation =
    Operation::new("product/deleteProduct", "Product deleted successfully");

/// Product slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductState {
    /// Catalog page, as filtered by the last query
    pub products: Vec<Product>,
    /// The seller's own listings
    pub seller_products: Vec<Product>,
    /// Product shown on the detail page
    pub product_detail: Option<Product>,
    /// Request lifecycle
    pub status: SliceStatus,
}

/// Product slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAction {
    /// Load a catalog page
    FetchProducts {
        /// Correlation id
        request: RequestId,
        /// Filters
        query: ProductQuery,
    },
    /// Catalog page loaded
    ProductsFetched(Settled<Vec<Product>>),
    /// Load one product
    FetchProductDetail {
        /// Correlation id
        request: RequestId,
        /// Product id
        id: EntityId,
    },
    /// Product loaded
    ProductDetailFetched(Settled<Product>),
    /// Load the seller's listings
    FetchSellerProducts {
        /// Correlation id
        request: RequestId,
    },
    /// Listings loaded
    SellerProductsFetched(Settled<Vec<Product>>),
    /// List a new product
    CreateProduct {
        /// Correlation id
        request: RequestId,
        /// Listing form with images
        product: NewProduct,
    },
    /// Product listed
    ProductCreated(Settled<Product>),
    /// Edit a listing
    UpdateProduct {
        /// Correlation id
        request: RequestId,
        /// Product id
        id: EntityId,
        /// Changed fields
        update: ProductUpdate,
    },
    /// Listing edited
    ProductUpdated(Settled<Product>),
    /// Remove a listing
    DeleteProduct {
        /// Correlation id
        request: RequestId,
        /// Product id
        id: EntityId,
    },
    /// Listing removed
    ProductDeleted(Settled<EntityId>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl ProductAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::ProductsFetched(Settled { request, .. })
            | Self::ProductDetailFetched(Settled { request, .. })
            | Self::SellerProductsFetched(Settled { request, .. })
            | Self::ProductCreated(Settled { request, .. })
            | Self::ProductUpdated(Settled { request, .. })
            | Self::ProductDeleted(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }
}

/// Product slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductReducer;

impl ProductReducer {
    /// Create a new product reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ProductReducer {
    type State = ProductState;
    type Action = ProductAction;
    type Environment = MarketplaceEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle event
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = ProductAction::ClearAlert;

        match action {
            ProductAction::FetchProducts { request, query } => {
                let call = query
                    .pairs()
                    .into_iter()
                    .fold(ApiRequest::get("/buyer/products"), |call, (key, value)| {
                        call.query(key, value)
                    });
                begin(
                    status,
                    &FETCH_PRODUCTS,
                    request,
                    remote(env, request, call, ProductAction::ProductsFetched),
                )
            },
            ProductAction::ProductsFetched(settled) => {
                settle(status, &FETCH_PRODUCTS, settled, env, clear, |products| {
                    merge::replace(&mut state.products, products);
                })
            },

            ProductAction::FetchProductDetail { request, id } => begin(
                status,
                &FETCH_PRODUCT_DETAIL,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get(format!("/buyer/products/{id}")),
                    ProductAction::ProductDetailFetched,
                ),
            ),
            ProductAction::ProductDetailFetched(settled) => {
                settle(status, &FETCH_PRODUCT_DETAIL, settled, env, clear, |product| {
                    state.product_detail = Some(product);
                })
            },

            ProductAction::FetchSellerProducts { request } => begin(
                status,
                &FETCH_SELLER_PRODUCTS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/seller/products"),
                    ProductAction::SellerProductsFetched,
                ),
            ),
            ProductAction::SellerProductsFetched(settled) => {
                settle(status, &FETCH_SELLER_PRODUCTS, settled, env, clear, |products| {
                    merge::replace(&mut state.seller_products, products);
                })
            },

            ProductAction::CreateProduct { request, product } => begin(
                status,
                &CREATE_PRODUCT,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::post("/seller/products").multipart(form_parts(product)),
                    ProductAction::ProductCreated,
                ),
            ),
            ProductAction::ProductCreated(settled) => {
                settle(status, &CREATE_PRODUCT, settled, env, clear, |product| {
                    merge::append(&mut state.seller_products, product);
                })
            },

            ProductAction::UpdateProduct {
                request,
                id,
                update,
            } => begin(
                status,
                &UPDATE_PRODUCT,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::put(format!("/seller/products/{id}")),
                    &update,
                    ProductAction::ProductUpdated,
                ),
            ),
            ProductAction::ProductUpdated(settled) => {
                settle(status, &UPDATE_PRODUCT, settled, env, clear, |product| {
                    merge::refresh_detail(&mut state.product_detail, &product);
                    merge::map_replace(&mut state.products, product.clone());
                    merge::map_replace(&mut state.seller_products, product);
                })
            },

            ProductAction::DeleteProduct { request, id } => begin(
                status,
                &DELETE_PRODUCT,
                request,
                remote_ack(
                    env,
                    request,
                    ApiRequest::delete(format!("/seller/products/{id}")),
                    id,
                    ProductAction::ProductDeleted,
                ),
            ),
            ProductAction::ProductDeleted(settled) => {
                settle(status, &DELETE_PRODUCT, settled, env, clear, |id| {
                    merge::filter_out(&mut state.seller_products, &id);
                    merge::filter_out(&mut state.products, &id);
                    if state
                        .product_detail
                        .as_ref()
                        .is_some_and(|detail| merge::Identified::has_id(detail, &id))
                    {
                        state.product_detail = None;
                    }
                })
            },

            ProductAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            ProductAction::Reset => {
                *state = ProductState::default();
                SmallVec::new()
            },
        }
    }
}

/// Multipart fields of a new listing; every image goes under `images`
fn form_parts(product: NewProduct) -> Vec<FormPart> {
    let mut parts = vec![
        FormPart::text("name", product.name),
        FormPart::text("description", product.description),
        FormPart::text("price", product.price.to_string()),
        FormPart::text("stock", product.stock.to_string()),
    ];
    if let Some(category) = product.category_id {
        parts.push(FormPart::text("category_id", category.to_string()));
    }
    if let Some(subcategory) = product.subcategory_id {
        parts.push(FormPart::text("subcategory_id", subcategory.to_string()));
    }
    parts.extend(product.images.into_iter().map(|image| FormPart::File {
        name: "images".to_string(),
        file_name: image.file_name,
        mime: image.mime,
        bytes: image.bytes,
    }));
    parts
}

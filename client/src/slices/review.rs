//! Product reviews

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_ack, remote_json};
use crate::types::{EntityId, NewReview, Review, ReviewUpdate};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::ApiRequest;
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};

/// GET `/buyer/products/{id}/reviews`
pub const FETCH_PRODUCT_REVIEWS: Operation =
    Operation::new("review/fetchProductReviews", "Reviews fetched successfully");
/// POST `/buyer/reviews`
pub const ADD_REVIEW: Operation = Operation::new("review/addReview", "Review added successfully");
/// PUT `/buyer/reviews/{id}`
pub const UPDATE_REVIEW: Operation =
    Operation::new("review/updateReview", "Review updated successfully");
/// DELETE `/buyer/reviews/{id}`
pub const DELETE_REVIEW: Operation =
    Operation::new("review/deleteReview", "Review deleted successfully");
/// GET `/seller/reviews`
pub const FETCH_SELLER_REVIEWS: Operation =
    Operation::new("review/fetchSellerReviews", "Reviews fetched successfully");

/// Review slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Reviews of the product last fetched
    pub reviews: Vec<Review>,
    /// Reviews of the seller's products
    pub seller_reviews: Vec<Review>,
    /// Request lifecycle
    pub status: SliceStatus,
}

/// Review slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewAction {
    /// Load a product's reviews
    FetchProductReviews {
        /// Correlation id
        request: RequestId,
        /// Product id
        product_id: EntityId,
    },
    /// Reviews loaded
    ProductReviewsFetched(Settled<Vec<Review>>),
    /// Post a review
    AddReview {
        /// Correlation id
        request: RequestId,
        /// Review form
        review: NewReview,
    },
    /// Review posted
    ReviewAdded(Settled<Review>),
    /// Edit a review
    UpdateReview {
        /// Correlation id
        request: RequestId,
        /// Review id
        id: EntityId,
        /// Changed fields
        update: ReviewUpdate,
    },
    /// Review edited
    ReviewUpdated(Settled<Review>),
    /// Delete a review
    DeleteReview {
        /// Correlation id
        request: RequestId,
        /// Review id
        id: EntityId,
    },
    /// Review deleted
    ReviewDeleted(Settled<EntityId>),
    /// Load reviews of the seller's products
    FetchSellerReviews {
        /// Correlation id
        request: RequestId,
    },
    /// Seller reviews loaded
    SellerReviewsFetched(Settled<Vec<Review>>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl ReviewAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::ProductReviewsFetched(Settled { request, .. })
            | Self::ReviewAdded(Settled { request, .. })
            | Self::ReviewUpdated(Settled { request, .. })
            | Self::ReviewDeleted(Settled { request, .. })
            | Self::SellerReviewsFetched(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }
}

/// Review slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewReducer;

impl ReviewReducer {
    /// Create a new review reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ReviewReducer {
    type State = ReviewState;
    type Action = ReviewAction;
    type Environment = MarketplaceEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle event
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = ReviewAction::ClearAlert;

        match action {
            ReviewAction::FetchProductReviews {
                request,
                product_id,
            } => begin(
                status,
                &FETCH_PRODUCT_REVIEWS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get(format!("/buyer/products/{product_id}/reviews")),
                    ReviewAction::ProductReviewsFetched,
                ),
            ),
            ReviewAction::ProductReviewsFetched(settled) => {
                settle(status, &FETCH_PRODUCT_REVIEWS, settled, env, clear, |reviews| {
                    merge::replace(&mut state.reviews, reviews);
                })
            },

            ReviewAction::AddReview { request, review } => begin(
                status,
                &ADD_REVIEW,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/buyer/reviews"),
                    &review,
                    ReviewAction::ReviewAdded,
                ),
            ),
            ReviewAction::ReviewAdded(settled) => {
                settle(status, &ADD_REVIEW, settled, env, clear, |review| {
                    merge::append(&mut state.reviews, review);
                })
            },

            ReviewAction::UpdateReview {
                request,
                id,
                update,
            } => begin(
                status,
                &UPDATE_REVIEW,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::put(format!("/buyer/reviews/{id}")),
                    &update,
                    ReviewAction::ReviewUpdated,
                ),
            ),
            ReviewAction::ReviewUpdated(settled) => {
                settle(status, &UPDATE_REVIEW, settled, env, clear, |review| {
                    merge::map_replace(&mut state.reviews, review);
                })
            },

            ReviewAction::DeleteReview { request, id } => begin(
                status,
                &DELETE_REVIEW,
                request,
                remote_ack(
                    env,
                    request,
                    ApiRequest::delete(format!("/buyer/reviews/{id}")),
                    id,
                    ReviewAction::ReviewDeleted,
                ),
            ),
            ReviewAction::ReviewDeleted(settled) => {
                settle(status, &DELETE_REVIEW, settled, env, clear, |id| {
                    merge::filter_out(&mut state.reviews, &id);
                })
            },

            ReviewAction::FetchSellerReviews { request } => begin(
                status,
                &FETCH_SELLER_REVIEWS,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/seller/reviews"),
                    ReviewAction::SellerReviewsFetched,
                ),
            ),
            ReviewAction::SellerReviewsFetched(settled) => {
                settle(status, &FETCH_SELLER_REVIEWS, settled, env, clear, |reviews| {
                    merge::replace(&mut state.seller_reviews, reviews);
                })
            },

            ReviewAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            ReviewAction::Reset => {
                *state = ReviewState::default();
                SmallVec::new()
            },
        }
    }
}

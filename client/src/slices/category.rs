//! Categories and subcategories

use super::{begin, settle};
use crate::environment::{MarketplaceEnvironment, remote, remote_ack, remote_json};
use crate::types::{Category, CategoryForm, EntityId, NewSubcategory, Subcategory};
use marketplace_core::SmallVec;
use marketplace_core::effect::Effect;
use marketplace_core::http::ApiRequest;
use marketplace_core::merge;
use marketplace_core::reducer::Reducer;
use marketplace_core::slice::{Operation, RequestId, Settled, SliceStatus};
use serde::{Deserialize, Serialize};

/// GET `/buyer/categories`
pub const FETCH_CATEGORIES: Operation =
    Operation::new("category/fetchCategories", "Categories fetched successfully");
/// POST `/seller/categories`
pub const CREATE_CATEGORY: Operation =
    Operation::new("category/createCategory", "Category created successfully");
/// PUT `/seller/categories/{id}`
pub const UPDATE_CATEGORY: Operation =
    Operation::new("category/updateCategory", "Category updated successfully");
/// DELETE `/seller/categories/{id}`
pub const DELETE_CATEGORY: Operation =
    Operation::new("category/deleteCategory", "Category deleted successfully");
/// GET `/seller/categories/{id}/subcategories`
pub const FETCH_SUBCATEGORIES: Operation =
    Operation::new("category/fetchSubcategories", "Subcategories fetched successfully");
/// POST `/seller/subcategories`
pub const CREATE_SUBCATEGORY: Operation =
    Operation::new("category/createSubcategory", "Subcategory created successfully");
/// DELETE `/seller/subcategories/{id}`
pub const DELETE_SUBCATEGORY: Operation =
    Operation::new("category/deleteSubcategory", "Subcategory deleted successfully");

/// Category slice state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryState {
    /// All categories
    pub categories: Vec<Category>,
    /// Subcategories of the last category fetched
    pub subcategories: Vec<Subcategory>,
    /// Request lifecycle
    pub status: SliceStatus,
}

/// Category slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryAction {
    /// Load every category
    FetchCategories {
        /// Correlation id
        request: RequestId,
    },
    /// Categories loaded
    CategoriesFetched(Settled<Vec<Category>>),
    /// Create a category
    CreateCategory {
        /// Correlation id
        request: RequestId,
        /// Form
        form: CategoryForm,
    },
    /// Category created
    CategoryCreated(Settled<Category>),
    /// Rename or describe a category
    UpdateCategory {
        /// Correlation id
        request: RequestId,
        /// Category id
        id: EntityId,
        /// Form
        form: CategoryForm,
    },
    /// Category updated
    CategoryUpdated(Settled<Category>),
    /// Delete a category
    DeleteCategory {
        /// Correlation id
        request: RequestId,
        /// Category id
        id: EntityId,
    },
    /// Category deleted
    CategoryDeleted(Settled<EntityId>),
    /// Load the subcategories of one category
    FetchSubcategories {
        /// Correlation id
        request: RequestId,
        /// Parent category
        category_id: EntityId,
    },
    /// Subcategories loaded
    SubcategoriesFetched(Settled<Vec<Subcategory>>),
    /// Create a subcategory
    CreateSubcategory {
        /// Correlation id
        request: RequestId,
        /// Form
        form: NewSubcategory,
    },
    /// Subcategory created
    SubcategoryCreated(Settled<Subcategory>),
    /// Delete a subcategory
    DeleteSubcategory {
        /// Correlation id
        request: RequestId,
        /// Subcategory id
        id: EntityId,
    },
    /// Subcategory deleted
    SubcategoryDeleted(Settled<EntityId>),
    /// Clear the banner
    ClearAlert,
    /// Return to the initial state
    Reset,
}

impl CategoryAction {
    /// Correlation id of a settled event
    #[must_use]
    pub const fn settled_request(&self) -> Option<RequestId> {
        match self {
            Self::CategoriesFetched(Settled { request, .. })
            | Self::CategoryCreated(Settled { request, .. })
            | Self::CategoryUpdated(Settled { request, .. })
            | Self::CategoryDeleted(Settled { request, .. })
            | Self::SubcategoriesFetched(Settled { request, .. })
            | Self::SubcategoryCreated(Settled { request, .. })
            | Self::SubcategoryDeleted(Settled { request, .. }) => Some(*request),
            _ => None,
        }
    }
}

/// Category slice reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryReducer;

impl CategoryReducer {
    /// Create a new category reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CategoryReducer {
    type State = CategoryState;
    type Action = CategoryAction;
    type Environment = MarketplaceEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle event
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = &mut state.status;
        let clear = CategoryAction::ClearAlert;

        match action {
            CategoryAction::FetchCategories { request } => begin(
                status,
                &FETCH_CATEGORIES,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get("/buyer/categories"),
                    CategoryAction::CategoriesFetched,
                ),
            ),
            CategoryAction::CategoriesFetched(settled) => {
                settle(status, &FETCH_CATEGORIES, settled, env, clear, |items| {
                    merge::replace(&mut state.categories, items);
                })
            },

            CategoryAction::CreateCategory { request, form } => begin(
                status,
                &CREATE_CATEGORY,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/seller/categories"),
                    &form,
                    CategoryAction::CategoryCreated,
                ),
            ),
            CategoryAction::CategoryCreated(settled) => {
                settle(status, &CREATE_CATEGORY, settled, env, clear, |category| {
                    merge::append(&mut state.categories, category);
                })
            },

            CategoryAction::UpdateCategory { request, id, form } => begin(
                status,
                &UPDATE_CATEGORY,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::put(format!("/seller/categories/{id}")),
                    &form,
                    CategoryAction::CategoryUpdated,
                ),
            ),
            CategoryAction::CategoryUpdated(settled) => {
                settle(status, &UPDATE_CATEGORY, settled, env, clear, |category| {
                    merge::map_replace(&mut state.categories, category);
                })
            },

            CategoryAction::DeleteCategory { request, id } => begin(
                status,
                &DELETE_CATEGORY,
                request,
                remote_ack(
                    env,
                    request,
                    ApiRequest::delete(format!("/seller/categories/{id}")),
                    id,
                    CategoryAction::CategoryDeleted,
                ),
            ),
            CategoryAction::CategoryDeleted(settled) => {
                settle(status, &DELETE_CATEGORY, settled, env, clear, |id| {
                    merge::filter_out(&mut state.categories, &id);
                })
            },

            CategoryAction::FetchSubcategories {
                request,
                category_id,
            } => begin(
                status,
                &FETCH_SUBCATEGORIES,
                request,
                remote(
                    env,
                    request,
                    ApiRequest::get(format!("/seller/categories/{category_id}/subcategories")),
                    CategoryAction::SubcategoriesFetched,
                ),
            ),
            CategoryAction::SubcategoriesFetched(settled) => {
                settle(status, &FETCH_SUBCATEGORIES, settled, env, clear, |items| {
                    merge::replace(&mut state.subcategories, items);
                })
            },

            CategoryAction::CreateSubcategory { request, form } => begin(
                status,
                &CREATE_SUBCATEGORY,
                request,
                remote_json(
                    env,
                    request,
                    ApiRequest::post("/seller/subcategories"),
                    &form,
                    CategoryAction::SubcategoryCreated,
                ),
            ),
            CategoryAction::SubcategoryCreated(settled) => {
                settle(status, &CREATE_SUBCATEGORY, settled, env, clear, |subcategory| {
                    merge::append(&mut state.subcategories, subcategory);
                })
            },

            CategoryAction::DeleteSubcategory { request, id } => begin(
                status,
                &DELETE_SUBCATEGORY,
                request,
                remote_ack(
                    env,
                    request,
                    ApiRequest::delete(format!("/seller/subcategories/{id}")),
                    id,
                    CategoryAction::SubcategoryDeleted,
                ),
            ),
            CategoryAction::SubcategoryDeleted(settled) => {
                settle(status, &DELETE_SUBCATEGORY, settled, env, clear, |id| {
                    merge::filter_out(&mut state.subcategories, &id);
                })
            },

            CategoryAction::ClearAlert => {
                status.clear_alert();
                SmallVec::new()
            },
            CategoryAction::Reset => {
                *state = CategoryState::default();
                SmallVec::new()
            },
        }
    }
}

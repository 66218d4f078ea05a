//! Aggregates computed from already-fetched collections
//!
//! Pure functions; nothing here touches the store or the network.

use crate::types::{CartItem, Order, Product, Review};
use marketplace_core::merge::Identified;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Status that excludes an order from revenue
pub const CANCELLED: &str = "cancelled";

/// `sum(price × quantity)` over the cart
#[must_use]
pub fn cart_total(items: &[CartItem]) -> f64 {
    items
        .iter()
        .map(|item| item.unit_price() * f64::from(item.quantity))
        .sum()
}

/// The server's total when present, otherwise `sum(price × quantity)` over the lines
#[must_use]
pub fn order_total(order: &Order) -> f64 {
    order.total_amount.unwrap_or_else(|| {
        order
            .items
            .iter()
            .map(|item| item.unit_price() * f64::from(item.quantity))
            .sum()
    })
}

/// Mean rating, `None` when no review carries one
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    let (sum, count) = reviews
        .iter()
        .filter_map(|review| review.rating)
        .fold((0_u32, 0_u32), |(sum, count), rating| {
            (sum + u32::from(rating), count + 1)
        });
    (count > 0).then(|| f64::from(sum) / f64::from(count))
}

/// Drop later duplicates, keeping the first entity seen for each id
///
/// Entities without an id are always kept. Order is preserved.
#[must_use]
pub fn dedupe_by_id<T>(items: &[T]) -> Vec<T>
where
    T: Identified + Clone,
    T::Id: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| item.id().is_none_or(|id| seen.insert(id.clone())))
        .cloned()
        .collect()
}

/// Seller dashboard summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SellerDashboard {
    /// Sum of order totals, cancelled orders excluded
    pub revenue: f64,
    /// Order count per status; orders without one count as `unknown`
    pub orders_by_status: BTreeMap<String, usize>,
    /// Listed products
    pub product_count: usize,
    /// Mean rating across the seller's reviews
    pub average_rating: Option<f64>,
}

impl SellerDashboard {
    /// Summarize the seller's orders, products and reviews
    #[must_use]
    pub fn compute(orders: &[Order], products: &[Product], reviews: &[Review]) -> Self {
        let mut orders_by_status = BTreeMap::new();
        let mut revenue = 0.0;

        for order in orders {
            let status = order
                .status
                .as_deref()
                .map_or_else(|| "unknown".to_string(), str::to_lowercase);
            if status != CANCELLED {
                revenue += order_total(order);
            }
            *orders_by_status.entry(status).or_insert(0) += 1;
        }

        Self {
            revenue,
            orders_by_status,
            product_count: products.len(),
            average_rating: average_rating(&dedupe_by_id(reviews)),
        }
    }
}

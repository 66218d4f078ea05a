//! Domain entities and request payloads
//!
//! Entities are what the remote API returns. Every field the client does not
//! interpret is optional, and unknown fields land in `extra` so they survive a
//! round-trip untouched.

use marketplace_core::merge::Identified;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Ids
// ============================================================================

/// Server-assigned id, sent either as a JSON string or a number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct EntityId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for EntityId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        }
    }
}

impl EntityId {
    /// Wrap an id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as text, ready for a URL path segment
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Unknown fields kept verbatim
pub type Extra = Map<String, Value>;

macro_rules! identified {
    ($($entity:ty),+ $(,)?) => {
        $(
            impl Identified for $entity {
                type Id = EntityId;

                fn id(&self) -> Option<&EntityId> {
                    self.id.as_ref()
                }
            }
        )+
    };
}

// ============================================================================
// Users
// ============================================================================

/// Which side of the marketplace an account acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses, buys and reviews
    Buyer,
    /// Lists products and fulfils orders
    Seller,
}

impl Role {
    /// Path prefix of this role's endpoints, e.g. `buyer` in `/buyer/profile`
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
        }
    }

    /// Parse a role name case-insensitively
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "buyer" => Some(Self::Buyer),
            "seller" => Some(Self::Seller),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// An account, as cached in the session under the `user` key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sign-in email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role name as sent by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

impl User {
    /// The account's role, if the server sent a known one
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A listed product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Units in stock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    /// Subcategory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<EntityId>,
    /// Owning seller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<EntityId>,
    /// Image URLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// Top-level product category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// Category child
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parent category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A product review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Reviewed product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<EntityId>,
    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    /// Stars, 1 to 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Cart and wishlist
// ============================================================================

/// One line of the buyer's cart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Product in the cart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<EntityId>,
    /// Units
    #[serde(default)]
    pub quantity: u32,
    /// Unit price captured by the server, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Embedded product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

impl CartItem {
    /// Unit price of the line, falling back to the embedded product's price
    #[must_use]
    pub fn unit_price(&self) -> f64 {
        self.price
            .or_else(|| self.product.as_ref().and_then(|product| product.price))
            .unwrap_or(0.0)
    }
}

/// One saved product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Saved product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<EntityId>,
    /// Embedded product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Orders and payments
// ============================================================================

/// One line of an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Ordered product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<EntityId>,
    /// Units
    #[serde(default)]
    pub quantity: u32,
    /// Unit price at order time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Embedded product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

impl OrderItem {
    /// Unit price of the line, falling back to the embedded product's price
    #[must_use]
    pub fn unit_price(&self) -> f64 {
        self.price
            .or_else(|| self.product.as_ref().and_then(|product| product.price))
            .unwrap_or(0.0)
    }
}

/// A placed order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Buyer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<EntityId>,
    /// Lines
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Total computed by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    /// Fulfilment status, e.g. `pending`, `shipped`, `cancelled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Delivery address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    /// Creation time as sent by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

/// A payment for an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Paid order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<EntityId>,
    /// Amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Payment method, e.g. `card`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Settlement status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Extra,
}

identified!(
    User,
    Product,
    Category,
    Subcategory,
    Review,
    CartItem,
    WishlistItem,
    Order,
    Payment,
);

// ============================================================================
// Request payloads
// ============================================================================

/// Sign-in credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
}

/// Account creation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUp {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Password
    pub password: String,
    /// Requested role
    pub role: Role,
}

/// Sign-in response payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignedIn {
    /// The signed-in account
    pub user: User,
    /// Bearer token for authenticated requests
    #[serde(alias = "token", alias = "accessToken")]
    pub access_token: String,
}

/// Password reset completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordReset {
    /// Token from the reset email
    pub token: String,
    /// New password
    pub password: String,
}

/// Password change for a signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    /// Current password
    pub current_password: String,
    /// New password
    pub new_password: String,
}

/// Profile fields to change; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Line to add to the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCartItem {
    /// Product
    pub product_id: EntityId,
    /// Units
    pub quantity: u32,
}

/// Filters for the product listing; unset filters are not sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Free-text search
    pub search: Option<String>,
    /// Category filter
    pub category_id: Option<EntityId>,
    /// Subcategory filter
    pub subcategory_id: Option<EntityId>,
    /// Lower price bound
    pub min_price: Option<f64>,
    /// Upper price bound
    pub max_price: Option<f64>,
    /// Sort key understood by the server, e.g. `price_asc`
    pub sort: Option<String>,
    /// Page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Query string pairs for the set filters, in a stable order
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category_id {
            pairs.push(("category_id", category.to_string()));
        }
        if let Some(subcategory) = &self.subcategory_id {
            pairs.push(("subcategory_id", subcategory.to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Image attached to a new product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// File name sent to the server
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`
    pub mime: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Product listing form, sent as multipart so images can ride along
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProduct {
    /// Title
    pub name: String,
    /// Long description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: u32,
    /// Category
    pub category_id: Option<EntityId>,
    /// Subcategory
    pub subcategory_id: Option<EntityId>,
    /// Images
    pub images: Vec<ImageUpload>,
}

/// Product fields to change; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductUpdate {
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Long description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Units in stock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    /// Subcategory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<EntityId>,
}

/// Category create/update form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryForm {
    /// Name
    pub name: String,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Subcategory create form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubcategory {
    /// Parent category
    pub category_id: EntityId,
    /// Name
    pub name: String,
}

/// Line of a new order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Product
    pub product_id: EntityId,
    /// Units
    pub quantity: u32,
}

/// Checkout form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    /// Lines; empty means "order the server-side cart"
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderLine>,
    /// Delivery address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    /// Payment method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Seller-side order status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStatusUpdate {
    /// New status, e.g. `shipped`
    pub status: String,
}

/// Payment form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPayment {
    /// Order being paid
    pub order_id: EntityId,
    /// Amount
    pub amount: f64,
    /// Payment method, e.g. `card`
    pub method: String,
}

/// Review form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    /// Reviewed product
    pub product_id: EntityId,
    /// Stars, 1 to 5
    pub rating: u8,
    /// Free text
    pub comment: String,
}

/// Review fields to change; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewUpdate {
    /// Stars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Free text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_accepts_strings_and_numbers() {
        let text: EntityId = serde_json::from_value(json!("a1")).unwrap();
        let number: EntityId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(text, EntityId::from("a1"));
        assert_eq!(number, EntityId::from(42));
        assert_eq!(serde_json::to_value(&number).unwrap(), json!("42"));
    }

    #[test]
    fn cart_item_keeps_unknown_fields() {
        let raw = json!({
            "_id": 7,
            "product_id": "p1",
            "quantity": 2,
            "color": "red"
        });
        let item: CartItem = serde_json::from_value(raw).unwrap();

        assert_eq!(item.id, Some(EntityId::from("7")));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.extra.get("color"), Some(&json!("red")));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["color"], json!("red"));
        assert_eq!(back["id"], json!("7"));
    }

    #[test]
    fn bare_entity_response_drops_server_message() {
        let body = json!({"id": "9", "name": "Lamp", "message": "Product updated"});
        let envelope = marketplace_core::http::decode_response::<Product>(Ok(body)).unwrap();

        assert_eq!(envelope.message.as_deref(), Some("Product updated"));
        assert!(envelope.data.extra.is_empty());
        let sent_back = serde_json::to_value(&envelope.data).unwrap();
        assert_eq!(sent_back, json!({"id": "9", "name": "Lamp"}));
    }

    #[test]
    fn user_role_is_parsed_leniently() {
        let user: User = serde_json::from_value(json!({"id": "u1", "role": "Seller"})).unwrap();
        assert_eq!(user.role(), Some(Role::Seller));

        let admin = User {
            role: Some("admin".to_string()),
            ..User::default()
        };
        assert_eq!(admin.role(), None);
    }

    #[test]
    fn signed_in_accepts_token_aliases() {
        let signed: SignedIn =
            serde_json::from_value(json!({"user": {"id": "u1"}, "token": "abc"})).unwrap();
        assert_eq!(signed.access_token, "abc");
    }

    #[test]
    fn product_query_sends_only_set_filters() {
        let query = ProductQuery {
            search: Some("lamp".to_string()),
            max_price: Some(50.0),
            page: Some(2),
            ..ProductQuery::default()
        };
        assert_eq!(
            query.pairs(),
            vec![
                ("search", "lamp".to_string()),
                ("max_price", "50".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }

    #[test]
    fn cart_item_price_falls_back_to_product() {
        let item = CartItem {
            quantity: 3,
            product: Some(Product {
                price: Some(2.5),
                ..Product::default()
            }),
            ..CartItem::default()
        };
        assert!((item.unit_price() - 2.5).abs() < f64::EPSILON);
    }
}

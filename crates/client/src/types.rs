//! Records exchanged with the storefront API.
//!
//! These mirror the backend's JSON. Unknown fields are ignored and most
//! optional fields default, so a backend adding fields never breaks the
//! client.

use chrono::{DateTime, Utc};
use dewdrop_core::{
    BannerId, CartItemId, CartTotals, CategoryId, ConversationId, MessageId, Money,
    NotificationId, NotificationKind, OrderId, OrderStatus, PaymentMethod, PaymentStatus,
    PricedLine, ProductId, ReviewId, UserId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list endpoint.
///
/// Deserializes both the paginated envelope (`{count, next, previous,
/// results}`) and a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PageRepr<T>")]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Paged {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> From<PageRepr<T>> for Page<T> {
    fn from(repr: PageRepr<T>) -> Self {
        match repr {
            PageRepr::Paged {
                count,
                next,
                previous,
                results,
            } => Self {
                count: count.unwrap_or(results.len() as u64),
                next,
                previous,
                results,
            },
            PageRepr::Plain(results) => Self {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Category as embedded in a product: either an ID or a full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductCategory {
    Id(CategoryId),
    Name(String),
    Full(Category),
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    /// Ingredient list as printed on the label.
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub is_liked: bool,
}

impl Product {
    /// Whether any units are available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub user: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of matching the signed-in user's allergies against a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergyReport {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: Option<String>,
    pub has_allergens: bool,
    #[serde(default, alias = "allergens")]
    pub matched_allergens: Vec<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// A cart line: a product and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
}

impl PricedLine for CartLine {
    fn unit_price(&self) -> Money {
        self.product.price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// The signed-in user's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl Cart {
    /// Totals derived from the lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::from_lines(&self.items)
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

// =============================================================================
// Orders & payments
// =============================================================================

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product: Option<ProductId>,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: u32,
    pub price: Money,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(alias = "total_amount")]
    pub total: Money,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for placing an order from the current cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub shipping_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A step in an order's delivery history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: OrderStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Delivery tracking for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTracking {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

/// A payment handed off to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub order_id: OrderId,
    pub reference: String,
    /// Where the customer completes payment, for online methods.
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
}

// =============================================================================
// Profiles & social
// =============================================================================

/// The signed-in user's own profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub followers_count: u32,
    #[serde(default)]
    pub following_count: u32,
}

/// Editable profile fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
}

/// Another user, as shown in social lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub followers_count: u32,
    #[serde(default)]
    pub following_count: u32,
    #[serde(default)]
    pub is_following: bool,
}

// =============================================================================
// Messaging & notifications
// =============================================================================

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: SocialUser,
    #[serde(default)]
    pub content: String,
    /// Product attached when the message is a share.
    #[serde(default)]
    pub shared_product: Option<Product>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A direct-message conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<SocialUser>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
}

/// A notification for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "notification_type", alias = "kind")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Admin
// =============================================================================

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub total_revenue: Money,
    pub total_users: u64,
    pub total_products: u64,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub low_stock_products: u64,
}

/// A promotional banner on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    #[serde(default)]
    pub title: Option<String>,
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Product fields sent when creating or editing a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub category: Option<CategoryId>,
    pub ingredients: Option<String>,
}

impl ProductDraft {
    /// The populated fields as multipart text parts.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("name", self.name.clone()),
            ("brand", self.brand.clone()),
            ("description", self.description.clone()),
            ("price", self.price.map(|price| price.to_string())),
            ("stock", self.stock.map(|stock| stock.to_string())),
            ("category", self.category.map(|id| id.to_string())),
            ("ingredients", self.ingredients.clone()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_json(id: i64, price: &str) -> serde_json::Value {
        json!({"id": id, "name": "Barrier Cream", "price": price, "stock": 3, "category": 2})
    }

    #[test]
    fn test_page_accepts_envelope_and_plain_array() {
        let paged: Page<Product> = serde_json::from_value(json!({
            "count": 40,
            "next": "http://api/products/?page=2",
            "previous": null,
            "results": [product_json(1, "10.00")]
        }))
        .unwrap();
        assert_eq!(paged.count, 40);
        assert!(paged.has_next());

        let plain: Page<Product> =
            serde_json::from_value(json!([product_json(1, "10.00"), product_json(2, "5")]))
                .unwrap();
        assert_eq!(plain.count, 2);
        assert!(!plain.has_next());
    }

    #[test]
    fn test_product_category_shapes() {
        let product: Product = serde_json::from_value(product_json(1, "10.00")).unwrap();
        assert_eq!(product.category, Some(ProductCategory::Id(CategoryId::new(2))));

        let mut value = product_json(1, "10.00");
        value["category"] = json!({"id": 2, "name": "Moisturizers"});
        let product: Product = serde_json::from_value(value).unwrap();
        assert!(matches!(product.category, Some(ProductCategory::Full(_))));
    }

    #[test]
    fn test_cart_totals() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [
                {"id": 1, "product": product_json(1, "12.50"), "quantity": 2},
                {"id": 2, "product": product_json(2, "8.99"), "quantity": 1}
            ]
        }))
        .unwrap();

        let totals = cart.totals();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(totals.subtotal, Money::from_cents(3399));
        // 33.99 * 8% = 2.7192 -> 2.72
        assert_eq!(totals.tax, Money::from_cents(272));
        assert_eq!(totals.total, Money::from_cents(3671));
    }

    #[test]
    fn test_allergy_report_alias() {
        let report: AllergyReport =
            serde_json::from_value(json!({"has_allergens": true, "allergens": ["nuts"]}))
                .unwrap();
        assert_eq!(report.matched_allergens, vec!["nuts".to_string()]);
    }

    #[test]
    fn test_product_draft_fields_skip_unset() {
        let draft = ProductDraft {
            name: Some("Toner".to_string()),
            price: Some(Money::from_cents(1500)),
            ..ProductDraft::default()
        };
        assert_eq!(
            draft.fields(),
            vec![("name", "Toner".to_string()), ("price", "15.00".to_string())]
        );
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Buyer, Money, OrderState, Supplier, User};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// The identity on whose behalf an operation is performed. Administrators may act on any record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: i64) -> Self {
        Self { user_id, is_admin: false }
    }

    pub fn admin(user_id: i64) -> Self {
        Self { user_id, is_admin: true }
    }
}

//--------------------------------------     Pagination      ---------------------------------------------------------
/// 1-based page selection for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page: page.max(1), page_size: page_size.max(1) }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, pagination: Pagination) -> Self {
        let seen = pagination.offset() + results.len() as i64;
        let next = (seen < count).then_some(pagination.page + 1);
        let previous = (pagination.page > 1).then_some(pagination.page - 1);
        Self { count, next, previous, results }
    }
}

//--------------------------------------      Accounts       ---------------------------------------------------------
/// A user together with the organisations they manage. Only the list matching the user's type is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyers: Option<Vec<Buyer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Supplier>>,
}

//--------------------------------------       Catalog       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    /// Names of the available suppliers carrying this category, joined with ", "
    pub suppliers: String,
}

/// Optional filters for the public listing search. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    #[serde(default, alias = "supplier")]
    pub supplier_id: Option<i64>,
    #[serde(default, alias = "category")]
    pub category_id: Option<i64>,
    #[serde(default, alias = "product")]
    pub product_id: Option<i64>,
}

impl ListingQuery {
    pub fn is_empty(&self) -> bool {
        self.supplier_id.is_none() && self.category_id.is_none() && self.product_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedProduct {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingView {
    pub product: ListedProduct,
    pub model: String,
    pub supplier: i64,
    pub quantity: i64,
    pub price: Money,
    /// Each parameter rendered as `"name: value"`
    pub p_parameters: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub categories: usize,
    pub listings: usize,
    pub parameters: usize,
}

//--------------------------------------        Orders       ---------------------------------------------------------
/// Identifies a supplier's listing of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingKey {
    pub product_id: i64,
    pub supplier_id: i64,
}

impl ListingKey {
    pub fn new(product_id: i64, supplier_id: i64) -> Self {
        Self { product_id, supplier_id }
    }
}

/// The current state of a listing, as seen by basket validation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ListingStock {
    pub product_supplier_id: i64,
    pub product_id: i64,
    pub supplier_id: i64,
    pub quantity: i64,
}

/// One row of an order read: the order header joined with one of its items (if any).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OrderLine {
    pub order_id: i64,
    pub buyer_id: i64,
    pub buyer_name: String,
    pub state: OrderState,
    pub item_id: Option<i64>,
    pub product_supplier_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub product_name: Option<String>,
    pub external_id: Option<i64>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
}

impl OrderLine {
    /// The line value, or zero if this row carries no item.
    pub fn sum(&self) -> Money {
        match (self.price, self.quantity) {
            (Some(price), Some(qty)) => price * qty,
            _ => Money::default(),
        }
    }
}

/// Selects which orders (and which of their items) an order read returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLineFilter {
    /// The baskets of every buyer owned by the user, including empty ones.
    BasketsOfUser(i64),
    /// The placed (non-basket) orders of every buyer owned by the user.
    PlacedOrdersOfUser(i64),
    /// The items, in placed orders, supplied by any supplier owned by the user.
    SupplierItemsOfUser(i64),
    /// The given orders, regardless of owner.
    Orders(Vec<i64>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub placed: Vec<i64>,
    pub rejected: Vec<i64>,
}

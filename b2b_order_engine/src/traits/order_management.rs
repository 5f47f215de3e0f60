use thiserror::Error;

use crate::{
    db_types::{Order, OrderState},
    order_objects::{BasketChange, BasketUpdate},
    traits::{ListingKey, ListingStock, OrderLine, OrderLineFilter, PlacementResult},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The request does not contain any entries.")]
    EmptyRequest,
    #[error("Buyer #{0} does not belong to the current user.")]
    BuyerNotOwned(i64),
    #[error("Invalid items for buyer #{buyer_id}. {problems}")]
    InvalidBasketItems { buyer_id: i64, problems: String },
    #[error("None of the orders {0:?} is a basket of the current user.")]
    NothingToPlace(Vec<i64>),
    #[error("Order #{0} not found.")]
    OrderNotFound(i64),
    #[error("Order #{order_id} cannot move from '{from}' to '{to}'.")]
    InvalidTransition { order_id: i64, from: OrderState, to: OrderState },
    #[error("Order #{0} was modified by another request. Try again.")]
    ConcurrentModification(i64),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the storage behaviour behind baskets and orders.
///
/// Validation of basket requests happens before the backend is called (see
/// [`crate::order_objects::reconcile_basket_request`]); the backend only has to apply already-validated changes
/// atomically.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_buyer_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, OrderFlowError>;

    async fn fetch_supplier_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, OrderFlowError>;

    /// Current stock for the given listings. Listings of unavailable suppliers, and unknown keys, are omitted.
    async fn fetch_listing_stock(&self, keys: &[ListingKey]) -> Result<Vec<ListingStock>, OrderFlowError>;

    /// Applies all changes in one transaction. Each buyer's basket is created if it does not exist yet. Items
    /// already in the basket have their quantity replaced.
    async fn apply_basket_changes(&self, changes: &[BasketChange]) -> Result<Vec<BasketUpdate>, OrderFlowError>;

    /// Deletes the given items from the buyer's basket. Returns the basket id and the number of items removed, or
    /// `None` if the buyer has no basket.
    async fn delete_basket_items(
        &self,
        buyer_id: i64,
        item_ids: &[i64],
    ) -> Result<Option<(i64, u64)>, OrderFlowError>;

    /// Order rows joined with their items, ordered by order id then item id.
    async fn fetch_order_lines(&self, filter: OrderLineFilter) -> Result<Vec<OrderLine>, OrderFlowError>;

    /// Moves each of the user's baskets in `order_ids` to `new`, in one transaction. Ids that are not baskets of the
    /// user are reported as rejected.
    async fn place_orders(&self, user_id: i64, order_ids: &[i64]) -> Result<PlacementResult, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Sets the order's state to `to` if it is still `from`. Returns `None` if the order was not in state `from`.
    async fn update_order_state(
        &self,
        order_id: i64,
        from: OrderState,
        to: OrderState,
    ) -> Result<Option<Order>, OrderFlowError>;
}

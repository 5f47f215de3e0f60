use std::{collections::BTreeMap, fmt::Debug};

use log::*;

use crate::{
    db_types::{Order, OrderState},
    events::{EventProducers, OrderStateChangedEvent, OrdersPlacedEvent},
    order_objects::{
        basket_update_summary,
        reconcile_basket_request,
        requested_listing_keys,
        BasketDeleteRequest,
        BasketRequest,
        BasketView,
        BuyerOrders,
        DeletionReport,
        SupplierOrders,
    },
    order_views::{basket_views, buyer_order_views, order_summaries, supplier_order_views},
    traits::{AccountManagement, OrderFlowError, OrderLineFilter, OrderManagement, PlacementResult},
};

/// `OrderFlowApi` drives baskets and orders: filling and emptying baskets, placing them as orders, and moving
/// orders through their lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + AccountManagement
{
    /// Sets item quantities in the baskets of the caller's buyers.
    ///
    /// The request is validated as a whole against the live catalogue before anything is written. Returns the
    /// number of items written per basket id.
    pub async fn update_basket(
        &self,
        user_id: i64,
        requests: Vec<BasketRequest>,
    ) -> Result<BTreeMap<i64, usize>, OrderFlowError> {
        if requests.is_empty() {
            return Err(OrderFlowError::EmptyRequest);
        }
        let owned = self.db.fetch_buyer_ids_for_user(user_id).await?;
        let snapshot = self.db.fetch_listing_stock(&requested_listing_keys(&requests)).await?;
        let changes = reconcile_basket_request(&owned, &snapshot, &requests).map_err(|e| {
            debug!("🛒️ Basket update from user #{user_id} rejected: {e}");
            e
        })?;
        let updates = self.db.apply_basket_changes(&changes).await?;
        let summary = basket_update_summary(&updates);
        info!("🛒️ User #{user_id} updated {} basket(s)", summary.len());
        Ok(summary)
    }

    /// Removes items from the caller's baskets. Each entry succeeds or fails on its own; the report says which.
    pub async fn remove_basket_items(
        &self,
        user_id: i64,
        requests: Vec<BasketDeleteRequest>,
    ) -> Result<DeletionReport, OrderFlowError> {
        if requests.is_empty() {
            return Err(OrderFlowError::EmptyRequest);
        }
        let owned = self.db.fetch_buyer_ids_for_user(user_id).await?;
        let mut report = DeletionReport::default();
        for request in requests {
            let buyer_id = request.buyer_id;
            if !owned.contains(&buyer_id) {
                report.push_error(buyer_id, OrderFlowError::BuyerNotOwned(buyer_id).to_string());
                continue;
            }
            if request.items.is_empty() {
                report.push_error(buyer_id, "No items were given.".to_string());
                continue;
            }
            match self.db.delete_basket_items(buyer_id, &request.items).await? {
                None => report.push_error(buyer_id, format!("Buyer #{buyer_id} has no basket.")),
                Some((order_id, 0)) => {
                    let items = &request.items;
                    report.push_error(buyer_id, format!("No such items {items:?} in the basket (order #{order_id})."));
                },
                Some((order_id, deleted)) => {
                    debug!("🛒️ Deleted {deleted} items from basket #{order_id}");
                    report.push_success(buyer_id, format!("Deleted {deleted} (order #{order_id})"));
                },
            }
        }
        Ok(report)
    }

    pub async fn baskets(&self, user_id: i64) -> Result<Vec<BasketView>, OrderFlowError> {
        let lines = self.db.fetch_order_lines(OrderLineFilter::BasketsOfUser(user_id)).await?;
        Ok(basket_views(&lines))
    }

    /// Placed orders of every buyer the caller owns, grouped by buyer.
    pub async fn buyer_orders(&self, user_id: i64) -> Result<Vec<BuyerOrders>, OrderFlowError> {
        let buyers = self.db.fetch_buyer_ids_for_user(user_id).await?;
        let lines = self.db.fetch_order_lines(OrderLineFilter::PlacedOrdersOfUser(user_id)).await?;
        Ok(buyer_order_views(&buyers, &lines))
    }

    /// Items ordered from each supplier the caller owns, grouped by supplier and order.
    pub async fn supplier_orders(&self, user_id: i64) -> Result<Vec<SupplierOrders>, OrderFlowError> {
        let suppliers = self.db.fetch_supplier_ids_for_user(user_id).await?;
        let lines = self.db.fetch_order_lines(OrderLineFilter::SupplierItemsOfUser(user_id)).await?;
        Ok(supplier_order_views(&suppliers, &lines))
    }

    /// Places the requested baskets of the caller as new orders.
    ///
    /// Ids that are not baskets of the caller are rejected; if nothing can be placed the whole request fails.
    /// Publishes an [`OrdersPlacedEvent`] for the orders that were placed.
    pub async fn place_orders(
        &self,
        user_id: i64,
        user_email: &str,
        order_ids: &[i64],
    ) -> Result<PlacementResult, OrderFlowError> {
        if order_ids.is_empty() {
            return Err(OrderFlowError::EmptyRequest);
        }
        let result = self.db.place_orders(user_id, order_ids).await?;
        if result.placed.is_empty() {
            return Err(OrderFlowError::NothingToPlace(result.rejected));
        }
        info!("🛒️ User #{user_id} placed orders {:?}. Rejected: {:?}", result.placed, result.rejected);
        self.call_orders_placed_hook(user_email, &result.placed).await;
        Ok(result)
    }

    /// Moves an order to `new_state`, if the order lifecycle allows it.
    pub async fn change_order_state(&self, order_id: i64, new_state: OrderState) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let old_state = order.state;
        if !old_state.can_transition_to(new_state) {
            return Err(OrderFlowError::InvalidTransition { order_id, from: old_state, to: new_state });
        }
        let order = self
            .db
            .update_order_state(order_id, old_state, new_state)
            .await?
            .ok_or(OrderFlowError::ConcurrentModification(order_id))?;
        info!("🛒️ Order #{order_id} moved from {old_state} to {new_state}");
        for producer in &self.producers.order_state_changed_producer {
            let event = OrderStateChangedEvent { order_id, buyer_id: order.buyer_id, old_state, new_state };
            producer.publish_event(event).await;
        }
        Ok(order)
    }

    async fn call_orders_placed_hook(&self, user_email: &str, placed: &[i64]) {
        if self.producers.orders_placed_producer.is_empty() {
            return;
        }
        let lines = match self.db.fetch_order_lines(OrderLineFilter::Orders(placed.to_vec())).await {
            Ok(lines) => lines,
            Err(e) => {
                error!("🛒️ Could not load placed orders {placed:?} for notification. {e}");
                return;
            },
        };
        let admin_emails = self.db.fetch_admin_emails().await.unwrap_or_else(|e| {
            error!("🛒️ Could not load administrator emails. {e}");
            Vec::new()
        });
        let event =
            OrdersPlacedEvent { user_email: user_email.to_string(), admin_emails, orders: order_summaries(&lines) };
        for producer in &self.producers.orders_placed_producer {
            debug!("🛒️ Notifying orders placed hook subscribers");
            producer.publish_event(event.clone()).await;
        }
    }
}

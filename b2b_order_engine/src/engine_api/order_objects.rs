use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Money, OrderState},
    traits::{ListingKey, ListingStock, OrderFlowError},
};

//--------------------------------------      Requests       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItemRequest {
    #[serde(alias = "product")]
    pub product_id: i64,
    #[serde(alias = "supplier")]
    pub supplier_id: i64,
    pub quantity: i64,
}

/// The items a buyer wants in their basket. Quantities replace whatever is already in the basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketRequest {
    #[serde(alias = "buyer")]
    pub buyer_id: i64,
    pub items: Vec<BasketItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketDeleteRequest {
    #[serde(alias = "buyer")]
    pub buyer_id: i64,
    /// Ids of the basket items to remove
    pub items: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrdersRequest {
    #[serde(alias = "orders")]
    pub order_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStateRequest {
    pub state: OrderState,
}

//--------------------------------------   Basket changes    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketLine {
    pub product_supplier_id: i64,
    pub quantity: i64,
}

/// A validated set of basket lines for one buyer, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketChange {
    pub buyer_id: i64,
    pub lines: Vec<BasketLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketUpdate {
    pub buyer_id: i64,
    pub order_id: i64,
    pub items: usize,
}

/// Maps basket (order) ids to the number of items written to them.
pub fn basket_update_summary(updates: &[BasketUpdate]) -> BTreeMap<i64, usize> {
    let mut result = BTreeMap::new();
    for update in updates {
        *result.entry(update.order_id).or_insert(0) += update.items;
    }
    result
}

/// The distinct listing keys referenced by a basket request.
pub fn requested_listing_keys(requests: &[BasketRequest]) -> Vec<ListingKey> {
    let mut keys = requests
        .iter()
        .flat_map(|r| r.items.iter().map(|i| ListingKey::new(i.product_id, i.supplier_id)))
        .collect::<Vec<_>>();
    keys.sort();
    keys.dedup();
    keys
}

/// Validates a basket request against the buyers the caller owns and a snapshot of the catalogue.
///
/// Entries for the same buyer are merged, and for a repeated listing the last quantity wins. The whole request is
/// rejected on the first buyer that fails: either the buyer is not owned by the caller, or at least one of the
/// buyer's items is unknown, out of stock or has a quantity below one. All problems for that buyer are reported
/// together.
pub fn reconcile_basket_request(
    owned_buyers: &[i64],
    snapshot: &[ListingStock],
    requests: &[BasketRequest],
) -> Result<Vec<BasketChange>, OrderFlowError> {
    if requests.is_empty() {
        return Err(OrderFlowError::EmptyRequest);
    }
    let catalog = snapshot
        .iter()
        .map(|s| (ListingKey::new(s.product_id, s.supplier_id), s))
        .collect::<HashMap<ListingKey, &ListingStock>>();
    let mut merged: Vec<(i64, Vec<&BasketItemRequest>)> = Vec::new();
    for request in requests {
        match merged.iter_mut().find(|(id, _)| *id == request.buyer_id) {
            Some((_, items)) => items.extend(request.items.iter()),
            None => merged.push((request.buyer_id, request.items.iter().collect())),
        }
    }
    let mut changes = Vec::with_capacity(merged.len());
    for (buyer_id, items) in merged {
        if !owned_buyers.contains(&buyer_id) {
            return Err(OrderFlowError::BuyerNotOwned(buyer_id));
        }
        let mut problems = Vec::new();
        if items.is_empty() {
            problems.push("No items were given.".to_string());
        }
        let mut lines: Vec<(ListingKey, BasketLine)> = Vec::new();
        for item in items {
            let key = ListingKey::new(item.product_id, item.supplier_id);
            let Some(stock) = catalog.get(&key) else {
                problems.push(format!("Product #{} is not offered by supplier #{}.", key.product_id, key.supplier_id));
                continue;
            };
            let line = BasketLine { product_supplier_id: stock.product_supplier_id, quantity: item.quantity };
            match lines.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => *existing = line,
                None => lines.push((key, line)),
            }
        }
        for (key, line) in &lines {
            let stock = catalog.get(key).map(|s| s.quantity).unwrap_or_default();
            if line.quantity < 1 {
                problems.push(format!(
                    "The quantity of product #{} from supplier #{} must be at least 1.",
                    key.product_id, key.supplier_id
                ));
            } else if line.quantity > stock {
                problems.push(format!(
                    "Only {stock} of product #{} are available from supplier #{}.",
                    key.product_id, key.supplier_id
                ));
            }
        }
        if !problems.is_empty() {
            return Err(OrderFlowError::InvalidBasketItems { buyer_id, problems: problems.join(" ") });
        }
        changes.push(BasketChange { buyer_id, lines: lines.into_iter().map(|(_, l)| l).collect() });
    }
    Ok(changes)
}

//--------------------------------------   Basket deletion   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionResult {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub buyer_id: i64,
    #[serde(flatten)]
    pub result: DeletionResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStatus {
    AllSucceeded,
    Partial,
    AllFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub results: Vec<DeletionOutcome>,
}

impl DeletionReport {
    pub fn push_success(&mut self, buyer_id: i64, message: String) {
        self.results.push(DeletionOutcome { buyer_id, result: DeletionResult::Success(message) });
    }

    pub fn push_error(&mut self, buyer_id: i64, message: String) {
        self.results.push(DeletionOutcome { buyer_id, result: DeletionResult::Error(message) });
    }

    pub fn status(&self) -> DeletionStatus {
        let successes = self.results.iter().filter(|o| matches!(o.result, DeletionResult::Success(_))).count();
        match successes {
            0 => DeletionStatus::AllFailed,
            n if n == self.results.len() => DeletionStatus::AllSucceeded,
            _ => DeletionStatus::Partial,
        }
    }
}

//--------------------------------------     Read views      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: i64,
    pub product_supplier_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub sum: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketView {
    pub buyer_id: i64,
    pub order_id: i64,
    pub order_sum: Money,
    pub order_items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerOrderView {
    pub id: i64,
    pub state: OrderState,
    pub order_sum: Money,
    pub order_items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerOrders {
    pub buyer_id: i64,
    pub buyer_sum: Money,
    pub orders: Vec<BuyerOrderView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOrderItemView {
    pub product_supplier_id: i64,
    pub product_name: String,
    pub external_id: i64,
    pub quantity: i64,
    pub sum: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOrderView {
    pub id: i64,
    pub buyer_id: i64,
    pub state: OrderState,
    pub order_sum: Money,
    pub order_items: Vec<SupplierOrderItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierOrders {
    pub supplier_id: i64,
    pub supplier_sum: Money,
    pub orders: Vec<SupplierOrderView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummaryItem {
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
    pub sum: Money,
}

/// A placed order as presented in notification messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub buyer_id: i64,
    pub buyer_name: String,
    pub state: OrderState,
    pub order_sum: Money,
    pub items: Vec<OrderSummaryItem>,
}

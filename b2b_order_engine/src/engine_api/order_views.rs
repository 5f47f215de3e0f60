//! Builds the nested basket and order views from flat [`OrderLine`] rows.
use crate::{
    db_types::Money,
    order_objects::{
        BasketView,
        BuyerOrderView,
        BuyerOrders,
        OrderItemView,
        OrderSummary,
        OrderSummaryItem,
        SupplierOrderItemView,
        SupplierOrderView,
        SupplierOrders,
    },
    traits::OrderLine,
};

/// Groups consecutive lines by order id. The first line of each group carries the order header; the group's items
/// are the lines that carry an item.
fn group_by_order<'a, I>(lines: I) -> Vec<(&'a OrderLine, Vec<&'a OrderLine>)>
where I: IntoIterator<Item = &'a OrderLine> {
    let mut groups: Vec<(&OrderLine, Vec<&OrderLine>)> = Vec::new();
    for line in lines {
        let same_order = groups.last().map(|(h, _)| h.order_id == line.order_id).unwrap_or(false);
        if !same_order {
            groups.push((line, Vec::new()));
        }
        if line.item_id.is_some() {
            if let Some((_, items)) = groups.last_mut() {
                items.push(line);
            }
        }
    }
    groups
}

fn item_view(line: &OrderLine) -> OrderItemView {
    OrderItemView {
        id: line.item_id.unwrap_or_default(),
        product_supplier_id: line.product_supplier_id.unwrap_or_default(),
        product_name: line.product_name.clone().unwrap_or_default(),
        quantity: line.quantity.unwrap_or_default(),
        sum: line.sum(),
    }
}

fn total(items: &[&OrderLine]) -> Money {
    items.iter().map(|l| l.sum()).sum()
}

pub fn basket_views(lines: &[OrderLine]) -> Vec<BasketView> {
    group_by_order(lines)
        .into_iter()
        .map(|(header, items)| BasketView {
            buyer_id: header.buyer_id,
            order_id: header.order_id,
            order_sum: total(&items),
            order_items: items.into_iter().map(item_view).collect(),
        })
        .collect()
}

/// One entry per buyer in `buyer_ids`, including buyers with no orders.
pub fn buyer_order_views(buyer_ids: &[i64], lines: &[OrderLine]) -> Vec<BuyerOrders> {
    buyer_ids
        .iter()
        .map(|&buyer_id| {
            let orders = group_by_order(lines.iter().filter(|l| l.buyer_id == buyer_id))
                .into_iter()
                .map(|(header, items)| BuyerOrderView {
                    id: header.order_id,
                    state: header.state,
                    order_sum: total(&items),
                    order_items: items.into_iter().map(item_view).collect(),
                })
                .collect::<Vec<_>>();
            let buyer_sum = orders.iter().map(|o| o.order_sum).sum();
            BuyerOrders { buyer_id, buyer_sum, orders }
        })
        .collect()
}

/// One entry per supplier in `supplier_ids`. Each order only shows the items that supplier provides.
pub fn supplier_order_views(supplier_ids: &[i64], lines: &[OrderLine]) -> Vec<SupplierOrders> {
    supplier_ids
        .iter()
        .map(|&supplier_id| {
            let orders = group_by_order(lines.iter().filter(|l| l.supplier_id == Some(supplier_id)))
                .into_iter()
                .map(|(header, items)| SupplierOrderView {
                    id: header.order_id,
                    buyer_id: header.buyer_id,
                    state: header.state,
                    order_sum: total(&items),
                    order_items: items
                        .into_iter()
                        .map(|l| SupplierOrderItemView {
                            product_supplier_id: l.product_supplier_id.unwrap_or_default(),
                            product_name: l.product_name.clone().unwrap_or_default(),
                            external_id: l.external_id.unwrap_or_default(),
                            quantity: l.quantity.unwrap_or_default(),
                            sum: l.sum(),
                        })
                        .collect(),
                })
                .collect::<Vec<_>>();
            let supplier_sum = orders.iter().map(|o| o.order_sum).sum();
            SupplierOrders { supplier_id, supplier_sum, orders }
        })
        .collect()
}

pub fn order_summaries(lines: &[OrderLine]) -> Vec<OrderSummary> {
    group_by_order(lines)
        .into_iter()
        .map(|(header, items)| OrderSummary {
            id: header.order_id,
            buyer_id: header.buyer_id,
            buyer_name: header.buyer_name.clone(),
            state: header.state,
            order_sum: total(&items),
            items: items
                .into_iter()
                .map(|l| OrderSummaryItem {
                    product_name: l.product_name.clone().unwrap_or_default(),
                    quantity: l.quantity.unwrap_or_default(),
                    price: l.price.unwrap_or_default(),
                    sum: l.sum(),
                })
                .collect(),
        })
        .collect()
}

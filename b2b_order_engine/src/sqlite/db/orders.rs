use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Order, OrderState},
    traits::{ListingKey, ListingStock, OrderLine, OrderLineFilter},
};

/// Current stock of the given listings, limited to suppliers that are available.
pub async fn fetch_listing_stock(
    keys: &[ListingKey],
    conn: &mut SqliteConnection,
) -> Result<Vec<ListingStock>, sqlx::Error> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(
        r#"SELECT ps.id AS product_supplier_id, ps.product_id, ps.supplier_id, ps.quantity
        FROM product_suppliers ps
        JOIN suppliers s ON s.id = ps.supplier_id
        WHERE s.is_available = 1 AND ("#,
    );
    let mut keys_clause = builder.separated(" OR ");
    for key in keys {
        keys_clause.push("(ps.product_id = ");
        keys_clause.push_bind_unseparated(key.product_id);
        keys_clause.push_unseparated(" AND ps.supplier_id = ");
        keys_clause.push_bind_unseparated(key.supplier_id);
        keys_clause.push_unseparated(")");
    }
    builder.push(")");
    builder.build_query_as::<ListingStock>().fetch_all(conn).await
}

pub async fn fetch_basket_id(buyer_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM orders WHERE buyer_id = ? AND state = 'basket'")
        .bind(buyer_id)
        .fetch_optional(conn)
        .await
}

/// Returns the id of the buyer's basket, creating an empty one if necessary.
pub async fn fetch_or_create_basket(buyer_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    if let Some(id) = fetch_basket_id(buyer_id, &mut *conn).await? {
        return Ok(id);
    }
    let id = sqlx::query_scalar("INSERT INTO orders (buyer_id, state) VALUES (?, 'basket') RETURNING id")
        .bind(buyer_id)
        .fetch_one(conn)
        .await?;
    debug!("🛒️ Created basket #{id} for buyer #{buyer_id}");
    Ok(id)
}

/// Sets the quantity of a listing in the order, adding the item if it is not there yet.
pub async fn upsert_order_item(
    order_id: i64,
    product_supplier_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO order_items (order_id, product_supplier_id, quantity) VALUES (?, ?, ?)
        ON CONFLICT (order_id, product_supplier_id) DO UPDATE SET quantity = excluded.quantity"#,
    )
    .bind(order_id)
    .bind(product_supplier_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    touch_order(order_id, conn).await
}

pub async fn delete_order_items(
    order_id: i64,
    item_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    if item_ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("DELETE FROM order_items WHERE order_id = ");
    builder.push_bind(order_id).push(" AND id IN (");
    let mut ids = builder.separated(", ");
    for id in item_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
    let deleted = builder.build().execute(&mut *conn).await?.rows_affected();
    if deleted > 0 {
        touch_order(order_id, conn).await?;
    }
    Ok(deleted)
}

async fn touch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = ?").bind(order_id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_order_lines(
    filter: OrderLineFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
        SELECT o.id AS order_id, o.buyer_id, b.name AS buyer_name, o.state,
               oi.id AS item_id, oi.product_supplier_id, ps.supplier_id, p.name AS product_name,
               ps.external_id, ps.price, oi.quantity
        FROM orders o
        JOIN buyers b ON b.id = o.buyer_id
        LEFT JOIN order_items oi ON oi.order_id = o.id
        LEFT JOIN product_suppliers ps ON ps.id = oi.product_supplier_id
        LEFT JOIN products p ON p.id = ps.product_id
        WHERE "#,
    );
    match filter {
        OrderLineFilter::BasketsOfUser(user_id) => {
            builder.push("b.user_id = ").push_bind(user_id).push(" AND o.state = 'basket'");
        },
        OrderLineFilter::PlacedOrdersOfUser(user_id) => {
            builder.push("b.user_id = ").push_bind(user_id).push(" AND o.state <> 'basket'");
        },
        OrderLineFilter::SupplierItemsOfUser(user_id) => {
            builder
                .push("o.state <> 'basket' AND ps.supplier_id IN (SELECT id FROM suppliers WHERE user_id = ")
                .push_bind(user_id)
                .push(")");
        },
        OrderLineFilter::Orders(ids) => {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            builder.push("o.id IN (");
            let mut id_list = builder.separated(", ");
            for id in ids {
                id_list.push_bind(id);
            }
            id_list.push_unseparated(")");
        },
    }
    builder.push(" ORDER BY o.id, oi.id");
    trace!("🛒️ Executing query: {}", builder.sql());
    builder.build_query_as::<OrderLine>().fetch_all(conn).await
}

/// Ids of the baskets belonging to any buyer owned by the user.
pub async fn fetch_basket_ids_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT o.id FROM orders o JOIN buyers b ON b.id = o.buyer_id
        WHERE b.user_id = ? AND o.state = 'basket' ORDER BY o.id"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = ?").bind(order_id).fetch_optional(conn).await
}

/// Compare-and-set on the order state. Returns `None` if the order is not currently in state `from`.
pub async fn update_order_state(
    order_id: i64,
    from: OrderState,
    to: OrderState,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET state = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND state = ? RETURNING *",
    )
    .bind(to)
    .bind(order_id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("🛒️ Order #{order_id} moved from {from} to {to}");
    }
    Ok(order)
}

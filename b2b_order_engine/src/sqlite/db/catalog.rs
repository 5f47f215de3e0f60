use std::collections::HashMap;

use log::trace;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    catalog_objects::PriceListGood,
    db_types::Money,
    traits::{CategoryView, ListedProduct, ListingQuery, ListingView},
};

#[derive(FromRow)]
struct CategorySupplierRow {
    id: i64,
    name: String,
    supplier: Option<String>,
}

/// All categories, each with the names of the available suppliers linked to it.
pub async fn fetch_categories(conn: &mut SqliteConnection) -> Result<Vec<CategoryView>, sqlx::Error> {
    let rows: Vec<CategorySupplierRow> = sqlx::query_as(
        r#"
        SELECT c.id, c.name, s.name AS supplier
        FROM product_categories c
        LEFT JOIN category_suppliers cs ON cs.category_id = c.id
        LEFT JOIN suppliers s ON s.id = cs.supplier_id AND s.is_available = 1
        ORDER BY c.id, s.id
        "#,
    )
    .fetch_all(conn)
    .await?;
    let mut categories: Vec<(CategoryView, Vec<String>)> = Vec::new();
    for row in rows {
        if categories.last().map(|(c, _)| c.id != row.id).unwrap_or(true) {
            categories.push((CategoryView { id: row.id, name: row.name, suppliers: String::new() }, Vec::new()));
        }
        if let (Some(supplier), Some((_, names))) = (row.supplier, categories.last_mut()) {
            names.push(supplier);
        }
    }
    Ok(categories
        .into_iter()
        .map(|(mut category, names)| {
            category.suppliers = names.join(", ");
            category
        })
        .collect())
}

#[derive(FromRow)]
struct ListingRow {
    listing_id: i64,
    product_id: i64,
    product_name: String,
    category_name: String,
    model: String,
    supplier_id: i64,
    quantity: i64,
    price: Money,
}

#[derive(FromRow)]
struct ParameterRow {
    product_supplier_id: i64,
    name: String,
    value: String,
}

pub async fn search_listings(query: ListingQuery, conn: &mut SqliteConnection) -> Result<Vec<ListingView>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
        SELECT ps.id AS listing_id, p.id AS product_id, p.name AS product_name, c.name AS category_name,
               ps.model, ps.supplier_id, ps.quantity, ps.price
        FROM product_suppliers ps
        JOIN products p ON p.id = ps.product_id
        JOIN product_categories c ON c.id = p.category_id
        JOIN suppliers s ON s.id = ps.supplier_id
        WHERE s.is_available = 1"#,
    );
    if let Some(supplier_id) = query.supplier_id {
        builder.push(" AND ps.supplier_id = ").push_bind(supplier_id);
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(product_id) = query.product_id {
        builder.push(" AND p.id = ").push_bind(product_id);
    }
    builder.push(" ORDER BY ps.id");
    trace!("📦️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<ListingRow>().fetch_all(&mut *conn).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mut params = QueryBuilder::new(
        r#"SELECT psp.product_supplier_id, pr.name, psp.value
        FROM product_supplier_parameters psp
        JOIN parameters pr ON pr.id = psp.parameter_id
        WHERE psp.product_supplier_id IN ("#,
    );
    let mut ids = params.separated(", ");
    for row in &rows {
        ids.push_bind(row.listing_id);
    }
    ids.push_unseparated(") ORDER BY psp.id");
    let mut parameters: HashMap<i64, Vec<String>> = HashMap::new();
    for p in params.build_query_as::<ParameterRow>().fetch_all(conn).await? {
        parameters.entry(p.product_supplier_id).or_default().push(format!("{}: {}", p.name, p.value));
    }
    Ok(rows
        .into_iter()
        .map(|row| ListingView {
            product: ListedProduct { id: row.product_id, name: row.product_name, category: row.category_name },
            model: row.model,
            supplier: row.supplier_id,
            quantity: row.quantity,
            price: row.price,
            p_parameters: parameters.remove(&row.listing_id).unwrap_or_default(),
        })
        .collect())
}

//--------------------------------------  Price list import  ---------------------------------------------------------
/// Inserts the category or renames an existing one, and links it to the supplier.
pub async fn upsert_category(
    id: i64,
    name: &str,
    supplier_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO product_categories (id, name) VALUES (?, ?) ON CONFLICT (id) DO UPDATE SET name = excluded.name")
        .bind(id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    sqlx::query("INSERT OR IGNORE INTO category_suppliers (category_id, supplier_id) VALUES (?, ?)")
        .bind(id)
        .bind(supplier_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Deletes every listing of the supplier. Parameter values and order items referencing them go too.
pub async fn delete_supplier_listings(supplier_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM product_suppliers WHERE supplier_id = ?").bind(supplier_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Returns the id of the product with this name, creating it in `category_id` if it does not exist.
pub async fn fetch_or_create_product(
    name: &str,
    category_id: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"INSERT INTO products (name, category_id) VALUES (?, ?)
        ON CONFLICT (name) DO UPDATE SET name = excluded.name
        RETURNING id"#,
    )
    .bind(name)
    .bind(category_id)
    .fetch_one(conn)
    .await
}

/// Inserts the supplier's listing for the product. A repeated product in the same price list overwrites the
/// earlier entry.
pub async fn upsert_listing(
    product_id: i64,
    supplier_id: i64,
    good: &PriceListGood,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"INSERT INTO product_suppliers (product_id, supplier_id, external_id, model, price, price_rrc, quantity)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (product_id, supplier_id) DO UPDATE SET
            external_id = excluded.external_id,
            model = excluded.model,
            price = excluded.price,
            price_rrc = excluded.price_rrc,
            quantity = excluded.quantity
        RETURNING id"#,
    )
    .bind(product_id)
    .bind(supplier_id)
    .bind(good.id)
    .bind(&good.model)
    .bind(good.price)
    .bind(good.price_rrc)
    .bind(good.quantity)
    .fetch_one(conn)
    .await
}

pub async fn fetch_or_create_parameter(name: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO parameters (name) VALUES (?) ON CONFLICT (name) DO UPDATE SET name = excluded.name RETURNING id",
    )
    .bind(name)
    .fetch_one(conn)
    .await
}

pub async fn upsert_listing_parameter(
    listing_id: i64,
    parameter_id: i64,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO product_supplier_parameters (product_supplier_id, parameter_id, value) VALUES (?, ?, ?)
        ON CONFLICT (product_supplier_id, parameter_id) DO UPDATE SET value = excluded.value"#,
    )
    .bind(listing_id)
    .bind(parameter_id)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Buyer, BuyerUpdate, NewBuyer, NewSupplier, Supplier, SupplierUpdate},
    traits::{DirectoryError, Pagination},
};

fn push_owner_filter(builder: &mut QueryBuilder<'_, Sqlite>, owner: Option<i64>) {
    if let Some(user_id) = owner {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
}

//--------------------------------------        Buyers       ---------------------------------------------------------
pub async fn fetch_buyer(
    id: i64,
    owner: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<Buyer>, DirectoryError> {
    let mut builder = QueryBuilder::new("SELECT * FROM buyers WHERE id = ");
    builder.push_bind(id);
    push_owner_filter(&mut builder, owner);
    let buyer = builder.build_query_as::<Buyer>().fetch_optional(conn).await?;
    Ok(buyer)
}

/// Returns the requested page of buyers, ordered by id, along with the total number of matching buyers.
pub async fn fetch_buyers(
    owner: Option<i64>,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Buyer>, i64), DirectoryError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM buyers WHERE 1 = 1");
    push_owner_filter(&mut count_query, owner);
    let count: i64 = count_query.build_query_scalar().fetch_one(&mut *conn).await?;
    let mut builder = QueryBuilder::new("SELECT * FROM buyers WHERE 1 = 1");
    push_owner_filter(&mut builder, owner);
    builder.push(" ORDER BY id LIMIT ").push_bind(page.limit()).push(" OFFSET ").push_bind(page.offset());
    let buyers = builder.build_query_as::<Buyer>().fetch_all(conn).await?;
    Ok((buyers, count))
}

pub async fn insert_buyer(user_id: i64, buyer: NewBuyer, conn: &mut SqliteConnection) -> Result<Buyer, DirectoryError> {
    let buyer: Buyer = sqlx::query_as(
        r#"
            INSERT INTO buyers (
                user_id,
                name,
                person,
                phone,
                region,
                district,
                locality_name,
                street,
                house,
                structure,
                building,
                apartment
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(buyer.name)
    .bind(buyer.person)
    .bind(buyer.phone)
    .bind(buyer.region)
    .bind(buyer.district)
    .bind(buyer.locality_name)
    .bind(buyer.street)
    .bind(buyer.house)
    .bind(buyer.structure)
    .bind(buyer.building)
    .bind(buyer.apartment)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Buyer #{} created for user #{user_id}", buyer.id);
    Ok(buyer)
}

pub async fn update_buyer(
    id: i64,
    owner: Option<i64>,
    update: BuyerUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Buyer>, DirectoryError> {
    let fields = [
        ("name", update.name),
        ("person", update.person),
        ("phone", update.phone),
        ("region", update.region),
        ("district", update.district),
        ("locality_name", update.locality_name),
        ("street", update.street),
        ("house", update.house),
        ("structure", update.structure),
        ("building", update.building),
        ("apartment", update.apartment),
    ];
    if fields.iter().all(|(_, v)| v.is_none()) {
        trace!("🗃️ No fields to update for buyer #{id}");
        return fetch_buyer(id, owner, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE buyers SET ");
    let mut set_clause = builder.separated(", ");
    for (column, value) in fields {
        if let Some(value) = value {
            set_clause.push(format!("{column} = ")).push_bind_unseparated(value);
        }
    }
    builder.push(" WHERE id = ").push_bind(id);
    push_owner_filter(&mut builder, owner);
    builder.push(" RETURNING *");
    let buyer = builder.build_query_as::<Buyer>().fetch_optional(conn).await?;
    Ok(buyer)
}

pub async fn delete_buyer(id: i64, owner: Option<i64>, conn: &mut SqliteConnection) -> Result<u64, DirectoryError> {
    let mut builder = QueryBuilder::new("DELETE FROM buyers WHERE id = ");
    builder.push_bind(id);
    push_owner_filter(&mut builder, owner);
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn fetch_buyer_ids_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM buyers WHERE user_id = ? ORDER BY id").bind(user_id).fetch_all(conn).await
}

//--------------------------------------      Suppliers      ---------------------------------------------------------
pub async fn fetch_supplier(
    id: i64,
    owner: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<Supplier>, DirectoryError> {
    let mut builder = QueryBuilder::new("SELECT * FROM suppliers WHERE id = ");
    builder.push_bind(id);
    push_owner_filter(&mut builder, owner);
    let supplier = builder.build_query_as::<Supplier>().fetch_optional(conn).await?;
    Ok(supplier)
}

/// Returns the requested page of suppliers (available ones first, then by id) and the total number of matches.
pub async fn fetch_suppliers(
    owner: Option<i64>,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Supplier>, i64), DirectoryError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM suppliers WHERE 1 = 1");
    push_owner_filter(&mut count_query, owner);
    let count: i64 = count_query.build_query_scalar().fetch_one(&mut *conn).await?;
    let mut builder = QueryBuilder::new("SELECT * FROM suppliers WHERE 1 = 1");
    push_owner_filter(&mut builder, owner);
    builder
        .push(" ORDER BY is_available DESC, id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let suppliers = builder.build_query_as::<Supplier>().fetch_all(conn).await?;
    Ok((suppliers, count))
}

pub async fn insert_supplier(
    user_id: i64,
    supplier: NewSupplier,
    conn: &mut SqliteConnection,
) -> Result<Supplier, DirectoryError> {
    let supplier: Supplier = sqlx::query_as(
        r#"INSERT INTO suppliers (user_id, name, person, phone, file_url, is_available)
        VALUES (?, ?, ?, ?, ?, ?) RETURNING *"#,
    )
    .bind(user_id)
    .bind(supplier.name)
    .bind(supplier.person)
    .bind(supplier.phone)
    .bind(supplier.file_url)
    .bind(supplier.is_available)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Supplier #{} created for user #{user_id}", supplier.id);
    Ok(supplier)
}

pub async fn update_supplier(
    id: i64,
    owner: Option<i64>,
    update: SupplierUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Supplier>, DirectoryError> {
    let is_empty = update.name.is_none() &&
        update.person.is_none() &&
        update.phone.is_none() &&
        update.file_url.is_none() &&
        update.is_available.is_none();
    if is_empty {
        trace!("🗃️ No fields to update for supplier #{id}");
        return fetch_supplier(id, owner, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE suppliers SET ");
    let mut set_clause = builder.separated(", ");
    for (column, value) in [("name", update.name), ("person", update.person), ("phone", update.phone)] {
        if let Some(value) = value {
            set_clause.push(format!("{column} = ")).push_bind_unseparated(value);
        }
    }
    if let Some(file_url) = update.file_url {
        set_clause.push("file_url = ").push_bind_unseparated(file_url);
    }
    if let Some(available) = update.is_available {
        set_clause.push("is_available = ").push_bind_unseparated(available);
    }
    builder.push(" WHERE id = ").push_bind(id);
    push_owner_filter(&mut builder, owner);
    builder.push(" RETURNING *");
    let supplier = builder.build_query_as::<Supplier>().fetch_optional(conn).await?;
    Ok(supplier)
}

pub async fn delete_supplier(id: i64, owner: Option<i64>, conn: &mut SqliteConnection) -> Result<u64, DirectoryError> {
    let mut builder = QueryBuilder::new("DELETE FROM suppliers WHERE id = ");
    builder.push_bind(id);
    push_owner_filter(&mut builder, owner);
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn set_supplier_file_url(id: i64, file_url: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE suppliers SET file_url = ? WHERE id = ?").bind(file_url).bind(id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_supplier_ids_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM suppliers WHERE user_id = ? ORDER BY id").bind(user_id).fetch_all(conn).await
}

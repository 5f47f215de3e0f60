//! `SqliteDatabase` is the SQLite backend of the order engine. It implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{catalog, db_url, directory, new_pool, orders, tokens, users};
use crate::{
    catalog_objects::PriceList,
    db_types::{
        Buyer,
        BuyerUpdate,
        NewBuyer,
        NewSupplier,
        NewUser,
        Order,
        OrderState,
        PasswordResetToken,
        Supplier,
        SupplierUpdate,
        User,
        UserType,
        UserUpdate,
    },
    order_objects::{BasketChange, BasketUpdate},
    traits::{
        AccountApiError,
        AccountManagement,
        CatalogError,
        CatalogManagement,
        CategoryView,
        DirectoryError,
        DirectoryManagement,
        ImportSummary,
        ListingKey,
        ListingQuery,
        ListingStock,
        ListingView,
        OrderFlowError,
        OrderLine,
        OrderLineFilter,
        OrderManagement,
        Page,
        Pagination,
        PlacementResult,
        UserProfile,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `B2B_DATABASE_URL` (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(user_id, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_email(email, &mut conn).await
    }

    async fn create_user(&self, user: NewUser, confirmation_token: Option<String>) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        if let Some(token) = confirmation_token {
            tokens::upsert_confirmation_token(user.id, &token, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_confirmation_token(&self, user_id: i64) -> Result<Option<String>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        tokens::fetch_confirmation_token(user_id, &mut conn).await
    }

    async fn activate_user(&self, user_id: i64) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::set_active(user_id, true, &mut tx).await?.ok_or(AccountApiError::UserNotFound)?;
        tokens::delete_confirmation_token(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User #{user_id} activated");
        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: i64,
        update: UserUpdate,
        confirmation_token: Option<String>,
    ) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let deactivate = confirmation_token.is_some();
        let user = users::update_user(user_id, update, deactivate, &mut tx).await?.ok_or(AccountApiError::UserNotFound)?;
        if let Some(token) = confirmation_token {
            tokens::upsert_confirmation_token(user_id, &token, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(user)
    }

    async fn deactivate_user(&self, user_id: i64) -> Result<User, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::set_active(user_id, false, &mut conn).await?.ok_or(AccountApiError::UserNotFound)?;
        debug!("🗃️ User #{user_id} deactivated");
        Ok(user)
    }

    async fn store_password_reset_token(&self, user_id: i64, token: &str) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        tokens::insert_reset_token(user_id, token, &mut conn).await
    }

    async fn fetch_password_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        tokens::fetch_reset_token(token, &mut conn).await
    }

    async fn reset_password(&self, user_id: i64, password_hash: &str) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let update = UserUpdate { password_hash: Some(password_hash.to_string()), ..Default::default() };
        let user = users::update_user(user_id, update, false, &mut tx).await?.ok_or(AccountApiError::UserNotFound)?;
        let removed = tokens::delete_reset_tokens_for_user(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Password for user #{user_id} reset. {removed} reset tokens removed");
        Ok(user)
    }

    async fn purge_password_reset_tokens(&self, cutoff: DateTime<Utc>) -> Result<u64, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        tokens::purge_reset_tokens(cutoff, &mut conn).await
    }

    async fn fetch_admin_emails(&self) -> Result<Vec<String>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_admin_emails(&mut conn).await
    }

    async fn fetch_profile(&self, user_id: i64) -> Result<Option<UserProfile>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let Some(user) = users::fetch_user_by_id(user_id, &mut conn).await? else {
            return Ok(None);
        };
        let everything = Pagination::new(1, u32::MAX);
        let to_account_error = |e: DirectoryError| AccountApiError::DatabaseError(e.to_string());
        let profile = match user.user_type {
            UserType::Buyer => {
                let (buyers, _) =
                    directory::fetch_buyers(Some(user_id), everything, &mut conn).await.map_err(to_account_error)?;
                UserProfile { user, buyers: Some(buyers), suppliers: None }
            },
            UserType::Supplier => {
                let (suppliers, _) =
                    directory::fetch_suppliers(Some(user_id), everything, &mut conn).await.map_err(to_account_error)?;
                UserProfile { user, buyers: None, suppliers: Some(suppliers) }
            },
        };
        Ok(Some(profile))
    }
}

impl DirectoryManagement for SqliteDatabase {
    async fn fetch_buyer(&self, buyer_id: i64, owner: Option<i64>) -> Result<Option<Buyer>, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        directory::fetch_buyer(buyer_id, owner, &mut conn).await
    }

    async fn fetch_buyers(&self, owner: Option<i64>, page: Pagination) -> Result<Page<Buyer>, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        let (buyers, count) = directory::fetch_buyers(owner, page, &mut conn).await?;
        Ok(Page::new(buyers, count, page))
    }

    async fn insert_buyer(&self, user_id: i64, buyer: NewBuyer) -> Result<Buyer, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        directory::insert_buyer(user_id, buyer, &mut conn).await
    }

    async fn update_buyer(
        &self,
        buyer_id: i64,
        owner: Option<i64>,
        update: BuyerUpdate,
    ) -> Result<Buyer, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        directory::update_buyer(buyer_id, owner, update, &mut conn).await?.ok_or(DirectoryError::BuyerNotFound(buyer_id))
    }

    async fn delete_buyer(&self, buyer_id: i64, owner: Option<i64>) -> Result<(), DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        match directory::delete_buyer(buyer_id, owner, &mut conn).await? {
            0 => Err(DirectoryError::BuyerNotFound(buyer_id)),
            _ => Ok(()),
        }
    }

    async fn fetch_supplier(&self, supplier_id: i64, owner: Option<i64>) -> Result<Option<Supplier>, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        directory::fetch_supplier(supplier_id, owner, &mut conn).await
    }

    async fn fetch_suppliers(&self, owner: Option<i64>, page: Pagination) -> Result<Page<Supplier>, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        let (suppliers, count) = directory::fetch_suppliers(owner, page, &mut conn).await?;
        Ok(Page::new(suppliers, count, page))
    }

    async fn insert_supplier(&self, user_id: i64, supplier: NewSupplier) -> Result<Supplier, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        directory::insert_supplier(user_id, supplier, &mut conn).await
    }

    async fn update_supplier(
        &self,
        supplier_id: i64,
        owner: Option<i64>,
        update: SupplierUpdate,
    ) -> Result<Supplier, DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        directory::update_supplier(supplier_id, owner, update, &mut conn)
            .await?
            .ok_or(DirectoryError::SupplierNotFound(supplier_id))
    }

    async fn delete_supplier(&self, supplier_id: i64, owner: Option<i64>) -> Result<(), DirectoryError> {
        let mut conn = self.pool.acquire().await?;
        match directory::delete_supplier(supplier_id, owner, &mut conn).await? {
            0 => Err(DirectoryError::SupplierNotFound(supplier_id)),
            _ => Ok(()),
        }
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_categories(&self) -> Result<Vec<CategoryView>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_categories(&mut conn).await?)
    }

    async fn search_listings(&self, query: ListingQuery) -> Result<Vec<ListingView>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::search_listings(query, &mut conn).await?)
    }

    async fn import_price_list(
        &self,
        supplier_id: i64,
        file_url: &str,
        price_list: &PriceList,
    ) -> Result<ImportSummary, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let supplier = directory::fetch_supplier(supplier_id, None, &mut tx)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?
            .ok_or(CatalogError::SupplierNotFound(supplier_id))?;
        if supplier.name != price_list.shop {
            return Err(CatalogError::ShopNameMismatch { expected: supplier.name, found: price_list.shop.clone() });
        }
        directory::set_supplier_file_url(supplier_id, file_url, &mut tx).await?;
        for category in &price_list.categories {
            catalog::upsert_category(category.id, &category.name, supplier_id, &mut tx).await?;
        }
        let removed = catalog::delete_supplier_listings(supplier_id, &mut tx).await?;
        let mut summary = ImportSummary { categories: price_list.categories.len(), ..Default::default() };
        for good in &price_list.goods {
            let product_id = catalog::fetch_or_create_product(&good.name, good.category, &mut tx).await?;
            let listing_id = catalog::upsert_listing(product_id, supplier_id, good, &mut tx).await?;
            for (name, value) in &good.parameters {
                let parameter_id = catalog::fetch_or_create_parameter(name, &mut tx).await?;
                catalog::upsert_listing_parameter(listing_id, parameter_id, value, &mut tx).await?;
                summary.parameters += 1;
            }
            summary.listings += 1;
        }
        tx.commit().await?;
        debug!(
            "📦️ Price list for supplier #{supplier_id} imported. {removed} old listings replaced by {}",
            summary.listings
        );
        Ok(summary)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_buyer_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(directory::fetch_buyer_ids_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_supplier_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(directory::fetch_supplier_ids_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_listing_stock(&self, keys: &[ListingKey]) -> Result<Vec<ListingStock>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_listing_stock(keys, &mut conn).await?)
    }

    async fn apply_basket_changes(&self, changes: &[BasketChange]) -> Result<Vec<BasketUpdate>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let mut updates = Vec::with_capacity(changes.len());
        for change in changes {
            let order_id = orders::fetch_or_create_basket(change.buyer_id, &mut tx).await?;
            for line in &change.lines {
                orders::upsert_order_item(order_id, line.product_supplier_id, line.quantity, &mut tx).await?;
            }
            updates.push(BasketUpdate { buyer_id: change.buyer_id, order_id, items: change.lines.len() });
        }
        tx.commit().await?;
        Ok(updates)
    }

    async fn delete_basket_items(
        &self,
        buyer_id: i64,
        item_ids: &[i64],
    ) -> Result<Option<(i64, u64)>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let Some(order_id) = orders::fetch_basket_id(buyer_id, &mut tx).await? else {
            return Ok(None);
        };
        let deleted = orders::delete_order_items(order_id, item_ids, &mut tx).await?;
        tx.commit().await?;
        Ok(Some((order_id, deleted)))
    }

    async fn fetch_order_lines(&self, filter: OrderLineFilter) -> Result<Vec<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_lines(filter, &mut conn).await?)
    }

    async fn place_orders(&self, user_id: i64, order_ids: &[i64]) -> Result<PlacementResult, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let baskets = orders::fetch_basket_ids_for_user(user_id, &mut tx).await?;
        let mut result = PlacementResult::default();
        for &id in order_ids {
            if result.placed.contains(&id) || result.rejected.contains(&id) {
                continue;
            }
            if baskets.contains(&id) &&
                orders::update_order_state(id, OrderState::Basket, OrderState::New, &mut tx).await?.is_some()
            {
                result.placed.push(id);
            } else {
                result.rejected.push(id);
            }
        }
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn update_order_state(
        &self,
        order_id: i64,
        from: OrderState,
        to: OrderState,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::update_order_state(order_id, from, to, &mut conn).await?)
    }
}

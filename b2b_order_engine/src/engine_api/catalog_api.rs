use std::fmt::Debug;

use log::*;

use crate::{
    catalog_objects::PriceList,
    db_types::Supplier,
    traits::{
        Caller,
        CatalogError,
        CatalogManagement,
        CategoryView,
        DirectoryManagement,
        ImportSummary,
        ListingQuery,
        ListingView,
    },
};

/// Read access to the public catalogue, and price list imports for suppliers.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement + DirectoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn categories(&self) -> Result<Vec<CategoryView>, CatalogError> {
        self.db.fetch_categories().await
    }

    pub async fn search_listings(&self, query: ListingQuery) -> Result<Vec<ListingView>, CatalogError> {
        trace!("📦️ Listing search: {query:?}");
        self.db.search_listings(query).await
    }

    /// The supplier the caller may import a price list for. It must belong to the caller, unless the caller is an
    /// administrator.
    pub async fn import_target(&self, caller: &Caller, supplier_id: i64) -> Result<Supplier, CatalogError> {
        let owner = (!caller.is_admin).then_some(caller.user_id);
        self.db
            .fetch_supplier(supplier_id, owner)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?
            .ok_or(CatalogError::SupplierNotFound(supplier_id))
    }

    /// Replaces the supplier's listings with the contents of `price_list`. See [`Self::import_target`].
    pub async fn import_price_list(
        &self,
        caller: &Caller,
        supplier_id: i64,
        file_url: &str,
        price_list: &PriceList,
    ) -> Result<ImportSummary, CatalogError> {
        let supplier = self.import_target(caller, supplier_id).await?;
        let summary = self.db.import_price_list(supplier.id, file_url, price_list).await?;
        info!(
            "📦️ Imported price list for supplier #{} ({}): {} categories, {} listings, {} parameter values",
            supplier.id, supplier.name, summary.categories, summary.listings, summary.parameters
        );
        Ok(summary)
    }
}

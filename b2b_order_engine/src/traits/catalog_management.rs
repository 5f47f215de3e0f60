use thiserror::Error;

use crate::{
    catalog_objects::PriceList,
    traits::{CategoryView, ImportSummary, ListingQuery, ListingView},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Supplier #{0} does not exist or does not belong to the current user.")]
    SupplierNotFound(i64),
    #[error("The price list is for shop '{found}', but the supplier is '{expected}'.")]
    ShopNameMismatch { expected: String, found: String },
    #[error("Invalid price list. {0}")]
    InvalidPriceList(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// The `CatalogManagement` trait defines behaviour for reading the public catalogue and replacing a supplier's
/// listings from a price list.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_categories(&self) -> Result<Vec<CategoryView>, CatalogError>;

    /// Listings from available suppliers that match every filter in `query`.
    async fn search_listings(&self, query: ListingQuery) -> Result<Vec<ListingView>, CatalogError>;

    /// Replaces all of the supplier's listings with the contents of `price_list`, in a single transaction.
    ///
    /// Implementations must reject the import with [`CatalogError::ShopNameMismatch`] if the price list's shop name
    /// differs from the supplier's name. Order items referencing the replaced listings are removed with them.
    async fn import_price_list(
        &self,
        supplier_id: i64,
        file_url: &str,
        price_list: &PriceList,
    ) -> Result<ImportSummary, CatalogError>;
}

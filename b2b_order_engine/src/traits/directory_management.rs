use thiserror::Error;

use crate::{
    db_types::{Buyer, BuyerUpdate, NewBuyer, NewSupplier, Supplier, SupplierUpdate},
    traits::{Page, Pagination},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Buyer #{0} not found.")]
    BuyerNotFound(i64),
    #[error("Supplier #{0} not found.")]
    SupplierNotFound(i64),
    #[error("You do not have permission to manage {0}.")]
    Forbidden(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        DirectoryError::DatabaseError(e.to_string())
    }
}

/// The `DirectoryManagement` trait defines the storage behaviour for buyer and supplier organisations.
///
/// Ownership is enforced by the backend: the `owner` arguments restrict reads and writes to records belonging to
/// that user. `None` means no restriction.
#[allow(async_fn_in_trait)]
pub trait DirectoryManagement {
    async fn fetch_buyer(&self, buyer_id: i64, owner: Option<i64>) -> Result<Option<Buyer>, DirectoryError>;

    async fn fetch_buyers(&self, owner: Option<i64>, page: Pagination) -> Result<Page<Buyer>, DirectoryError>;

    async fn insert_buyer(&self, user_id: i64, buyer: NewBuyer) -> Result<Buyer, DirectoryError>;

    async fn update_buyer(
        &self,
        buyer_id: i64,
        owner: Option<i64>,
        update: BuyerUpdate,
    ) -> Result<Buyer, DirectoryError>;

    async fn delete_buyer(&self, buyer_id: i64, owner: Option<i64>) -> Result<(), DirectoryError>;

    async fn fetch_supplier(&self, supplier_id: i64, owner: Option<i64>) -> Result<Option<Supplier>, DirectoryError>;

    /// Suppliers are listed with available ones first, then by id.
    async fn fetch_suppliers(&self, owner: Option<i64>, page: Pagination) -> Result<Page<Supplier>, DirectoryError>;

    async fn insert_supplier(&self, user_id: i64, supplier: NewSupplier) -> Result<Supplier, DirectoryError>;

    async fn update_supplier(
        &self,
        supplier_id: i64,
        owner: Option<i64>,
        update: SupplierUpdate,
    ) -> Result<Supplier, DirectoryError>;

    /// Deleting a supplier removes its listings, and with them any order items referencing those listings.
    async fn delete_supplier(&self, supplier_id: i64, owner: Option<i64>) -> Result<(), DirectoryError>;
}

//! # Backend contracts.
//!
//! This module provides the interfaces that define the contracts of the order engine database *backends*.
//!
//! * [`AccountManagement`] stores users, their credentials and one-off email confirmation and password reset keys.
//! * [`DirectoryManagement`] stores the buyer and supplier organisations that users manage.
//! * [`CatalogManagement`] serves the public catalogue and replaces supplier listings from price lists.
//! * [`OrderManagement`] stores baskets and orders and moves them through their lifecycle.
//!
//! The public APIs in this crate are generic over these traits, so a backend only needs to implement the ones the
//! APIs it is used with require.
mod account_management;
mod catalog_management;
mod directory_management;
mod order_management;

mod data_objects;

pub use account_management::{AccountApiError, AccountManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{
    Caller,
    CategoryView,
    ImportSummary,
    ListedProduct,
    ListingKey,
    ListingQuery,
    ListingStock,
    ListingView,
    OrderLine,
    OrderLineFilter,
    Page,
    Pagination,
    PlacementResult,
    UserProfile,
    DEFAULT_PAGE_SIZE,
};
pub use directory_management::{DirectoryError, DirectoryManagement};
pub use order_management::{OrderFlowError, OrderManagement};

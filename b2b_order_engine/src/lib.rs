//! B2B Order Engine
//!
//! The order engine holds the core logic of a business-to-business ordering platform: suppliers publish price lists,
//! buyers fill baskets from the resulting catalogue and place them as orders, which then move through a small
//! lifecycle. The library is transport-agnostic.
//!
//! The library is divided into these main sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You
//!    should never need to access the database directly; use the public APIs instead. The row types used by the
//!    backend are public and live in [`mod@db_types`].
//! 2. The public APIs ([`AccountApi`], [`DirectoryApi`], [`CatalogApi`] and [`OrderFlowApi`]). Each is generic over
//!    the backend traits it needs.
//!
//! The engine also publishes [`mod@events`] when users register, request password resets, place orders, or when
//! an order changes state. Hooks subscribed to these events run asynchronously.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod engine_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use engine_api::{
    account_objects,
    accounts_api::{AccountApi, MAX_RESET_TOKEN_TTL_HOURS, MIN_RESET_TOKEN_TTL_HOURS},
    catalog_api::CatalogApi,
    catalog_objects,
    directory_api::DirectoryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub(crate) use engine_api::order_views;
pub use traits::{
    AccountApiError,
    AccountManagement,
    CatalogError,
    CatalogManagement,
    DirectoryError,
    DirectoryManagement,
    OrderFlowError,
    OrderManagement,
};

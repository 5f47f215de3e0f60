//! # Order engine public API
//!
//! The API is modular, so that clients can pick the functionality they need:
//!
//! * [`accounts_api`] handles registration, email confirmation, login, password resets and profiles.
//! * [`directory_api`] manages buyer and supplier organisations.
//! * [`catalog_api`] serves the public catalogue and imports supplier price lists.
//! * [`order_flow_api`] fills baskets, places orders and moves orders through their lifecycle.
//!
//! The other submodules hold request, response and support types.
//!
//! # API usage
//!
//! Every API is created from a backend that implements the backend traits it needs:
//!
//! ```rust,ignore
//! use b2b_order_engine::{CatalogApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/b2b_orders.db", 5).await?;
//! // SqliteDatabase implements CatalogManagement and DirectoryManagement
//! let api = CatalogApi::new(db);
//! let categories = api.categories().await?;
//! ```
pub mod account_objects;
pub mod accounts_api;
pub mod catalog_api;
pub mod catalog_objects;
pub mod directory_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_views;

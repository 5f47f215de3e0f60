//! # B2B order server
//! The HTTP front end of the ordering platform. It is responsible for:
//! * Registering users, confirming their email and issuing access tokens.
//! * Managing suppliers, buyers and their profiles.
//! * Importing supplier price lists and serving the product catalog.
//! * Maintaining buyer baskets and turning them into placed orders.
//! * Sending notification emails when the engine publishes events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Public routes live at the root (`/health`, `/user/*`, `/category`, `/supplier/products`, `/supplier`).
//! Everything under `/api` requires a bearer token. See [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod notifications;
pub mod price_list_fetcher;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;

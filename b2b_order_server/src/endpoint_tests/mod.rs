mod accounts;
mod auth;
mod baskets;
mod catalog;
mod directory;
mod helpers;
mod mocks;
mod orders;

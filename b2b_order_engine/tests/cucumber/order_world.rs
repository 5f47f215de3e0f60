use std::collections::HashMap;

use b2b_order_engine::{
    events::EventProducers,
    order_objects::DeletionReport,
    traits::{Caller, ListingQuery},
    CatalogApi,
    DirectoryApi,
    OrderFlowApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

use crate::support::prepare_test_env;

#[derive(Default, Debug, World)]
pub struct OrderWorld {
    pub system: Option<OrderSystem>,
    pub last_error: Option<String>,
    pub last_deletion: Option<DeletionReport>,
}

#[derive(Debug)]
pub struct OrderSystem {
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub directory: DirectoryApi<SqliteDatabase>,
    /// User ids by email
    pub users: HashMap<String, i64>,
    /// Buyer ids by name
    pub buyers: HashMap<String, i64>,
    /// Supplier ids by name
    pub suppliers: HashMap<String, i64>,
    /// Catalogue product ids by product name
    pub products: HashMap<String, i64>,
    /// The most recently placed order of each buyer, by buyer name
    pub placed: HashMap<String, i64>,
}

impl OrderWorld {
    pub fn system(&self) -> &OrderSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut OrderSystem {
        self.system.as_mut().expect("System not initialised")
    }
}

impl OrderSystem {
    pub async fn new() -> Self {
        let db = prepare_test_env().await;
        debug!("Created database: {}", db.url());
        Self {
            orders: OrderFlowApi::new(db.clone(), EventProducers::default()),
            catalog: CatalogApi::new(db.clone()),
            directory: DirectoryApi::new(db.clone()),
            db,
            users: HashMap::new(),
            buyers: HashMap::new(),
            suppliers: HashMap::new(),
            products: HashMap::new(),
            placed: HashMap::new(),
        }
    }

    pub fn user_id(&self, email: &str) -> i64 {
        *self.users.get(email).unwrap_or_else(|| panic!("Unknown user {email}"))
    }

    pub fn caller(&self, email: &str) -> Caller {
        Caller::user(self.user_id(email))
    }

    pub fn buyer_id(&self, name: &str) -> i64 {
        *self.buyers.get(name).unwrap_or_else(|| panic!("Unknown buyer {name}"))
    }

    pub fn supplier_id(&self, name: &str) -> i64 {
        *self.suppliers.get(name).unwrap_or_else(|| panic!("Unknown supplier {name}"))
    }

    pub fn product_id(&self, name: &str) -> i64 {
        *self.products.get(name).unwrap_or_else(|| panic!("Unknown product {name}"))
    }

    /// Remembers the product ids of everything the supplier currently lists.
    pub async fn record_listings(&mut self, supplier_id: i64) {
        let query = ListingQuery { supplier_id: Some(supplier_id), ..Default::default() };
        let listings = self.catalog.search_listings(query).await.expect("Error searching listings");
        for listing in listings {
            self.products.insert(listing.product.name, listing.product.id);
        }
    }
}

use std::{collections::BTreeMap, fmt::Display};

use b2b_order_engine::traits::Pagination;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

/// `?page=n` on list endpoints. Pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self, page_size: u32) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceListRequest {
    #[serde(alias = "supplier")]
    pub supplier_id: i64,
    #[serde(alias = "url")]
    pub file_url: String,
}

/// Number of items written to each basket, keyed by basket (order) id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketUpdateResponse {
    pub success: bool,
    pub added: BTreeMap<i64, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementResponse {
    pub success: bool,
    pub message: String,
    pub placed: Vec<i64>,
    pub rejected: Vec<i64>,
}

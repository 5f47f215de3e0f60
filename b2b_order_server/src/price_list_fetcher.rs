//! Downloads supplier price lists.
use std::time::Duration;

use b2b_order_engine::catalog_objects::PriceList;
use log::*;
use reqwest::{Client, Url};

use crate::errors::ServerError;

pub const PRICE_LIST_EXTENSION: &str = ".yaml";
/// Price lists larger than this are refused.
pub const DEFAULT_MAX_PRICE_LIST_BYTES: usize = 16 * 1024 * 1024;

/// Checks that `file_url` is an absolute http(s) URL pointing at a YAML document.
pub fn check_price_list_url(file_url: &str) -> Result<Url, ServerError> {
    let url = Url::parse(file_url.trim())
        .map_err(|e| ServerError::ValidationError(format!("file_url: '{file_url}' is not a valid URL. {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ServerError::ValidationError(format!("file_url: Unsupported scheme '{}'.", url.scheme())));
    }
    if !url.path().to_lowercase().ends_with(PRICE_LIST_EXTENSION) {
        return Err(ServerError::ValidationError(format!(
            "file_url: The price list must be a {PRICE_LIST_EXTENSION} file."
        )));
    }
    Ok(url)
}

#[derive(Clone)]
pub struct PriceListFetcher {
    client: Client,
    max_bytes: usize,
}

impl PriceListFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not create the HTTP client. {e}")))?;
        Ok(Self { client, max_bytes: DEFAULT_MAX_PRICE_LIST_BYTES })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Downloads and parses the price list at `file_url`.
    pub async fn fetch(&self, file_url: &str) -> Result<PriceList, ServerError> {
        let url = check_price_list_url(file_url)?;
        debug!("📦️ Fetching price list from {url}");
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServerError::PriceListError(format!("Could not download {url}. {e}")))?;
        let too_large = || {
            ServerError::PriceListError(format!("{url} is larger than the limit of {} bytes.", self.max_bytes))
        };
        if response.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(too_large());
        }
        let mut body = Vec::new();
        while let Some(chunk) =
            response.chunk().await.map_err(|e| ServerError::PriceListError(format!("Could not read {url}. {e}")))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        trace!("📦️ Downloaded {} bytes from {url}", body.len());
        let body = String::from_utf8(body)
            .map_err(|e| ServerError::PriceListError(format!("{url} is not a UTF-8 document. {e}")))?;
        PriceList::from_yaml(&body).map_err(|e| ServerError::PriceListError(e.to_string()))
    }
}

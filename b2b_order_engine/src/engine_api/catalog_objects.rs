use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::{db_types::Money, helpers::FieldCheck, traits::CatalogError};

/// The largest price a price list may carry: one billion roubles.
pub const MAX_PRICE: Money = Money::from_minor(100_000_000_000);
/// The largest stock a price list may declare for one good.
pub const MAX_QUANTITY: i64 = 1_000_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PriceListError {
    #[error("Could not parse the price list. {0}")]
    ParseError(String),
    #[error("{0}")]
    ValidationError(String),
}

impl From<PriceListError> for CatalogError {
    fn from(e: PriceListError) -> Self {
        CatalogError::InvalidPriceList(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceListGood {
    /// The supplier's own identifier for the good
    pub id: i64,
    pub category: i64,
    pub model: String,
    pub name: String,
    pub price: Money,
    pub price_rrc: Money,
    pub quantity: i64,
    /// Parameter names and rendered values, in document order
    pub parameters: Vec<(String, String)>,
}

/// A supplier's price list, as published in YAML.
///
/// ```yaml
/// shop: Gadget World
/// categories:
///   - id: 224
///     name: Smartphones
/// goods:
///   - id: 4216292
///     category: 224
///     model: iPhone XR
///     name: Apple iPhone XR 256GB (red)
///     price: 65000
///     price_rrc: 69990
///     quantity: 14
///     parameters:
///       "Screen (inch)": 6.1
///       Colour: red
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceList {
    pub shop: String,
    pub categories: Vec<PriceListCategory>,
    pub goods: Vec<PriceListGood>,
}

#[derive(Deserialize)]
struct RawGood {
    id: i64,
    category: i64,
    #[serde(default)]
    model: String,
    name: String,
    price: Money,
    price_rrc: Money,
    quantity: i64,
    #[serde(default)]
    parameters: Mapping,
}

#[derive(Deserialize)]
struct RawPriceList {
    shop: String,
    #[serde(default)]
    categories: Vec<PriceListCategory>,
    #[serde(default)]
    goods: Vec<RawGood>,
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other).map(|s| s.trim().to_string()).unwrap_or_default(),
    }
}

impl PriceList {
    pub fn from_yaml(yaml: &str) -> Result<Self, PriceListError> {
        let raw: RawPriceList = serde_yaml::from_str(yaml).map_err(|e| PriceListError::ParseError(e.to_string()))?;
        let goods = raw
            .goods
            .into_iter()
            .map(|g| PriceListGood {
                id: g.id,
                category: g.category,
                model: g.model,
                name: g.name,
                price: g.price,
                price_rrc: g.price_rrc,
                quantity: g.quantity,
                parameters: g.parameters.iter().map(|(k, v)| (render_value(k), render_value(v))).collect(),
            })
            .collect();
        let list = Self { shop: raw.shop, categories: raw.categories, goods };
        list.validate()?;
        Ok(list)
    }

    /// Checks field lengths, that prices and stock lie between zero and [`MAX_PRICE`] / [`MAX_QUANTITY`], and that
    /// every good refers to a declared category.
    pub fn validate(&self) -> Result<(), PriceListError> {
        let mut check = FieldCheck::new();
        check.required("shop", &self.shop);
        for category in &self.categories {
            check.max_length("categories.name", &category.name, 60);
        }
        for good in &self.goods {
            check.required("goods.name", &good.name).max_length("goods.name", &good.name, 150).max_length(
                "goods.model",
                &good.model,
                100,
            );
            if !self.categories.iter().any(|c| c.id == good.category) {
                check.push(format!("goods: Good #{} refers to the undeclared category #{}.", good.id, good.category));
            }
            if good.price.value() < 0 || good.price_rrc.value() < 0 {
                check.push(format!("goods: Good #{} has a negative price.", good.id));
            }
            if good.price > MAX_PRICE || good.price_rrc > MAX_PRICE {
                check.push(format!("goods: Good #{} has a price above {MAX_PRICE}.", good.id));
            }
            if good.quantity < 0 {
                check.push(format!("goods: Good #{} has a negative quantity.", good.id));
            }
            if good.quantity > MAX_QUANTITY {
                check.push(format!("goods: Good #{} has a quantity above {MAX_QUANTITY}.", good.id));
            }
            for (name, value) in &good.parameters {
                check.max_length("parameters.name", name, 50).max_length("parameters.value", value, 120);
            }
        }
        check.finish().map_err(PriceListError::ValidationError)
    }
}

//! Value types shared by the order engine and the order server.
mod helpers;
mod money;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Money, MoneyConversionError, CURRENCY_CODE};
pub use secret::Secret;

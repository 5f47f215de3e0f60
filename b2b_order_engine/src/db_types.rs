use std::{fmt::Display, str::FromStr};

pub use b2b_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion from string: {0}")]
pub struct ConversionError(String);

//--------------------------------------      UserType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Buyer,
    Supplier,
}

impl Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Buyer => write!(f, "buyer"),
            UserType::Supplier => write!(f, "supplier"),
        }
    }
}

impl FromStr for UserType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "supplier" => Ok(Self::Supplier),
            s => Err(ConversionError(format!("Invalid user type: {s}"))),
        }
    }
}

//--------------------------------------        Role         ---------------------------------------------------------
/// Access roles carried by an authenticated request. `Admin` satisfies every role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Supplier,
    Admin,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Supplier => write!(f, "supplier"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl From<UserType> for Role {
    fn from(value: UserType) -> Self {
        match value {
            UserType::Buyer => Role::Buyer,
            UserType::Supplier => Role::Supplier,
        }
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub position: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(skip_serializing)]
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub is_superuser: bool,
    #[serde(skip_serializing)]
    pub auth_epoch: i64,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The roles this user holds right now. Superusers additionally hold [`Role::Admin`].
    pub fn roles(&self) -> Roles {
        let mut roles = vec![Role::from(self.user_type)];
        if self.is_superuser {
            roles.push(Role::Admin);
        }
        roles
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub position: String,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// A partial update to a user's profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub user_type: Option<UserType>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() &&
            self.password_hash.is_none() &&
            self.first_name.is_none() &&
            self.last_name.is_none() &&
            self.company.is_none() &&
            self.position.is_none() &&
            self.user_type.is_none()
    }
}

//--------------------------------------   Auth tokens       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ConfirmEmailToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Supplier       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub person: String,
    pub phone: String,
    pub file_url: Option<String>,
    pub is_available: bool,
    #[serde(rename = "user")]
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub person: String,
    pub phone: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub person: Option<String>,
    pub phone: Option<String>,
    pub file_url: Option<String>,
    pub is_available: Option<bool>,
}

//--------------------------------------        Buyer        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    pub person: String,
    pub phone: String,
    pub region: String,
    pub district: String,
    pub locality_name: String,
    pub street: String,
    pub house: String,
    pub structure: String,
    pub building: String,
    pub apartment: String,
    #[serde(rename = "user")]
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBuyer {
    pub name: String,
    pub person: String,
    pub phone: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub district: String,
    pub locality_name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub house: String,
    #[serde(default)]
    pub structure: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub apartment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyerUpdate {
    pub name: Option<String>,
    pub person: Option<String>,
    pub phone: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub locality_name: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub structure: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
}

//--------------------------------------       Catalog       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

/// One supplier's offer for a product: its price, recommended retail price and current stock.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProductSupplier {
    pub id: i64,
    pub product_id: i64,
    pub supplier_id: i64,
    pub external_id: i64,
    pub model: String,
    pub price: Money,
    pub price_rrc: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Parameter {
    pub id: i64,
    pub name: String,
}

//--------------------------------------     OrderState      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    /// The buyer's in-progress cart. At most one per buyer.
    Basket,
    /// Placed by the buyer, awaiting confirmation.
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderState {
    /// Whether the order lifecycle permits moving from `self` to `next`.
    ///
    /// The happy path is `basket → new → confirmed → assembled → sent → delivered`. Any placed order that has not
    /// been delivered can be canceled. `delivered` and `canceled` are terminal.
    pub fn can_transition_to(&self, next: OrderState) -> bool {
        use OrderState::*;
        matches!(
            (self, next),
            (Basket, New) |
                (New, Confirmed) |
                (Confirmed, Assembled) |
                (Assembled, Sent) |
                (Sent, Delivered) |
                (New | Confirmed | Assembled | Sent, Canceled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Canceled)
    }
}

impl Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderState::Basket => "basket",
            OrderState::New => "new",
            OrderState::Confirmed => "confirmed",
            OrderState::Assembled => "assembled",
            OrderState::Sent => "sent",
            OrderState::Delivered => "delivered",
            OrderState::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basket" => Ok(Self::Basket),
            "new" => Ok(Self::New),
            "confirmed" => Ok(Self::Confirmed),
            "assembled" => Ok(Self::Assembled),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "canceled" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid order state: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_supplier_id: i64,
    pub quantity: i64,
}

use serde::{Deserialize, Serialize};

use crate::{db_types::OrderState, order_objects::OrderSummary};

/// Raised when a user registers or changes their email address. Carries the confirmation key to be mailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegisteredEvent {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequestedEvent {
    pub email: String,
    pub token: String,
}

/// Raised once per placement request, covering every order that was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersPlacedEvent {
    pub user_email: String,
    pub admin_emails: Vec<String>,
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStateChangedEvent {
    pub order_id: i64,
    pub buyer_id: i64,
    pub old_state: OrderState,
    pub new_state: OrderState,
}

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewUser, PasswordResetToken, User, UserUpdate},
    traits::UserProfile,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("A user with the email {0} already exists.")]
    EmailAlreadyRegistered(String),
    #[error("User not found.")]
    UserNotFound,
    #[error("The account is not active.")]
    AccountInactive,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("The token is invalid or has expired.")]
    InvalidToken,
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref de) if de.is_unique_violation() => {
                AccountApiError::ValidationError(format!("A record with these details already exists. {de}"))
            },
            _ => AccountApiError::DatabaseError(e.to_string()),
        }
    }
}

/// The `AccountManagement` trait defines behaviour for storing users, their credentials and the one-off keys used for
/// email confirmation and password resets.
///
/// Every change to a user's email, password or active flag increments the user's `auth_epoch`. Access tokens record
/// the epoch they were issued in, so these changes implicitly revoke all outstanding tokens.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;

    /// Creates a user. If `confirmation_token` is provided, it is stored as the user's email confirmation key in the
    /// same transaction.
    async fn create_user(&self, user: NewUser, confirmation_token: Option<String>) -> Result<User, AccountApiError>;

    async fn fetch_confirmation_token(&self, user_id: i64) -> Result<Option<String>, AccountApiError>;

    /// Marks the user as active and deletes their email confirmation key.
    async fn activate_user(&self, user_id: i64) -> Result<User, AccountApiError>;

    /// Applies a partial update to the user.
    ///
    /// When `confirmation_token` is provided the user's email has changed: the account is deactivated until the new
    /// address is confirmed with the new key.
    async fn update_user(
        &self,
        user_id: i64,
        update: UserUpdate,
        confirmation_token: Option<String>,
    ) -> Result<User, AccountApiError>;

    async fn deactivate_user(&self, user_id: i64) -> Result<User, AccountApiError>;

    async fn store_password_reset_token(&self, user_id: i64, token: &str) -> Result<(), AccountApiError>;

    async fn fetch_password_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AccountApiError>;

    /// Sets a new password hash and removes all of the user's outstanding password reset keys.
    async fn reset_password(&self, user_id: i64, password_hash: &str) -> Result<User, AccountApiError>;

    /// Removes password reset keys created before `cutoff`. Returns the number removed.
    async fn purge_password_reset_tokens(&self, cutoff: DateTime<Utc>) -> Result<u64, AccountApiError>;

    /// Email addresses of active superusers, for administrative notifications.
    async fn fetch_admin_emails(&self) -> Result<Vec<String>, AccountApiError>;

    async fn fetch_profile(&self, user_id: i64) -> Result<Option<UserProfile>, AccountApiError>;
}

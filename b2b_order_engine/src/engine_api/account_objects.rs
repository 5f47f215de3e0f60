use b2b_common::Secret;
use serde::Deserialize;

use crate::{
    db_types::{UserType, UserUpdate},
    helpers::FieldCheck,
};

/// Fields are optional so that missing values can be reported together with the other validation problems.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUserRequest {
    pub email: Option<String>,
    pub password: Option<Secret<String>>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default, rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmEmailRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<Secret<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: Option<String>,
    pub password: Option<Secret<String>>,
}

/// A partial profile update. `is_active` is accepted but ignored: activation only happens through email
/// confirmation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub email: Option<String>,
    pub password: Option<Secret<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub(crate) fn check_profile_fields(
    check: &mut FieldCheck,
    first_name: Option<&String>,
    last_name: Option<&String>,
    company: Option<&String>,
    position: Option<&String>,
) {
    check
        .max_length_opt("first_name", first_name, 150)
        .max_length_opt("last_name", last_name, 150)
        .max_length_opt("company", company, 45)
        .max_length_opt("position", position, 45);
}

impl ProfileUpdateRequest {
    /// Converts the request into a [`UserUpdate`] without the email and password, which need extra processing.
    pub(crate) fn basic_update(&self) -> UserUpdate {
        UserUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            company: self.company.clone(),
            position: self.position.clone(),
            user_type: self.user_type,
            ..Default::default()
        }
    }
}

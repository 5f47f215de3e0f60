mod passwords;
mod tokens;
mod validation;

pub use passwords::{hash_password, validate_password, verify_password, PasswordError};
pub use tokens::random_token;
pub use validation::{check_length, is_valid_email, FieldCheck};

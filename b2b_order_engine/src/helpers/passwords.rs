//! Password hashing (argon2, PHC string format) and password strength rules.
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{thread_rng, RngCore};
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: [&str; 24] = [
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "11111111",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "welcome1",
    "letmein1",
    "admin123",
    "abc12345",
    "passw0rd",
    "trustno1",
    "superman",
    "1q2w3e4r",
    "zaq12wsx",
    "qwerty12",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("This password is too short. It must contain at least {0} characters.")]
    TooShort(usize),
    #[error("This password is entirely numeric.")]
    EntirelyNumeric,
    #[error("This password is too common.")]
    TooCommon,
    #[error("The password is too similar to the email.")]
    TooSimilar,
    #[error("Could not hash password. {0}")]
    HashError(String),
}

/// Checks a candidate password against the strength rules. `email` is used for the similarity check.
///
/// All violated rules are reported, not just the first.
pub fn validate_password(password: &str, email: Option<&str>) -> Result<(), Vec<PasswordError>> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(PasswordError::EntirelyNumeric);
    }
    let lower = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        problems.push(PasswordError::TooCommon);
    }
    if let Some(local) = email.and_then(|e| e.split('@').next()).map(str::to_lowercase) {
        if local.len() >= 3 && (lower.contains(&local) || local.contains(&lower)) {
            problems.push(PasswordError::TooSimilar);
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; 16];
    thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Returns true if `password` matches the stored PHC `hash`. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

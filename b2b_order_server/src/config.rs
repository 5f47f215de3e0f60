use std::{env, io::Write, str::FromStr, time::Duration as StdDuration};

use b2b_common::{parse_boolean_flag, Secret};
use b2b_order_engine::{MAX_RESET_TOKEN_TTL_HOURS, MIN_RESET_TOKEN_TTL_HOURS};
use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_B2B_HOST: &str = "127.0.0.1";
const DEFAULT_B2B_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/b2b_orders.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_JWT_EXPIRY: Duration = Duration::hours(24);
const DEFAULT_PAGE_SIZE: u32 = 50;
const DEFAULT_PASSWORD_RESET_TTL: Duration = Duration::hours(24);
const DEFAULT_PRICE_LIST_TIMEOUT: StdDuration = StdDuration::from_secs(30);
const DEFAULT_SERVER_EMAIL: &str = "noreply@b2b-orders.local";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;
const MIN_JWT_SECRET_LENGTH: usize = 32;
const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Apply pending database migrations at start-up.
    pub run_migrations: bool,
    pub auth: AuthConfig,
    pub page_size: u32,
    /// How long a password reset key stays valid.
    pub password_reset_ttl: Duration,
    /// Maximum time allowed for downloading a supplier price list.
    pub price_list_timeout: StdDuration,
    /// The sender address of outgoing notifications.
    pub server_email: String,
    pub event_buffer_size: usize,
    /// When set, an active superuser with these credentials is created at start-up if the email is not registered.
    pub admin: Option<AdminCredentials>,
}

#[derive(Clone, Debug)]
pub struct AdminCredentials {
    pub email: String,
    pub password: Secret<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_B2B_HOST.to_string(),
            port: DEFAULT_B2B_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            auth: AuthConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            password_reset_ttl: DEFAULT_PASSWORD_RESET_TTL,
            price_list_timeout: DEFAULT_PRICE_LIST_TIMEOUT,
            server_email: DEFAULT_SERVER_EMAIL.to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            admin: None,
        }
    }
}

/// Reads `var` and parses it, falling back to `default` (with a warning) if the value is invalid.
fn env_or_default<T>(var: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {var} is not set. Using the default value of {default}.");
            default
        },
    }
}

/// Reads a number of hours from `var`, falling back to `default` (with a warning) if it lies outside `min..=max`.
fn env_hours_or_default(var: &str, default: Duration, min: i64, max: i64) -> Duration {
    let hours = env_or_default(var, default.num_hours());
    if (min..=max).contains(&hours) {
        Duration::hours(hours)
    } else {
        warn!("🪛️ {var} must be between {min} and {max} hours. Using the default, {}, instead.", default.num_hours());
        default
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("B2B_HOST").ok().unwrap_or_else(|| DEFAULT_B2B_HOST.into());
        let port = env_or_default("B2B_PORT", DEFAULT_B2B_PORT);
        let database_url = env::var("B2B_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ B2B_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env_or_default("B2B_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("B2B_RUN_MIGRATIONS").ok(), true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let page_size = env_or_default("B2B_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1);
        let password_reset_ttl = env_hours_or_default(
            "B2B_PASSWORD_RESET_TTL_HOURS",
            DEFAULT_PASSWORD_RESET_TTL,
            MIN_RESET_TOKEN_TTL_HOURS,
            MAX_RESET_TOKEN_TTL_HOURS,
        );
        let price_list_timeout =
            StdDuration::from_secs(env_or_default("B2B_PRICE_LIST_TIMEOUT_SECS", DEFAULT_PRICE_LIST_TIMEOUT.as_secs()));
        let server_email = env::var("B2B_SERVER_EMAIL").ok().unwrap_or_else(|| DEFAULT_SERVER_EMAIL.into());
        let event_buffer_size = env_or_default("B2B_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let admin = AdminCredentials::from_env();
        Self {
            host,
            port,
            database_url,
            max_connections,
            run_migrations,
            auth,
            page_size,
            password_reset_ttl,
            price_list_timeout,
            server_email,
            event_buffer_size,
            admin,
        }
    }
}

impl AdminCredentials {
    pub fn from_env() -> Option<Self> {
        match (env::var("B2B_ADMIN_EMAIL").ok(), env::var("B2B_ADMIN_PASSWORD").ok()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(Self { email, password: Secret::new(password) })
            },
            (Some(_), None) | (None, Some(_)) => {
                warn!("🪛️ Both B2B_ADMIN_EMAIL and B2B_ADMIN_PASSWORD must be set to create an administrator.");
                None
            },
            _ => None,
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared secret used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
    /// How long an issued access token is valid for.
    pub jwt_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since all issued tokens become invalid when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the B2B_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret), jwt_expiry: jwt_expiry_from_env() }
    }
}

fn jwt_expiry_from_env() -> Duration {
    env_hours_or_default("B2B_JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY, 1, MAX_JWT_EXPIRY_HOURS)
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, jwt_expiry: Duration) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), jwt_expiry }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("B2B_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [B2B_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "B2B_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long."
            )));
        }
        Ok(Self { jwt_secret: Secret::new(secret), jwt_expiry: jwt_expiry_from_env() })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. Secrets are excluded so that it can be passed around
/// freely.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub page_size: u32,
    pub price_list_timeout: StdDuration,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { page_size: config.page_size, price_list_timeout: config.price_list_timeout }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, price_list_timeout: DEFAULT_PRICE_LIST_TIMEOUT }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_secrets_are_rejected() {
        env::set_var("B2B_JWT_SECRET", "too-short");
        let err = AuthConfig::try_from_env().unwrap_err();
        assert!(err.to_string().contains("at least 32 characters"));
        env::set_var("B2B_JWT_SECRET", "a-sufficiently-long-secret-for-hs256-signing");
        let config = AuthConfig::try_from_env().unwrap();
        assert_eq!(config.jwt_secret.reveal(), "a-sufficiently-long-secret-for-hs256-signing");
        env::remove_var("B2B_JWT_SECRET");
    }

    #[test]
    fn random_secret_is_generated() {
        let a = AuthConfig::default();
        let b = AuthConfig::default();
        assert_eq!(a.jwt_secret.reveal().len(), 64);
        assert_ne!(a.jwt_secret.reveal(), b.jwt_secret.reveal());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        env::set_var("B2B_TEST_PORT_VALUE", "not-a-port");
        assert_eq!(env_or_default("B2B_TEST_PORT_VALUE", 8370u16), 8370);
        env::set_var("B2B_TEST_PORT_VALUE", " 9000 ");
        assert_eq!(env_or_default("B2B_TEST_PORT_VALUE", 8370u16), 9000);
        env::remove_var("B2B_TEST_PORT_VALUE");
    }

    #[test]
    fn hours_outside_their_range_fall_back_to_defaults() {
        let default = Duration::hours(24);
        env::set_var("B2B_TEST_TTL_HOURS", "9223372036854775807");
        assert_eq!(env_hours_or_default("B2B_TEST_TTL_HOURS", default, 1, 720), default);
        env::set_var("B2B_TEST_TTL_HOURS", "-3");
        assert_eq!(env_hours_or_default("B2B_TEST_TTL_HOURS", default, 1, 720), default);
        env::set_var("B2B_TEST_TTL_HOURS", "720");
        assert_eq!(env_hours_or_default("B2B_TEST_TTL_HOURS", default, 1, 720), Duration::hours(720));
        env::remove_var("B2B_TEST_TTL_HOURS");
        assert_eq!(env_hours_or_default("B2B_TEST_TTL_HOURS", default, 1, 720), default);
    }
}

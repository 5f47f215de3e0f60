use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use b2b_order_engine::{
    db_types::{Role, Roles, User},
    traits::Caller,
};
use chrono::Duration;
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The identity of an authenticated request. The auth middleware resolves these from the access token and the user's
/// current record, and stores them in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub email: String,
    pub roles: Roles,
}

impl JwtClaims {
    pub fn from_user(user: &User) -> Self {
        Self { user_id: user.id, email: user.email.clone(), roles: user.roles() }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn caller(&self) -> Caller {
        if self.is_admin() {
            Caller::admin(self.user_id)
        } else {
            Caller::user(self.user_id)
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or_else(|| {
            warn!("🔑️ No JWT claims found in request extensions");
            ServerError::AuthenticationError(AuthError::MissingToken)
        }))
    }
}

/// The custom claims signed into an access token.
///
/// `epoch` is the user's auth epoch at the time of issue. The token stops working as soon as the epoch changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub user_id: i64,
    pub email: String,
    pub epoch: i64,
}

/// Signs and verifies HS256 access tokens.
pub struct TokenIssuer {
    key: Hs256Key,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: Hs256Key::new(config.jwt_secret.reveal().as_bytes()), expiry: config.jwt_expiry }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT check the user's credentials. This must be done prior to calling `issue_token`.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.issue_token_with_expiry(user, self.expiry)
    }

    pub fn issue_token_with_expiry(&self, user: &User, expiry: Duration) -> Result<String, AuthError> {
        let claims = AccessToken { user_id: user.id, email: user.email.clone(), epoch: user.auth_epoch };
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), expiry);
        let header = Header::empty().with_token_type("JWT");
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }

    /// Checks the signature and expiry of an access token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<AccessToken, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
        let token = Hs256
            .validator::<AccessToken>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        let (_, claims) = token.into_parts();
        trace!("🔑️ Access token validated for user #{}", claims.custom.user_id);
        Ok(claims.custom)
    }
}

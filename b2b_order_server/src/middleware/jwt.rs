//! Bearer token authentication middleware.
//!
//! Wrap the authenticated scope with [`JwtMiddlewareFactory`]. For every request it
//! 1. reads the `Authorization: Bearer <token>` header,
//! 2. checks the token's signature and expiry with the [`TokenIssuer`] registered as app data,
//! 3. reloads the user through [`AccountApi::authenticate`], so that deactivated accounts and revoked tokens are
//!    rejected immediately, and role changes take effect on the next request,
//! 4. stores the resulting [`JwtClaims`] in the request extensions.
//!
//! Requests that fail any of these steps never reach the wrapped service.
use std::{marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web,
    Error,
    HttpMessage,
};
use b2b_order_engine::{AccountApi, AccountApiError, AccountManagement};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> JwtMiddlewareFactory<B> {
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<B> Default for JwtMiddlewareFactory<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, Body, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory<B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: AccountManagement + 'static,
{
    type Response = ServiceResponse<Body>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S, B>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { service: Rc::new(service), _backend: PhantomData })
    }
}

pub struct JwtMiddlewareService<S, B> {
    service: Rc<S>,
    _backend: PhantomData<fn() -> B>,
}

impl<S, Body, B> Service<ServiceRequest> for JwtMiddlewareService<S, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: AccountManagement + 'static,
{
    type Response = ServiceResponse<Body>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let claims = resolve_claims::<B>(&req).await?;
            trace!("🔑️ Request authenticated for user #{}", claims.user_id);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(format!("The Authorization header is not valid text. {e}")))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        },
        _ => Err(AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'.".to_string())),
    }
}

async fn resolve_claims<B: AccountManagement + 'static>(req: &ServiceRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .cloned()
        .ok_or_else(|| ServerError::InitializeError("No token issuer has been configured.".to_string()))?;
    let api = req
        .app_data::<web::Data<AccountApi<B>>>()
        .cloned()
        .ok_or_else(|| ServerError::InitializeError("No account API has been configured.".to_string()))?;
    let token = bearer_token(req.headers())?;
    let access = issuer.validate_token(&token)?;
    let user = api.authenticate(access.user_id, access.epoch).await.map_err(|e| match e {
        AccountApiError::UserNotFound => ServerError::AuthenticationError(AuthError::AccountNotFound),
        AccountApiError::AccountInactive => ServerError::AuthenticationError(AuthError::AccountInactive),
        AccountApiError::InvalidToken => {
            debug!("🔑️ Rejected a revoked token for user #{}", access.user_id);
            ServerError::AuthenticationError(AuthError::ValidationError("The token has been revoked.".to_string()))
        },
        e => ServerError::from(e),
    })?;
    Ok(JwtClaims::from_user(&user))
}

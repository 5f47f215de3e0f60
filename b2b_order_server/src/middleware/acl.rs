//! Access control list middleware.
//! This middleware can be placed on any route or service inside the authenticated scope.
//!
//! It reads the claims that the JWT middleware stored in the request extensions and checks them against the roles
//! required by the route. Administrators pass every check. Otherwise the user must hold all of the required roles, or
//! a 403 Forbidden response is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    Error,
    HttpMessage,
};
use b2b_order_engine::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::{auth::JwtClaims, errors::ServerError};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

/// True if the holder of `roles` may use a route requiring `required`.
pub fn is_permitted(roles: &[Role], required: &[Role]) -> bool {
    roles.contains(&Role::Admin) || required.iter().all(|role| roles.contains(role))
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let jwt_claims = req
                .extensions()
                .get::<JwtClaims>()
                .ok_or_else(|| {
                    log::warn!("🔑️ No JWT claims found in request extensions");
                    ErrorInternalServerError("No JWT claims found in request extensions")
                })?
                .clone();
            if is_permitted(&jwt_claims.roles, &required_roles) {
                service.call(req).await
            } else {
                log::debug!("🔑️ User #{} lacks the roles {required_roles:?}", jwt_claims.user_id);
                let roles = required_roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
                Err(ServerError::InsufficientPermissions(format!("This action requires the roles: {roles}.")).into())
            }
        })
    }
}

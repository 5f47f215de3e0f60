use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use b2b_order_engine::{
    db_types::{User, UserType},
    events::EventProducers,
    AccountApi,
};
use chrono::{Duration, Utc};
use log::debug;

use super::mocks::MockBackend;
use crate::{auth::TokenIssuer, config::AuthConfig, middleware::JwtMiddlewareFactory, server::configure_extractors};

// Only ever used to sign tokens in these tests
const TEST_JWT_SECRET: &str = "endpoint-test-secret-0123456789abcdefghijklmnop";

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig::new(TEST_JWT_SECRET, Duration::hours(1)))
}

pub fn user(id: i64, user_type: UserType, is_superuser: bool) -> User {
    User {
        id,
        email: format!("user{id}@example.com"),
        password_hash: String::new(),
        first_name: "Ann".into(),
        last_name: "Lee".into(),
        company: "Acme".into(),
        position: "Purchasing".into(),
        user_type,
        is_active: true,
        is_superuser,
        auth_epoch: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn issue_token(user: &User) -> String {
    token_issuer().issue_token(user).expect("Failed to sign token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Sends `req` to an app with the auth middleware in front of the routes that `configure` registers.
pub async fn api_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(token_issuer()))
        .configure(configure_extractors)
        .wrap(JwtMiddlewareFactory::<MockBackend>::new())
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = actix_web::body::to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

/// Sends `req` to an app without the auth middleware.
pub async fn public_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(web::Data::new(token_issuer()))
        .configure(configure_extractors)
        .configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// An account API whose backend resolves every access token to `stored`.
pub fn accounts_for(stored: User) -> AccountApi<MockBackend> {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_id().returning(move |_| Ok(Some(stored.clone())));
    backend.expect_fetch_admin_emails().returning(|| Ok(vec![]));
    AccountApi::new(backend, EventProducers::default())
}

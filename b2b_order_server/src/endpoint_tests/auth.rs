use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use b2b_order_engine::{db_types::{User, UserType}, events::EventProducers, traits::UserProfile, AccountApi};
use chrono::Duration;

use super::{
    helpers::{api_request, bearer, issue_token, user},
    mocks::MockBackend,
};
use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    routes::MyProfileRoute,
};

/// `adjust` tweaks the stored user before the auth middleware sees it.
fn configure(adjust: fn(&mut User)) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_user_by_id().returning(move |id| {
            let mut u = user(id, UserType::Buyer, false);
            adjust(&mut u);
            Ok(Some(u))
        });
        backend.expect_fetch_profile().returning(|id| {
            Ok(Some(UserProfile { user: user(id, UserType::Buyer, false), buyers: Some(vec![]), suppliers: None }))
        });
        let api = AccountApi::new(backend, EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(MyProfileRoute::<MockBackend>::new());
    }
}

fn unchanged(_: &mut User) {}

#[actix_web::test]
async fn profile_without_a_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/user/profile");
    let (status, body) = api_request(req, configure(unchanged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn profile_with_a_malformed_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/user/profile").insert_header(bearer("made up nonsense"));
    let (status, body) = api_request(req, configure(unchanged)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Access token is not in the correct format."), "was: {body}");
}

#[actix_web::test]
async fn profile_with_a_token_from_another_server() {
    let _ = env_logger::try_init().ok();
    let other = TokenIssuer::new(&AuthConfig::new("some-other-server-secret-0123456789abcdef", Duration::hours(1)));
    let token = other.issue_token(&user(1, UserType::Buyer, false)).unwrap();
    let req = TestRequest::get().uri("/user/profile").insert_header(bearer(&token));
    let (status, body) = api_request(req, configure(unchanged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid."), "was: {body}");
}

#[actix_web::test]
async fn profile_with_a_revoked_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(1, UserType::Buyer, false));
    let req = TestRequest::get().uri("/user/profile").insert_header(bearer(&token));
    let (status, body) = api_request(req, configure(|u| u.auth_epoch = 2)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The token has been revoked."), "was: {body}");
}

#[actix_web::test]
async fn profile_of_a_deactivated_user() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(1, UserType::Buyer, false));
    let req = TestRequest::get().uri("/user/profile").insert_header(bearer(&token));
    let (status, body) = api_request(req, configure(|u| u.is_active = false)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. The account is not active."}"#);
}

#[actix_web::test]
async fn fetch_my_profile() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&user(1, UserType::Buyer, false));
    let req = TestRequest::get().uri("/user/profile").insert_header(bearer(&token));
    let (status, body) = api_request(req, configure(unchanged)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let profile: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(profile["email"], "user1@example.com");
    assert_eq!(profile["type"], "buyer");
    assert_eq!(profile["buyers"], serde_json::json!([]));
    assert!(profile.get("password_hash").is_none());
}

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use b2b_order_engine::{db_types::UserType, events::EventProducers, helpers::hash_password, AccountApi};
use serde_json::json;

use super::{
    helpers::{public_request, token_issuer, user},
    mocks::MockBackend,
};
use crate::{
    data_objects::LoginResponse,
    routes::{LoginRoute, RegisterRoute},
};

const PASSWORD: &str = "Correct-Horse-42";

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = AccountApi::new(backend, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .service(RegisterRoute::<MockBackend>::new())
            .service(LoginRoute::<MockBackend>::new());
    }
}

#[actix_web::test]
async fn register_new_user() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_fetch_user_by_email().returning(|_| Ok(None));
    backend.expect_create_user().withf(|u, token| !u.is_active && token.is_some()).returning(|u, _| {
        let mut created = user(5, u.user_type, false);
        created.email = u.email;
        created.is_active = false;
        Ok(created)
    });
    let body = json!({"email": " New@Example.com ", "password": PASSWORD, "type": "supplier"});
    let req = TestRequest::post().uri("/user/register").set_json(body);
    let (status, body) = public_request(req, configure(backend)).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    assert!(body.contains("User new@example.com has been registered."), "was: {body}");
}

#[actix_web::test]
async fn register_with_a_weak_password() {
    let _ = env_logger::try_init().ok();
    let backend = MockBackend::new();
    let body = json!({"email": "new@example.com", "password": "12345678"});
    let req = TestRequest::post().uri("/user/register").set_json(body);
    let (status, body) = public_request(req, configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("password: This password is entirely numeric."), "was: {body}");
}

#[actix_web::test]
async fn register_without_a_body() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/user/register").insert_header(("content-type", "application/json"));
    let (status, body) = public_request(req, configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#), "was: {body}");
}

#[actix_web::test]
async fn login_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    let hash = hash_password(PASSWORD).unwrap();
    backend.expect_fetch_user_by_email().returning(move |email| {
        let mut u = user(9, UserType::Buyer, false);
        u.email = email.to_string();
        u.password_hash = hash.clone();
        Ok(Some(u))
    });
    let req = TestRequest::post().uri("/user/login").set_json(json!({"email": "user9@example.com", "password": PASSWORD}));
    let (status, body) = public_request(req, configure(backend)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response: LoginResponse = serde_json::from_str(&body).unwrap();
    let token = token_issuer().validate_token(&response.token).unwrap();
    assert_eq!(token.user_id, 9);
    assert_eq!(token.epoch, 1);
}

#[actix_web::test]
async fn login_with_the_wrong_password() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    let hash = hash_password(PASSWORD).unwrap();
    backend.expect_fetch_user_by_email().returning(move |_| {
        let mut u = user(9, UserType::Buyer, false);
        u.password_hash = hash.clone();
        Ok(Some(u))
    });
    let req = TestRequest::post().uri("/user/login").set_json(json!({"email": "user9@example.com", "password": "nope"}));
    let (status, body) = public_request(req, configure(backend)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Invalid email or password."}"#);
}

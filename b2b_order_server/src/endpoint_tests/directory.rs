use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use b2b_order_engine::{
    db_types::{Buyer, User, UserType},
    traits::Page,
    DirectoryApi,
};

use super::{
    helpers::{accounts_for, api_request, bearer, issue_token, user},
    mocks::MockBackend,
};
use crate::{
    config::ServerOptions,
    routes::{BuyerRoute, BuyersRoute, UpdateBuyerRoute},
};

fn buyer(id: i64, user_id: i64) -> Buyer {
    Buyer {
        id,
        name: "Corner Shop".into(),
        person: "Ann Lee".into(),
        phone: "+1 555 0100".into(),
        region: "North".into(),
        district: "Central".into(),
        locality_name: "Springfield".into(),
        street: "Main St".into(),
        house: "12".into(),
        structure: String::new(),
        building: String::new(),
        apartment: String::new(),
        user_id,
    }
}

fn configure(caller: User) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_buyer().returning(|id, _| Ok(Some(buyer(id, 2))));
        backend.expect_fetch_buyers().returning(|owner, page| {
            let owner = owner.unwrap_or(2);
            Ok(Page::new(vec![buyer(3, owner)], 1, page))
        });
        cfg.app_data(web::Data::new(accounts_for(caller)))
            .app_data(web::Data::new(DirectoryApi::new(backend)))
            .app_data(web::Data::new(ServerOptions { page_size: 10, ..ServerOptions::default() }))
            .service(BuyersRoute::<MockBackend>::new())
            .service(BuyerRoute::<MockBackend>::new())
            .service(UpdateBuyerRoute::<MockBackend>::new());
    }
}

#[actix_web::test]
async fn fetch_own_buyer() {
    let _ = env_logger::try_init().ok();
    let caller = user(2, UserType::Buyer, false);
    let req = TestRequest::get().uri("/buyer/7").insert_header(bearer(&issue_token(&caller)));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let buyer: Buyer = serde_json::from_str(&body).unwrap();
    assert_eq!((buyer.id, buyer.user_id), (7, 2));
}

#[actix_web::test]
async fn fetch_someone_elses_buyer() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, false);
    let req = TestRequest::get().uri("/buyer/7").insert_header(bearer(&issue_token(&caller)));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions."), "was: {body}");
}

#[actix_web::test]
async fn admins_can_fetch_any_buyer() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Supplier, true);
    let req = TestRequest::get().uri("/buyer/7").insert_header(bearer(&issue_token(&caller)));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
}

#[actix_web::test]
async fn suppliers_cannot_list_buyers() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Supplier, false);
    let req = TestRequest::get().uri("/buyer").insert_header(bearer(&issue_token(&caller)));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("This action requires the roles: buyer."), "was: {body}");
}

#[actix_web::test]
async fn list_buyers_by_page() {
    let _ = env_logger::try_init().ok();
    let caller = user(4, UserType::Buyer, false);
    let req = TestRequest::get().uri("/buyer?page=2").insert_header(bearer(&issue_token(&caller)));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let page: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["results"][0]["user"], 4);
    assert_eq!(page["count"], 1);
    assert_eq!(page["previous"], 1);
    assert!(page["next"].is_null());
}

#[actix_web::test]
async fn update_buyer_with_invalid_fields() {
    let _ = env_logger::try_init().ok();
    let caller = user(2, UserType::Buyer, false);
    let req = TestRequest::put()
        .uri("/buyer/7")
        .insert_header(bearer(&issue_token(&caller)))
        .set_json(serde_json::json!({"phone": "0".repeat(40)}));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("phone"), "was: {body}");
}

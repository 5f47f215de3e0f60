use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use b2b_order_engine::{
    db_types::{Supplier, User, UserType},
    CatalogApi,
};
use serde_json::json;

use super::{
    helpers::{accounts_for, api_request, bearer, issue_token, user},
    mocks::MockBackend,
};
use crate::{price_list_fetcher::PriceListFetcher, routes::ImportPriceListRoute};

// Nothing listens here, so any download attempt fails
const UNREACHABLE_PRICE_LIST: &str = "http://127.0.0.1:1/prices.yaml";

fn supplier(id: i64, user_id: i64) -> Supplier {
    Supplier {
        id,
        name: "Gadget World".into(),
        person: "Sales desk".into(),
        phone: "+7 495 000-00-00".into(),
        file_url: None,
        is_available: true,
        user_id,
    }
}

fn configure(caller: User) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let mut backend = MockBackend::new();
        // Supplier #5 belongs to user #4
        backend
            .expect_fetch_supplier()
            .returning(|id, owner| Ok(owner.map_or(true, |o| o == 4).then(|| supplier(id, 4))));
        backend.expect_import_price_list().never();
        let fetcher = PriceListFetcher::new(Duration::from_secs(2)).expect("Failed to create fetcher");
        cfg.app_data(web::Data::new(accounts_for(caller)))
            .app_data(web::Data::new(CatalogApi::new(backend)))
            .app_data(web::Data::new(fetcher))
            .service(ImportPriceListRoute::<MockBackend>::new());
    }
}

fn import_request(caller: &User) -> TestRequest {
    TestRequest::post()
        .uri("/supplier/price-list")
        .insert_header(bearer(&issue_token(caller)))
        .set_json(json!({ "supplier_id": 5, "file_url": UNREACHABLE_PRICE_LIST }))
}

#[actix_web::test]
async fn foreign_supplier_is_refused_before_downloading() {
    let _ = env_logger::try_init().ok();
    let caller = user(7, UserType::Supplier, false);
    let (status, body) = api_request(import_request(&caller), configure(caller)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "was: {body}");
    assert!(body.contains("Supplier #5 does not exist or does not belong to the current user."), "was: {body}");
}

#[actix_web::test]
async fn owner_import_downloads_the_price_list() {
    let _ = env_logger::try_init().ok();
    let caller = user(4, UserType::Supplier, false);
    let (status, body) = api_request(import_request(&caller), configure(caller)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "was: {body}");
    assert!(body.contains("Could not download"), "was: {body}");
}

#[actix_web::test]
async fn buyers_cannot_import() {
    let _ = env_logger::try_init().ok();
    let caller = user(4, UserType::Buyer, false);
    let (status, body) = api_request(import_request(&caller), configure(caller)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "was: {body}");
}

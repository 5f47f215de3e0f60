use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use b2b_order_engine::{
    db_types::{User, UserType},
    events::EventProducers,
    order_objects::BasketUpdate,
    traits::ListingStock,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{accounts_for, api_request, bearer, issue_token, user},
    mocks::MockBackend,
};
use crate::routes::{RemoveBasketItemsRoute, ReplaceBasketRoute, UpdateBasketRoute};

// User 1 owns buyer 3. Supplier 2 has 5 pcs of product 10 in stock.
fn configure(caller: User) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_buyer_ids_for_user().returning(|_| Ok(vec![3]));
        backend.expect_fetch_listing_stock().returning(|_| {
            Ok(vec![ListingStock { product_supplier_id: 55, product_id: 10, supplier_id: 2, quantity: 5 }])
        });
        backend.expect_apply_basket_changes().returning(|changes| {
            Ok(changes
                .iter()
                .map(|c| BasketUpdate { buyer_id: c.buyer_id, order_id: 40, items: c.lines.len() })
                .collect())
        });
        backend.expect_delete_basket_items().returning(|_, items| Ok(Some((40, items.len() as u64))));
        let api = OrderFlowApi::new(backend, EventProducers::default());
        cfg.app_data(web::Data::new(accounts_for(caller)))
            .app_data(web::Data::new(api))
            .service(UpdateBasketRoute::<MockBackend>::new())
            .service(RemoveBasketItemsRoute::<MockBackend>::new())
            .service(ReplaceBasketRoute::new());
    }
}

fn buyer_user() -> User {
    user(1, UserType::Buyer, false)
}

#[actix_web::test]
async fn add_items_to_basket() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"buyer": 3, "items": [{"product": 10, "supplier": 2, "quantity": 2}]}]);
    let req = TestRequest::post().uri("/buyer/basket").insert_header(bearer(&issue_token(&buyer_user()))).set_json(body);
    let (status, body) = api_request(req, configure(buyer_user())).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    assert_eq!(body, r#"{"success":true,"added":{"40":1}}"#);
}

#[actix_web::test]
async fn add_more_than_is_in_stock() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"buyer": 3, "items": [{"product": 10, "supplier": 2, "quantity": 6}]}]);
    let req = TestRequest::post().uri("/buyer/basket").insert_header(bearer(&issue_token(&buyer_user()))).set_json(body);
    let (status, body) = api_request(req, configure(buyer_user())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Only 5 of product #10 are available from supplier #2."), "was: {body}");
}

#[actix_web::test]
async fn add_items_to_someone_elses_basket() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"buyer": 8, "items": [{"product": 10, "supplier": 2, "quantity": 1}]}]);
    let req = TestRequest::post().uri("/buyer/basket").insert_header(bearer(&issue_token(&buyer_user()))).set_json(body);
    let (status, _) = api_request(req, configure(buyer_user())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn replacing_the_basket_is_not_allowed() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::put().uri("/buyer/basket").insert_header(bearer(&issue_token(&buyer_user()))).set_json(json!([]));
    let (status, body) = api_request(req, configure(buyer_user())).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, r#"{"error":"Method \"PUT\" not allowed."}"#);
}

#[actix_web::test]
async fn remove_items_partially() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"buyer": 3, "items": [1, 2]}, {"buyer": 9, "items": [4]}]);
    let req = TestRequest::delete().uri("/buyer/basket").insert_header(bearer(&issue_token(&buyer_user()))).set_json(body);
    let (status, body) = api_request(req, configure(buyer_user())).await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT, "was: {body}");
    assert!(body.contains("Deleted 2 (order #40)"), "was: {body}");
}

#[actix_web::test]
async fn remove_items_from_own_basket() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"buyer": 3, "items": [1]}]);
    let req = TestRequest::delete().uri("/buyer/basket").insert_header(bearer(&issue_token(&buyer_user()))).set_json(body);
    let (status, body) = api_request(req, configure(buyer_user())).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
}

#[actix_web::test]
async fn suppliers_have_no_basket() {
    let _ = env_logger::try_init().ok();
    let supplier = user(1, UserType::Supplier, false);
    let body = json!([{"buyer": 3, "items": [1]}]);
    let req = TestRequest::delete().uri("/buyer/basket").insert_header(bearer(&issue_token(&supplier))).set_json(body);
    let (status, _) = api_request(req, configure(supplier)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

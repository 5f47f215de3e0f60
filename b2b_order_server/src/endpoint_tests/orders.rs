use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use b2b_order_engine::{
    db_types::{Order, OrderState, User, UserType},
    events::EventProducers,
    traits::PlacementResult,
    OrderFlowApi,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

use super::{
    helpers::{accounts_for, api_request, bearer, issue_token, user},
    mocks::MockBackend,
};
use crate::{
    data_objects::PlacementResponse,
    routes::{ChangeOrderStateRoute, PlaceOrdersRoute},
};

fn order(id: i64, state: OrderState) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 9, 2, 10, 30, 0).unwrap();
    Order { id, buyer_id: 3, state, created_at: ts, updated_at: ts }
}

// Order 40 is a new order. Only basket 40 of the caller can be placed.
fn configure(caller: User) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let mut backend = MockBackend::new();
        backend.expect_place_orders().returning(|_, ids| {
            let (placed, rejected): (Vec<i64>, Vec<i64>) = ids.iter().copied().partition(|id| *id == 40);
            Ok(PlacementResult { placed, rejected })
        });
        backend.expect_fetch_order().returning(|id| Ok((id == 40).then(|| order(40, OrderState::New))));
        backend.expect_update_order_state().returning(|id, from, to| {
            assert_eq!(from, OrderState::New);
            Ok(Some(order(id, to)))
        });
        let api = OrderFlowApi::new(backend, EventProducers::default());
        cfg.app_data(web::Data::new(accounts_for(caller)))
            .app_data(web::Data::new(api))
            .service(PlaceOrdersRoute::<MockBackend>::new())
            .service(ChangeOrderStateRoute::<MockBackend>::new());
    }
}

#[actix_web::test]
async fn place_all_orders() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, false);
    let req =
        TestRequest::post().uri("/buyer/order").insert_header(bearer(&issue_token(&caller))).set_json(json!({"orders": [40]}));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let response: PlacementResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.placed, vec![40]);
    assert!(response.rejected.is_empty());
}

#[actix_web::test]
async fn place_some_orders() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, false);
    let req = TestRequest::post()
        .uri("/buyer/order")
        .insert_header(bearer(&issue_token(&caller)))
        .set_json(json!({"orders": [40, 41]}));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT, "was: {body}");
    let response: PlacementResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.placed, vec![40]);
    assert_eq!(response.rejected, vec![41]);
}

#[actix_web::test]
async fn place_nothing() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, false);
    let req =
        TestRequest::post().uri("/buyer/order").insert_header(bearer(&issue_token(&caller))).set_json(json!({"orders": [41]}));
    let (status, _) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn buyers_cannot_change_order_state() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, false);
    let req = TestRequest::patch()
        .uri("/order/40/state")
        .insert_header(bearer(&issue_token(&caller)))
        .set_json(json!({"state": "confirmed"}));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("This action requires the roles: admin."), "was: {body}");
}

#[actix_web::test]
async fn admin_confirms_an_order() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, true);
    let req = TestRequest::patch()
        .uri("/order/40/state")
        .insert_header(bearer(&issue_token(&caller)))
        .set_json(json!({"state": "confirmed"}));
    let (status, body) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.state, OrderState::Confirmed);
}

#[actix_web::test]
async fn admin_skips_a_step() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, true);
    let req = TestRequest::patch()
        .uri("/order/40/state")
        .insert_header(bearer(&issue_token(&caller)))
        .set_json(json!({"state": "delivered"}));
    let (status, _) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn change_state_of_a_missing_order() {
    let _ = env_logger::try_init().ok();
    let caller = user(1, UserType::Buyer, true);
    let req = TestRequest::patch()
        .uri("/order/77/state")
        .insert_header(bearer(&issue_token(&caller)))
        .set_json(json!({"state": "confirmed"}));
    let (status, _) = api_request(req, configure(caller)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

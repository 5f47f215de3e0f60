use b2b_order_engine::{
    db_types::{Money, OrderState, SupplierUpdate},
    order_objects::{BasketDeleteRequest, BasketItemRequest, BasketRequest, DeletionResult, DeletionStatus},
    traits::Caller,
    DirectoryManagement,
};
use cucumber::{then, when};

use crate::cucumber::OrderWorld;

async fn put_into_basket(
    world: &OrderWorld,
    email: &str,
    quantity: i64,
    product: &str,
    supplier: &str,
    buyer: &str,
) -> Result<(), String> {
    let system = world.system();
    let product_id = system.product_id(product);
    let request = BasketRequest {
        buyer_id: system.buyer_id(buyer),
        items: vec![BasketItemRequest { product_id, supplier_id: system.supplier_id(supplier), quantity }],
    };
    system.orders.update_basket(system.user_id(email), vec![request]).await.map(|_| ()).map_err(|e| e.to_string())
}

#[when(expr = "{string} puts {int} of {string} from {string} into the basket of {string}")]
async fn add_to_basket(world: &mut OrderWorld, email: String, qty: i64, product: String, supp: String, buyer: String) {
    put_into_basket(world, &email, qty, &product, &supp, &buyer).await.expect("Error updating basket");
}

#[when(expr = "{string} tries to put {int} of {string} from {string} into the basket of {string}")]
async fn try_add_to_basket(world: &mut OrderWorld, email: String, qty: i64, product: String, supp: String, buyer: String) {
    world.last_error = put_into_basket(world, &email, qty, &product, &supp, &buyer).await.err();
}

async fn basket_item_ids(world: &OrderWorld, user_id: i64, buyer_id: i64, product: &str) -> Vec<i64> {
    let baskets = world.system().orders.baskets(user_id).await.expect("Error fetching baskets");
    baskets
        .iter()
        .filter(|b| b.buyer_id == buyer_id)
        .flat_map(|b| b.order_items.iter())
        .filter(|i| i.product_name == product)
        .map(|i| i.id)
        .collect()
}

async fn remove_entries(world: &mut OrderWorld, email: &str, requests: Vec<BasketDeleteRequest>) {
    let system = world.system();
    let report = system
        .orders
        .remove_basket_items(system.user_id(email), requests)
        .await
        .expect("Error removing basket items");
    world.last_deletion = Some(report);
}

#[when(expr = "{string} removes {string} from the basket of {string}")]
async fn remove_from_basket(world: &mut OrderWorld, email: String, product: String, buyer: String) {
    let system = world.system();
    let user_id = system.user_id(&email);
    let buyer_id = system.buyer_id(&buyer);
    let items = basket_item_ids(world, user_id, buyer_id, &product).await;
    remove_entries(world, &email, vec![BasketDeleteRequest { buyer_id, items }]).await;
    let report = world.last_deletion.as_ref().expect("No removal report");
    assert_eq!(report.status(), DeletionStatus::AllSucceeded, "Removal failed: {report:?}");
}

#[when(expr = "{string} removes item #{int} from the basket of {string}")]
async fn remove_item_by_id(world: &mut OrderWorld, email: String, item_id: i64, buyer: String) {
    let buyer_id = world.system().buyer_id(&buyer);
    remove_entries(world, &email, vec![BasketDeleteRequest { buyer_id, items: vec![item_id] }]).await;
}

#[when(expr = "{string} removes {string} and then item #{int} from the basket of {string}")]
async fn remove_product_then_item(world: &mut OrderWorld, email: String, product: String, item_id: i64, buyer: String) {
    let system = world.system();
    let user_id = system.user_id(&email);
    let buyer_id = system.buyer_id(&buyer);
    let items = basket_item_ids(world, user_id, buyer_id, &product).await;
    let requests =
        vec![BasketDeleteRequest { buyer_id, items }, BasketDeleteRequest { buyer_id, items: vec![item_id] }];
    remove_entries(world, &email, requests).await;
}

#[when(expr = "{string} places the basket of {string}")]
async fn place_basket(world: &mut OrderWorld, email: String, buyer: String) {
    let system = world.system();
    let user_id = system.user_id(&email);
    let buyer_id = system.buyer_id(&buyer);
    let baskets = system.orders.baskets(user_id).await.expect("Error fetching baskets");
    let basket = baskets.iter().find(|b| b.buyer_id == buyer_id).expect("The buyer has no basket");
    let result = system.orders.place_orders(user_id, &email, &[basket.order_id]).await.expect("Error placing order");
    assert_eq!(result.placed, vec![basket.order_id]);
    let order_id = basket.order_id;
    world.system_mut().placed.insert(buyer, order_id);
}

#[when(expr = "{string} tries to place order #{int}")]
async fn try_place_order(world: &mut OrderWorld, email: String, order_id: i64) {
    let system = world.system();
    let user_id = system.user_id(&email);
    world.last_error = system.orders.place_orders(user_id, &email, &[order_id]).await.err().map(|e| e.to_string());
}

#[when(expr = "the order of {string} moves to {word}")]
async fn move_order(world: &mut OrderWorld, buyer: String, state: String) {
    let state = state.parse::<OrderState>().expect("Not an order state");
    let system = world.system();
    let order_id = *system.placed.get(&buyer).expect("No order placed for buyer");
    world.last_error = system.orders.change_order_state(order_id, state).await.err().map(|e| e.to_string());
}

#[when(expr = "{string} is no longer available")]
async fn supplier_unavailable(world: &mut OrderWorld, supplier: String) {
    let system = world.system();
    let supplier_id = system.supplier_id(&supplier);
    let owner = system.directory.supplier(supplier_id).await.expect("Error fetching supplier").user_id;
    let update = SupplierUpdate { is_available: Some(false), ..Default::default() };
    system
        .directory
        .update_supplier(&Caller::user(owner), supplier_id, update)
        .await
        .expect("Error updating supplier");
}

#[then(expr = "the basket of {string} holds {int} item(s) worth {string}")]
async fn check_basket(world: &mut OrderWorld, buyer: String, count: usize, sum: String) {
    let system = world.system();
    let buyer_id = system.buyer_id(&buyer);
    let owner = system.db.fetch_buyer(buyer_id, None).await.expect("Error fetching buyer").expect("No such buyer");
    let baskets = system.orders.baskets(owner.user_id).await.expect("Error fetching baskets");
    let basket = baskets.iter().find(|b| b.buyer_id == buyer_id);
    let (items, total) = basket.map(|b| (b.order_items.len(), b.order_sum.to_string())).unwrap_or((0, "0.00".into()));
    assert_eq!(items, count, "Unexpected number of items in {basket:?}");
    assert_eq!(total, sum, "Unexpected basket total");
}

#[then(expr = "the order of {string} is {word}")]
async fn check_order_state(world: &mut OrderWorld, buyer: String, state: String) {
    let system = world.system();
    let buyer_id = system.buyer_id(&buyer);
    let order_id = *system.placed.get(&buyer).expect("No order placed for buyer");
    let owner = system.db.fetch_buyer(buyer_id, None).await.expect("Error fetching buyer").expect("No such buyer");
    let orders = system.orders.buyer_orders(owner.user_id).await.expect("Error fetching orders");
    let order = orders
        .iter()
        .filter(|o| o.buyer_id == buyer_id)
        .flat_map(|o| o.orders.iter())
        .find(|o| o.id == order_id)
        .expect("Order not listed");
    assert_eq!(order.state.to_string(), state);
}

#[then(expr = "{string} has {int} placed order(s) totalling {string}")]
async fn check_buyer_orders(world: &mut OrderWorld, email: String, count: usize, sum: String) {
    let system = world.system();
    let orders = system.orders.buyer_orders(system.user_id(&email)).await.expect("Error fetching orders");
    let placed = orders.iter().map(|o| o.orders.len()).sum::<usize>();
    let total = orders.iter().map(|o| o.buyer_sum).sum::<Money>();
    assert_eq!(placed, count);
    assert_eq!(total.to_string(), sum);
}

#[then(expr = "{string} sees {int} ordered item(s) worth {string}")]
async fn check_supplier_orders(world: &mut OrderWorld, email: String, count: usize, sum: String) {
    let system = world.system();
    let orders = system.orders.supplier_orders(system.user_id(&email)).await.expect("Error fetching orders");
    let items = orders.iter().flat_map(|s| s.orders.iter()).map(|o| o.order_items.len()).sum::<usize>();
    let total = orders.iter().map(|s| s.supplier_sum).sum::<Money>();
    assert_eq!(items, count);
    assert_eq!(total.to_string(), sum);
}

#[then(expr = "the removal {word}")]
async fn check_removal(world: &mut OrderWorld, outcome: String) {
    let report = world.last_deletion.take().expect("Nothing was removed");
    let expected = match outcome.as_str() {
        "succeeded" => DeletionStatus::AllSucceeded,
        "partially-succeeded" => DeletionStatus::Partial,
        "failed" => DeletionStatus::AllFailed,
        other => panic!("Unknown removal outcome {other}"),
    };
    assert_eq!(report.status(), expected, "Unexpected removal report {report:?}");
}

#[then(expr = "the removal reports {string}")]
async fn check_removal_message(world: &mut OrderWorld, message: String) {
    let report = world.last_deletion.as_ref().expect("Nothing was removed");
    let found = report.results.iter().any(|o| match &o.result {
        DeletionResult::Success(m) | DeletionResult::Error(m) => m.contains(&message),
    });
    assert!(found, "No entry of {report:?} mentions '{message}'");
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut OrderWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "the request fails with {string}")]
async fn request_fails(world: &mut OrderWorld, message: String) {
    let error = world.last_error.take().expect("The request did not fail");
    assert!(error.contains(&message), "'{error}' does not contain '{message}'");
}

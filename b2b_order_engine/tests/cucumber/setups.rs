use b2b_order_engine::{
    catalog_objects::PriceList,
    db_types::{NewBuyer, NewSupplier, UserType},
    traits::Caller,
};
use cucumber::{gherkin::Step, given};

use crate::{
    cucumber::{order_world::OrderSystem, OrderWorld},
    support::create_active_user,
};

#[given("a fresh install")]
async fn fresh_database(world: &mut OrderWorld) {
    let system = OrderSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a {word} account for {string}")]
async fn user_account(world: &mut OrderWorld, user_type: String, email: String) {
    let user_type = user_type.parse::<UserType>().expect("Not a user type");
    let system = world.system_mut();
    let user = create_active_user(&system.db, &email, user_type).await;
    system.users.insert(email, user.id);
}

#[given(expr = "{string} runs the supplier {string}")]
async fn supplier(world: &mut OrderWorld, email: String, name: String) {
    let system = world.system_mut();
    let new_supplier = NewSupplier {
        name: name.clone(),
        person: "Sales desk".into(),
        phone: "+7 495 000-00-00".into(),
        file_url: None,
        is_available: true,
    };
    let supplier =
        system.directory.create_supplier(&system.caller(&email), new_supplier).await.expect("Error creating supplier");
    system.suppliers.insert(name, supplier.id);
}

#[given(expr = "{string} buys for {string}")]
async fn buyer(world: &mut OrderWorld, email: String, name: String) {
    let system = world.system_mut();
    let new_buyer = NewBuyer {
        name: name.clone(),
        person: "Purchasing".into(),
        phone: "+7 812 000-00-00".into(),
        locality_name: "Saint Petersburg".into(),
        ..Default::default()
    };
    let buyer = system.directory.create_buyer(&system.caller(&email), new_buyer).await.expect("Error creating buyer");
    system.buyers.insert(name, buyer.id);
}

#[given(expr = "{string} publishes the price list")]
async fn publish_price_list(world: &mut OrderWorld, step: &Step, supplier: String) {
    let yaml = step.docstring.as_ref().expect("The price list must be given as a docstring");
    let price_list = PriceList::from_yaml(yaml).expect("Invalid price list");
    let system = world.system_mut();
    let supplier_id = system.supplier_id(&supplier);
    let owner = system.directory.supplier(supplier_id).await.expect("Error fetching supplier").user_id;
    let caller = Caller::user(owner);
    let url = format!("https://prices.example.com/{supplier_id}.yaml");
    system.catalog.import_price_list(&caller, supplier_id, &url, &price_list).await.expect("Error importing prices");
    system.record_listings(supplier_id).await;
}

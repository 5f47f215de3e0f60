#![allow(dead_code)]
use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use b2b_order_engine::{
    db_types::{NewUser, User, UserType},
    events::{EventHandler, Handler},
    helpers::hash_password,
    AccountManagement,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const PASSWORD: &str = "Correct-Horse-42";

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/b2b_test_{}.db", dir.display(), rand::random::<u64>())
}

/// Creates a fresh, migrated database at a random location.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    if let Err(e) = Sqlite::drop_database(&url).await {
        trace!("No database to drop at {url}: {e}");
    }
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.pool().close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        error!("🚀️ Failed to remove database {url}: {e}");
    }
}

/// Inserts an active account with the shared test password.
pub async fn create_active_user(db: &SqliteDatabase, email: &str, user_type: UserType) -> User {
    let user = NewUser {
        email: email.to_string(),
        password_hash: hash_password(PASSWORD).expect("Error hashing password"),
        first_name: "Test".into(),
        last_name: "User".into(),
        user_type,
        is_active: true,
        ..Default::default()
    };
    db.create_user(user, None).await.expect("Error creating user")
}

/// Collects every event it is handed.
#[derive(Clone)]
pub struct Recorder<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Send + Sync + Clone + 'static> Recorder<E> {
    pub fn new() -> Self {
        Self { events: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn handler(&self) -> EventHandler<E> {
        let events = Arc::clone(&self.events);
        let hook: Handler<E> = Arc::new(move |event| {
            events.lock().unwrap().push(event);
            Box::pin(async {}) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        EventHandler::new(8, hook)
    }

    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap().clone()
    }
}

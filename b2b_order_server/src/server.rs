use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use b2b_order_engine::{
    events::EventProducers,
    AccountApi,
    CatalogApi,
    DirectoryApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    notifications::{create_notification_handlers, LogMailer},
    price_list_fetcher::PriceListFetcher,
    routes::{
        health,
        BasketRoute,
        BuyerOrdersRoute,
        BuyerRoute,
        BuyersRoute,
        CategoriesRoute,
        ChangeOrderStateRoute,
        ConfirmEmailRoute,
        CreateBuyerRoute,
        CreateSupplierRoute,
        DeleteBuyerRoute,
        DeleteProfileRoute,
        DeleteSupplierRoute,
        ImportPriceListRoute,
        ListingsRoute,
        LoginRoute,
        MyProfileRoute,
        PasswordResetConfirmRoute,
        PasswordResetRoute,
        PatchBuyerRoute,
        PatchProfileRoute,
        PatchSupplierRoute,
        PlaceOrdersRoute,
        RegisterRoute,
        RemoveBasketItemsRoute,
        ReplaceBasketRoute,
        SupplierOrdersRoute,
        SupplierRoute,
        SuppliersRoute,
        UpdateBasketRoute,
        UpdateBuyerRoute,
        UpdateProfileRoute,
        UpdateSupplierRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
        info!("🗃️ Database migrations are up to date");
    }
    let handlers = create_notification_handlers(config.event_buffer_size, &config.server_email, Arc::new(LogMailer));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if let Some(admin) = &config.admin {
        let api = AccountApi::new(db.clone(), EventProducers::default());
        api.ensure_superuser(&admin.email, admin.password.reveal())
            .await
            .map_err(|e| ServerError::InitializeError(format!("Could not create the administrator account. {e}")))?;
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::InitializeError(e.to_string()))
}

/// Maps extractor failures onto the JSON error body used by every other error response.
pub(crate) fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into()),
    );
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let fetcher = PriceListFetcher::new(config.price_list_timeout)?;
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let accounts_api =
            AccountApi::new(db.clone(), producers.clone()).with_reset_token_ttl(config.password_reset_ttl);
        let directory_api = DirectoryApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("b2b::access_log"))
            .configure(configure_extractors)
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(directory_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(fetcher.clone()));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::<SqliteDatabase>::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(UpdateProfileRoute::<SqliteDatabase>::new())
            .service(PatchProfileRoute::<SqliteDatabase>::new())
            .service(DeleteProfileRoute::<SqliteDatabase>::new())
            .service(BasketRoute::<SqliteDatabase>::new())
            .service(UpdateBasketRoute::<SqliteDatabase>::new())
            .service(RemoveBasketItemsRoute::<SqliteDatabase>::new())
            .service(ReplaceBasketRoute::new())
            .service(BuyerOrdersRoute::<SqliteDatabase>::new())
            .service(PlaceOrdersRoute::<SqliteDatabase>::new())
            .service(BuyersRoute::<SqliteDatabase>::new())
            .service(CreateBuyerRoute::<SqliteDatabase>::new())
            .service(BuyerRoute::<SqliteDatabase>::new())
            .service(UpdateBuyerRoute::<SqliteDatabase>::new())
            .service(PatchBuyerRoute::<SqliteDatabase>::new())
            .service(DeleteBuyerRoute::<SqliteDatabase>::new())
            .service(ImportPriceListRoute::<SqliteDatabase>::new())
            .service(SupplierOrdersRoute::<SqliteDatabase>::new())
            .service(CreateSupplierRoute::<SqliteDatabase>::new())
            .service(UpdateSupplierRoute::<SqliteDatabase>::new())
            .service(PatchSupplierRoute::<SqliteDatabase>::new())
            .service(DeleteSupplierRoute::<SqliteDatabase>::new())
            .service(ChangeOrderStateRoute::<SqliteDatabase>::new());
        app.service(auth_scope)
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(ConfirmEmailRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(PasswordResetRoute::<SqliteDatabase>::new())
            .service(PasswordResetConfirmRoute::<SqliteDatabase>::new())
            .service(CategoriesRoute::<SqliteDatabase>::new())
            .service(ListingsRoute::<SqliteDatabase>::new())
            .service(SuppliersRoute::<SqliteDatabase>::new())
            .service(SupplierRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

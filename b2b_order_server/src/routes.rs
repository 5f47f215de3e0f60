//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module, or delegate to the engine APIs. Keep
//! this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution.
//!
//! Routes without roles are open to any authenticated user when registered in the `/api` scope, and to everyone
//! otherwise.
use actix_web::{get, http::StatusCode, web, HttpResponse, Responder};
use b2b_order_engine::{
    account_objects::{
        ConfirmEmailRequest,
        LoginRequest,
        NewUserRequest,
        PasswordResetConfirmRequest,
        PasswordResetRequest,
        ProfileUpdateRequest,
    },
    db_types::{BuyerUpdate, NewBuyer, NewSupplier, Role, SupplierUpdate},
    order_objects::{BasketDeleteRequest, BasketRequest, DeletionStatus, OrderStateRequest, PlaceOrdersRequest},
    traits::ListingQuery,
    AccountApi,
    AccountManagement,
    CatalogApi,
    CatalogManagement,
    DirectoryApi,
    DirectoryManagement,
    OrderFlowApi,
    OrderManagement,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{
        BasketUpdateResponse,
        JsonResponse,
        LoginResponse,
        PageQuery,
        PlacementResponse,
        PriceListRequest,
    },
    errors::ServerError,
    price_list_fetcher::PriceListFetcher,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register => Post "/user/register" impl AccountManagement);
/// Creates an inactive account. The confirmation key is emailed to the new user.
pub async fn register<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
    body: web::Json<NewUserRequest>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let user = api.register(body.into_inner()).await?;
    let msg = format!("User {} has been registered. Check your email for the confirmation key.", user.email);
    Ok(HttpResponse::Created().json(JsonResponse::success(msg)))
}

route!(confirm_email => Post "/user/register/confirm" impl AccountManagement);
pub async fn confirm_email<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
    body: web::Json<ConfirmEmailRequest>,
) -> Result<HttpResponse, ServerError> {
    let user = api.confirm_email(body.into_inner()).await?;
    debug!("💻️ User #{} confirmed their email", user.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success("The account has been confirmed.")))
}

route!(login => Post "/user/login" impl AccountManagement);
/// Checks the user's email and password and issues an access token.
///
/// The token is a HS256 JWT and must be sent as `Authorization: Bearer <token>` on every `/api` request. It expires
/// after the configured lifetime and is revoked early if the user's password, email or active status changes.
pub async fn login<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let user = api.login(body.into_inner()).await?;
    let token = signer.issue_token(&user).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
    debug!("💻️ Issued access token for user #{}", user.id);
    let message = "Logged in. Use the token in subsequent requests.".to_string();
    Ok(HttpResponse::Ok().json(LoginResponse { success: true, message, token }))
}

route!(password_reset => Post "/user/password_reset" impl AccountManagement);
pub async fn password_reset<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
    body: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse, ServerError> {
    api.request_password_reset(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("A password reset key has been sent to your email.")))
}

route!(password_reset_confirm => Post "/user/password_reset/confirm" impl AccountManagement);
pub async fn password_reset_confirm<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
    body: web::Json<PasswordResetConfirmRequest>,
) -> Result<HttpResponse, ServerError> {
    let user = api.confirm_password_reset(body.into_inner()).await?;
    debug!("💻️ Password reset for user #{}", user.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success("The password has been changed.")))
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(my_profile => Get "/user/profile" impl AccountManagement);
pub async fn my_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let profile = api.profile(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(update_profile => Put "/user/profile" impl AccountManagement);
pub async fn update_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
    body: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, ServerError> {
    let profile = api.update_profile(claims.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(patch_profile => Patch "/user/profile" impl AccountManagement);
pub async fn patch_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
    body: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, ServerError> {
    update_profile(claims, api, body).await
}

route!(delete_profile => Delete "/user/profile" impl AccountManagement);
/// Deactivates the caller's account. The account data is kept.
pub async fn delete_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    api.deactivate(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("The account has been deleted.")))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(categories => Get "/category" impl CatalogManagement, DirectoryManagement);
pub async fn categories<B>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError>
where B: CatalogManagement + DirectoryManagement {
    let categories = api.categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

route!(listings => Get "/supplier/products" impl CatalogManagement, DirectoryManagement);
/// Searches the listings of available suppliers. Filter with `?supplier=`, `?category=` and `?product=`.
pub async fn listings<B>(
    api: web::Data<CatalogApi<B>>,
    query: web::Query<ListingQuery>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + DirectoryManagement,
{
    let listings = api.search_listings(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listings))
}

route!(import_price_list => Post "/supplier/price-list" impl CatalogManagement, DirectoryManagement where requires [Role::Supplier]);
/// Downloads the YAML price list at `file_url` and replaces the supplier's listings with its contents.
pub async fn import_price_list<B>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
    fetcher: web::Data<PriceListFetcher>,
    body: web::Json<PriceListRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + DirectoryManagement,
{
    let PriceListRequest { supplier_id, file_url } = body.into_inner();
    debug!("💻️ User #{} is importing a price list for supplier #{supplier_id} from {file_url}", claims.user_id);
    let caller = claims.caller();
    api.import_target(&caller, supplier_id).await?;
    let price_list = fetcher.fetch(&file_url).await?;
    let summary = api.import_price_list(&caller, supplier_id, &file_url, &price_list).await?;
    let msg = format!(
        "Imported {} categories, {} listings and {} parameter values.",
        summary.categories, summary.listings, summary.parameters
    );
    Ok(HttpResponse::Ok().json(JsonResponse::success(msg)))
}

//----------------------------------------------   Suppliers  ----------------------------------------------------
route!(suppliers => Get "/supplier" impl DirectoryManagement);
pub async fn suppliers<B: DirectoryManagement>(
    api: web::Data<DirectoryApi<B>>,
    options: web::Data<ServerOptions>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServerError> {
    let page = api.suppliers(query.pagination(options.page_size)).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(supplier => Get "/supplier/{id:\\d+}" impl DirectoryManagement);
pub async fn supplier<B: DirectoryManagement>(
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let supplier = api.supplier(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(supplier))
}

route!(create_supplier => Post "/supplier" impl DirectoryManagement where requires [Role::Supplier]);
pub async fn create_supplier<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    body: web::Json<NewSupplier>,
) -> Result<HttpResponse, ServerError> {
    let supplier = api.create_supplier(&claims.caller(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(supplier))
}

route!(update_supplier => Put "/supplier/{id:\\d+}" impl DirectoryManagement where requires [Role::Supplier]);
pub async fn update_supplier<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
    body: web::Json<SupplierUpdate>,
) -> Result<HttpResponse, ServerError> {
    let supplier = api.update_supplier(&claims.caller(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(supplier))
}

route!(patch_supplier => Patch "/supplier/{id:\\d+}" impl DirectoryManagement where requires [Role::Supplier]);
pub async fn patch_supplier<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
    body: web::Json<SupplierUpdate>,
) -> Result<HttpResponse, ServerError> {
    update_supplier(claims, api, path, body).await
}

route!(delete_supplier => Delete "/supplier/{id:\\d+}" impl DirectoryManagement where requires [Role::Supplier]);
pub async fn delete_supplier<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = path.into_inner();
    api.delete_supplier(&claims.caller(), supplier_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Supplier #{supplier_id} has been deleted."))))
}

//----------------------------------------------   Buyers  ----------------------------------------------------
route!(buyers => Get "/buyer" impl DirectoryManagement where requires [Role::Buyer]);
pub async fn buyers<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    options: web::Data<ServerOptions>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServerError> {
    let page = api.buyers(&claims.caller(), query.pagination(options.page_size)).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(create_buyer => Post "/buyer" impl DirectoryManagement where requires [Role::Buyer]);
pub async fn create_buyer<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    body: web::Json<NewBuyer>,
) -> Result<HttpResponse, ServerError> {
    let buyer = api.create_buyer(&claims.caller(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(buyer))
}

route!(buyer => Get "/buyer/{id:\\d+}" impl DirectoryManagement where requires [Role::Buyer]);
pub async fn buyer<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let buyer = api.buyer(&claims.caller(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(buyer))
}

route!(update_buyer => Put "/buyer/{id:\\d+}" impl DirectoryManagement where requires [Role::Buyer]);
pub async fn update_buyer<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
    body: web::Json<BuyerUpdate>,
) -> Result<HttpResponse, ServerError> {
    let buyer = api.update_buyer(&claims.caller(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(buyer))
}

route!(patch_buyer => Patch "/buyer/{id:\\d+}" impl DirectoryManagement where requires [Role::Buyer]);
pub async fn patch_buyer<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
    body: web::Json<BuyerUpdate>,
) -> Result<HttpResponse, ServerError> {
    update_buyer(claims, api, path, body).await
}

route!(delete_buyer => Delete "/buyer/{id:\\d+}" impl DirectoryManagement where requires [Role::Buyer]);
pub async fn delete_buyer<B: DirectoryManagement>(
    claims: JwtClaims,
    api: web::Data<DirectoryApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let buyer_id = path.into_inner();
    api.delete_buyer(&claims.caller(), buyer_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Buyer #{buyer_id} has been deleted."))))
}

//----------------------------------------------   Baskets  ----------------------------------------------------
route!(basket => Get "/buyer/basket" impl OrderManagement, AccountManagement where requires [Role::Buyer]);
pub async fn basket<B>(claims: JwtClaims, api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + AccountManagement {
    let baskets = api.baskets(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(baskets))
}

route!(update_basket => Post "/buyer/basket" impl OrderManagement, AccountManagement where requires [Role::Buyer]);
/// Sets item quantities in the baskets of the caller's buyers. Nothing is written unless every entry is valid.
pub async fn update_basket<B>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<Vec<BasketRequest>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + AccountManagement,
{
    let added = api.update_basket(claims.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(BasketUpdateResponse { success: true, added }))
}

route!(remove_basket_items => Delete "/buyer/basket" impl OrderManagement, AccountManagement where requires [Role::Buyer]);
/// Removes items from the caller's baskets.
///
/// Every buyer entry is handled on its own. Responds with 200 if all of them succeeded, 400 if all failed, and 206
/// Partial Content otherwise.
pub async fn remove_basket_items<B>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<Vec<BasketDeleteRequest>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + AccountManagement,
{
    let report = api.remove_basket_items(claims.user_id, body.into_inner()).await?;
    let status = match report.status() {
        DeletionStatus::AllSucceeded => StatusCode::OK,
        DeletionStatus::Partial => StatusCode::PARTIAL_CONTENT,
        DeletionStatus::AllFailed => StatusCode::BAD_REQUEST,
    };
    Ok(HttpResponse::build(status).json(report))
}

route!(replace_basket => Put "/buyer/basket" requires [Role::Buyer]);
pub async fn replace_basket() -> Result<HttpResponse, ServerError> {
    Err(ServerError::MethodNotAllowed("PUT".to_string()))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(buyer_orders => Get "/buyer/order" impl OrderManagement, AccountManagement where requires [Role::Buyer]);
pub async fn buyer_orders<B>(claims: JwtClaims, api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + AccountManagement {
    let orders = api.buyer_orders(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(place_orders => Post "/buyer/order" impl OrderManagement, AccountManagement where requires [Role::Buyer]);
/// Places the requested baskets as orders. Responds with 201 if every basket was placed, and with 206 Partial
/// Content if some of the ids were rejected.
pub async fn place_orders<B>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<PlaceOrdersRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + AccountManagement,
{
    let result = api.place_orders(claims.user_id, &claims.email, &body.order_ids).await?;
    let (status, message) = if result.rejected.is_empty() {
        (StatusCode::CREATED, format!("Placed orders {:?}.", result.placed))
    } else {
        (StatusCode::PARTIAL_CONTENT, format!("Placed orders {:?}. Rejected: {:?}.", result.placed, result.rejected))
    };
    let response = PlacementResponse { success: true, message, placed: result.placed, rejected: result.rejected };
    Ok(HttpResponse::build(status).json(response))
}

route!(supplier_orders => Get "/supplier/order" impl OrderManagement, AccountManagement where requires [Role::Supplier]);
pub async fn supplier_orders<B>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + AccountManagement,
{
    let orders = api.supplier_orders(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(change_order_state => Patch "/order/{id:\\d+}/state" impl OrderManagement, AccountManagement where requires [Role::Admin]);
pub async fn change_order_state<B>(
    api: web::Data<OrderFlowApi<B>>,
    path: web::Path<i64>,
    body: web::Json<OrderStateRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + AccountManagement,
{
    let order = api.change_order_state(path.into_inner(), body.state).await?;
    Ok(HttpResponse::Ok().json(order))
}

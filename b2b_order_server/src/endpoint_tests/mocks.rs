use b2b_order_engine::{
    catalog_objects::PriceList,
    db_types::{
        Buyer,
        BuyerUpdate,
        NewBuyer,
        NewSupplier,
        NewUser,
        Order,
        OrderState,
        PasswordResetToken,
        Supplier,
        SupplierUpdate,
        User,
        UserUpdate,
    },
    order_objects::{BasketChange, BasketUpdate},
    traits::{
        AccountApiError,
        AccountManagement,
        CatalogError,
        CatalogManagement,
        CategoryView,
        DirectoryError,
        DirectoryManagement,
        ImportSummary,
        ListingKey,
        ListingQuery,
        ListingStock,
        ListingView,
        OrderFlowError,
        OrderLine,
        OrderLineFilter,
        OrderManagement,
        Page,
        Pagination,
        PlacementResult,
        UserProfile,
    },
};
use chrono::{DateTime, Utc};
use mockall::mock;

mock! {
    pub Backend {}
    impl AccountManagement for Backend {
        async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
        async fn create_user(&self, user: NewUser, confirmation_token: Option<String>) -> Result<User, AccountApiError>;
        async fn fetch_confirmation_token(&self, user_id: i64) -> Result<Option<String>, AccountApiError>;
        async fn activate_user(&self, user_id: i64) -> Result<User, AccountApiError>;
        async fn update_user(&self, user_id: i64, update: UserUpdate, confirmation_token: Option<String>) -> Result<User, AccountApiError>;
        async fn deactivate_user(&self, user_id: i64) -> Result<User, AccountApiError>;
        async fn store_password_reset_token(&self, user_id: i64, token: &str) -> Result<(), AccountApiError>;
        async fn fetch_password_reset_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AccountApiError>;
        async fn reset_password(&self, user_id: i64, password_hash: &str) -> Result<User, AccountApiError>;
        async fn purge_password_reset_tokens(&self, cutoff: DateTime<Utc>) -> Result<u64, AccountApiError>;
        async fn fetch_admin_emails(&self) -> Result<Vec<String>, AccountApiError>;
        async fn fetch_profile(&self, user_id: i64) -> Result<Option<UserProfile>, AccountApiError>;
    }
    impl DirectoryManagement for Backend {
        async fn fetch_buyer(&self, buyer_id: i64, owner: Option<i64>) -> Result<Option<Buyer>, DirectoryError>;
        async fn fetch_buyers(&self, owner: Option<i64>, page: Pagination) -> Result<Page<Buyer>, DirectoryError>;
        async fn insert_buyer(&self, user_id: i64, buyer: NewBuyer) -> Result<Buyer, DirectoryError>;
        async fn update_buyer(&self, buyer_id: i64, owner: Option<i64>, update: BuyerUpdate) -> Result<Buyer, DirectoryError>;
        async fn delete_buyer(&self, buyer_id: i64, owner: Option<i64>) -> Result<(), DirectoryError>;
        async fn fetch_supplier(&self, supplier_id: i64, owner: Option<i64>) -> Result<Option<Supplier>, DirectoryError>;
        async fn fetch_suppliers(&self, owner: Option<i64>, page: Pagination) -> Result<Page<Supplier>, DirectoryError>;
        async fn insert_supplier(&self, user_id: i64, supplier: NewSupplier) -> Result<Supplier, DirectoryError>;
        async fn update_supplier(&self, supplier_id: i64, owner: Option<i64>, update: SupplierUpdate) -> Result<Supplier, DirectoryError>;
        async fn delete_supplier(&self, supplier_id: i64, owner: Option<i64>) -> Result<(), DirectoryError>;
    }
    impl CatalogManagement for Backend {
        async fn fetch_categories(&self) -> Result<Vec<CategoryView>, CatalogError>;
        async fn search_listings(&self, query: ListingQuery) -> Result<Vec<ListingView>, CatalogError>;
        async fn import_price_list(&self, supplier_id: i64, file_url: &str, price_list: &PriceList) -> Result<ImportSummary, CatalogError>;
    }
    impl OrderManagement for Backend {
        async fn fetch_buyer_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, OrderFlowError>;
        async fn fetch_supplier_ids_for_user(&self, user_id: i64) -> Result<Vec<i64>, OrderFlowError>;
        async fn fetch_listing_stock(&self, keys: &[ListingKey]) -> Result<Vec<ListingStock>, OrderFlowError>;
        async fn apply_basket_changes(&self, changes: &[BasketChange]) -> Result<Vec<BasketUpdate>, OrderFlowError>;
        async fn delete_basket_items(&self, buyer_id: i64, item_ids: &[i64]) -> Result<Option<(i64, u64)>, OrderFlowError>;
        async fn fetch_order_lines(&self, filter: OrderLineFilter) -> Result<Vec<OrderLine>, OrderFlowError>;
        async fn place_orders(&self, user_id: i64, order_ids: &[i64]) -> Result<PlacementResult, OrderFlowError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn update_order_state(&self, order_id: i64, from: OrderState, to: OrderState) -> Result<Option<Order>, OrderFlowError>;
    }
}

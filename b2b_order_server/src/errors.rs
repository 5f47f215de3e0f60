use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use b2b_order_engine::{AccountApiError, CatalogError, DirectoryError, OrderFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Method \"{0}\" not allowed.")]
    MethodNotAllowed(String),
    #[error("Could not load the price list. {0}")]
    PriceListError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::AccountNotFound => StatusCode::UNAUTHORIZED,
                AuthError::AccountInactive => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PriceListError(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("User account not found.")]
    AccountNotFound,
    #[error("The account is not active.")]
    AccountInactive,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AccountApiError::InternalError(e) => Self::BackendError(e),
            AccountApiError::ValidationError(s) => Self::ValidationError(s),
            AccountApiError::EmailAlreadyRegistered(_) => Self::ValidationError(e.to_string()),
            AccountApiError::InvalidToken => Self::ValidationError(e.to_string()),
            AccountApiError::UserNotFound => Self::NoRecordFound(e.to_string()),
            AccountApiError::AccountInactive => Self::AuthenticationError(AuthError::AccountInactive),
            AccountApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
        }
    }
}

impl From<DirectoryError> for ServerError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            DirectoryError::ValidationError(s) => Self::ValidationError(s),
            DirectoryError::BuyerNotFound(_) | DirectoryError::SupplierNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            DirectoryError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogError::SupplierNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::ShopNameMismatch { .. } | CatalogError::InvalidPriceList(_) => {
                Self::ValidationError(e.to_string())
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => {
                error!("🛒️ Order flow database error: {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::ConcurrentModification(_) => Self::Conflict(e.to_string()),
            OrderFlowError::EmptyRequest
            | OrderFlowError::BuyerNotOwned(_)
            | OrderFlowError::InvalidBasketItems { .. }
            | OrderFlowError::NothingToPlace(_)
            | OrderFlowError::InvalidTransition { .. } => Self::ValidationError(e.to_string()),
        }
    }
}

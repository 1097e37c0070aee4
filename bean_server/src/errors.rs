use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use bean_engine::{helpers::SignatureError, CartError, CatalogError, OrderFlowError, ProfileError};
use log::error;
use thiserror::Error;

use crate::processor::ProcessorError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Invalid webhook signature. {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("The resource already exists. {0}")]
    Conflict(String),
    #[error("The payment processor could not be reached. {0}")]
    ProcessorError(#[from] ProcessorError),
    #[error("The request body is larger than the {0} byte limit.")]
    PayloadTooLarge(usize),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::MisconfiguredAuthority => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ProcessorError(_) => StatusCode::BAD_GATEWAY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("The server cannot validate access tokens.")]
    MisconfiguredAuthority,
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            CatalogError::BeanNotFound(_) => Self::NoRecordFound("Bean not found".into()),
            CatalogError::InvalidBean(s) => Self::ValidationError(s),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            CartError::BeanNotFound(_) => Self::NoRecordFound("Bean not found".into()),
            CartError::CartItemNotFound(_) => Self::NoRecordFound("Cart item not found".into()),
            CartError::InvalidQuantity(_) |
            CartError::QuantityLimitExceeded |
            CartError::EmptyCart |
            CartError::TotalOverflow => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<ProfileError> for ServerError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            ProfileError::ProfileNotFound => Self::NoRecordFound("Profile not found".into()),
            ProfileError::ProfileAlreadyExists => Self::Conflict(e.to_string()),
            ProfileError::InvalidProfile(s) => Self::ValidationError(s),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::MalformedEvent(_) | OrderFlowError::MissingUserId(_) => {
                Self::ValidationError(e.to_string())
            },
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::DatabaseError(_) | OrderFlowError::Timeout(_) => Self::BackendError(e.to_string()),
        }
    }
}

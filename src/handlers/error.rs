// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Database,
    External,
    Internal,
}

/// Rejection carried through warp and turned into the uniform
/// `{success:false, message, missingFields?}` envelope by the recovery
/// handler in `routes.rs`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub missing_fields: Vec<String>,
}

impl ApiError {
    fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            message: message.into(),
            missing_fields: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    /// The caller-correctable case: reports exactly the missing names.
    pub fn missing_fields(fields: Vec<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Validation,
            message: "All fields are required".to_string(),
            missing_fields: fields,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Database, message)
    }

    pub fn external_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::External, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::Validation => StatusCode::BAD_REQUEST,
            ApiErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Database | ApiErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorKind::External => StatusCode::BAD_GATEWAY,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}

/// Shorthand for `warp::reject::custom` on an `ApiError`.
pub fn reject(err: ApiError) -> warp::Rejection {
    warp::reject::custom(err)
}

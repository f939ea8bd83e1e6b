use crate::application_port::*;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::reject;

/// What callers outside the auth core get to see. Internal detail is logged
/// and dropped here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Missing or malformed authorization header")]
    MalformedCredential,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("Token not found")]
    NotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Operation not permitted")]
    Forbidden,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::MalformedCredential => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::TokenExpired
            | ApiErrorCode::TokenRevoked => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredential | AuthError::WrongScheme { .. } => {
                ApiErrorCode::MalformedCredential
            }
            AuthError::UnknownUser | AuthError::BadCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::MalformedToken(_)
            | AuthError::InvalidSignature
            | AuthError::InvalidSubject
            | AuthError::Unauthorized => ApiErrorCode::InvalidToken,
            AuthError::TokenExpired => ApiErrorCode::TokenExpired,
            AuthError::TokenRevoked => ApiErrorCode::TokenRevoked,
            AuthError::NotFound => ApiErrorCode::NotFound,
            AuthError::UserExists => ApiErrorCode::EmailTaken,
            AuthError::Forbidden { .. } => ApiErrorCode::Forbidden,
            e @ (AuthError::PersistenceConflict(_)
            | AuthError::Store(_)
            | AuthError::Hashing(_)
            | AuthError::Signing(_)) => ApiErrorCode::internal(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl From<ApiErrorCode> for ApiError {
    fn from(code: ApiErrorCode) -> Self {
        ApiError {
            code,
            message: code.to_string(),
        }
    }
}

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing or malformed")]
    MissingCredential,
    #[error("authorization scheme is not {expected}")]
    WrongScheme { expected: &'static str },
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token malformed: {0}")]
    MalformedToken(String),
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("token subject is not a user id")]
    InvalidSubject,
    #[error("unknown user")]
    UnknownUser,
    #[error("invalid credentials")]
    BadCredentials,
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token revoked")]
    TokenRevoked,
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),
    #[error("user already exists")]
    UserExists,
    #[error("unauthorized")]
    Unauthorized,
    #[error("operation not permitted on platform {platform:?}")]
    Forbidden { platform: String },
    #[error("store error: {0}")]
    Store(String),
}

/// Coarse classification used by callers to pick a response class.
/// None of these are retried by the auth core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InputMalformed,
    AuthenticationFailed,
    NotFound,
    Conflict,
    Forbidden,
    PersistenceFailure,
    Internal,
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::MissingCredential | AuthError::WrongScheme { .. } => {
                ErrorCategory::InputMalformed
            }
            AuthError::MalformedToken(_)
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidSubject
            | AuthError::UnknownUser
            | AuthError::BadCredentials
            | AuthError::TokenRevoked
            | AuthError::Unauthorized => ErrorCategory::AuthenticationFailed,
            AuthError::NotFound => ErrorCategory::NotFound,
            AuthError::UserExists => ErrorCategory::Conflict,
            AuthError::Forbidden { .. } => ErrorCategory::Forbidden,
            AuthError::PersistenceConflict(_) | AuthError::Store(_) => {
                ErrorCategory::PersistenceFailure
            }
            AuthError::Hashing(_) | AuthError::Signing(_) => ErrorCategory::Internal,
        }
    }

    /// True for errors whose message may carry storage or primitive details.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::PersistenceFailure | ErrorCategory::Internal
        )
    }
}

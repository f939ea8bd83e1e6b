use super::AuthError;
use crate::domain_model::{CredentialRecord, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub new_email: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct IssuedAccessToken {
    pub access_token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: UserId,
    pub email: String,
    pub tokens: AuthTokens,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    /// A mismatch is `Ok(false)`; only an unreadable hash is an error.
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
        ttl: Duration,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthSessionManager: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<CredentialRecord, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Mint a new access token. The refresh token itself is not rotated.
    async fn refresh(&self, refresh_token: &str) -> Result<IssuedAccessToken, AuthError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
    /// Possession of a valid access token is the only authorization factor;
    /// the old password is not asked for.
    async fn change_password(
        &self,
        access_token: &str,
        request: ChangePasswordInput,
    ) -> Result<CredentialRecord, AuthError>;
    async fn authenticate(&self, access_token: &str) -> Result<UserId, AuthError>;
    async fn authorize_service(&self, api_key: &str) -> Result<(), AuthError>;
    /// Administrative wipe of every credential. Dev platform only.
    async fn reset_credentials(&self) -> Result<u64, AuthError>;
}

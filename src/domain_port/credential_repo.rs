use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait CredentialRepo: Send + Sync {
    /// Insert a new credential. A duplicate email is `AuthError::UserExists`.
    async fn create(&self, record: &CredentialRecord) -> Result<(), AuthError>;

    /// Fetch credentials by email (for login).
    async fn get_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<CredentialRecord>, AuthError>;

    /// Replace email and password hash, bumping `updated_at`.
    /// Missing user is `AuthError::UnknownUser`.
    async fn update(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<CredentialRecord, AuthError>;

    /// Administrative reset. Refresh tokens owned by the removed users go with them.
    async fn delete_all(&self) -> Result<u64, AuthError>;
}

use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    /// Insert a record. A token value that already exists is
    /// `AuthError::PersistenceConflict`; the store never retries.
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AuthError>;

    async fn get_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Set `revoked_at` if it is unset. Returns `false` when no record matches.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AuthError>;
}

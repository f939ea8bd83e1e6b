use super::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored login credential. The password hash is a self-describing PHC string.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialRecord {
    pub user_id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(user_id: UserId, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        CredentialRecord {
            user_id,
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

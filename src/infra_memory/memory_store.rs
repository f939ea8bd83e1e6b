use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Process-local persistence for the `memory` backend and for tests.
///
/// Email and token uniqueness are enforced through the map entries, the same
/// guarantees the SQL unique keys give.
#[derive(Default)]
pub struct InMemoryStore {
    credentials: DashMap<UserId, CredentialRecord>,
    emails: DashMap<String, UserId>,
    refresh_tokens: DashMap<String, RefreshTokenRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.len()
    }
}

#[async_trait::async_trait]
impl CredentialRepo for InMemoryStore {
    async fn create(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        match self.emails.entry(record.email.clone()) {
            Entry::Occupied(_) => return Err(AuthError::UserExists),
            Entry::Vacant(v) => {
                v.insert(record.user_id);
            }
        }
        self.credentials.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let Some(user_id) = self.emails.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.credentials.get(&user_id).map(|r| r.value().clone()))
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self.credentials.get(&user_id).map(|r| r.value().clone()))
    }

    async fn update(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<CredentialRecord, AuthError> {
        let old_email = self
            .credentials
            .get(&user_id)
            .map(|r| r.email.clone())
            .ok_or(AuthError::UnknownUser)?;

        if old_email != email {
            match self.emails.entry(email.to_string()) {
                Entry::Occupied(o) if *o.get() != user_id => return Err(AuthError::UserExists),
                Entry::Occupied(_) => {}
                Entry::Vacant(v) => {
                    v.insert(user_id);
                }
            }
            self.emails.remove(&old_email);
        }

        let mut rec = self
            .credentials
            .get_mut(&user_id)
            .ok_or(AuthError::UnknownUser)?;
        rec.email = email.to_string();
        rec.password_hash = password_hash.to_string();
        rec.updated_at = Utc::now();
        Ok(rec.clone())
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let removed = self.credentials.len() as u64;
        self.credentials.clear();
        self.emails.clear();
        self.refresh_tokens.clear();
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for InMemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AuthError> {
        match self.refresh_tokens.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(AuthError::PersistenceConflict(
                "refresh token value already exists".to_string(),
            )),
            Entry::Vacant(v) => {
                v.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self.refresh_tokens.get(token).map(|r| r.value().clone()))
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AuthError> {
        match self.refresh_tokens.get_mut(token) {
            Some(mut rec) => {
                rec.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_record(token: &str) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            token: token.to_string(),
            user_id: UserId::new_random(),
            created_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        store
            .create(&CredentialRecord::new(UserId::new_random(), "a@x.com", "h1"))
            .await
            .unwrap();
        let err = store
            .create(&CredentialRecord::new(UserId::new_random(), "a@x.com", "h2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
    }

    #[tokio::test]
    async fn update_moves_the_email_index() {
        let store = InMemoryStore::new();
        let id = UserId::new_random();
        store
            .create(&CredentialRecord::new(id, "old@x.com", "h1"))
            .await
            .unwrap();

        let updated = store.update(id, "new@x.com", "h2").await.unwrap();
        assert_eq!(updated.email, "new@x.com");
        assert_eq!(updated.password_hash, "h2");
        assert!(store.get_by_email("old@x.com").await.unwrap().is_none());
        assert_eq!(
            store.get_by_email("new@x.com").await.unwrap().unwrap().user_id,
            id
        );
    }

    #[tokio::test]
    async fn update_refuses_an_email_owned_by_someone_else() {
        let store = InMemoryStore::new();
        let a = UserId::new_random();
        store.create(&CredentialRecord::new(a, "a@x.com", "h")).await.unwrap();
        store
            .create(&CredentialRecord::new(UserId::new_random(), "b@x.com", "h"))
            .await
            .unwrap();

        let err = store.update(a, "b@x.com", "h").await.unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
        assert!(matches!(
            store.update(UserId::new_random(), "c@x.com", "h").await,
            Err(AuthError::UnknownUser)
        ));
    }

    #[tokio::test]
    async fn duplicate_token_value_is_a_conflict() {
        let store = InMemoryStore::new();
        store.insert(&token_record("abc")).await.unwrap();
        let err = store.insert(&token_record("abc")).await.unwrap_err();
        assert!(matches!(err, AuthError::PersistenceConflict(_)));
    }

    #[tokio::test]
    async fn mark_revoked_keeps_the_first_instant() {
        let store = InMemoryStore::new();
        store.insert(&token_record("abc")).await.unwrap();

        let first = Utc::now();
        assert!(store.mark_revoked("abc", first).await.unwrap());
        assert!(
            store
                .mark_revoked("abc", first + Duration::hours(1))
                .await
                .unwrap()
        );
        let rec = store.get_by_token("abc").await.unwrap().unwrap();
        assert_eq!(rec.revoked_at, Some(first));

        assert!(!store.mark_revoked("missing", first).await.unwrap());
    }

    #[tokio::test]
    async fn delete_all_cascades_to_refresh_tokens() {
        let store = InMemoryStore::new();
        store
            .create(&CredentialRecord::new(UserId::new_random(), "a@x.com", "h"))
            .await
            .unwrap();
        store.insert(&token_record("abc")).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert_eq!(store.refresh_token_count(), 0);
        assert!(store.get_by_email("a@x.com").await.unwrap().is_none());
    }
}

use crate::application_port::AuthError;
use crate::domain_model::{RefreshTokenRecord, UserId};
use crate::domain_port::RefreshTokenRepo;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use std::time::Duration;

pub const REFRESH_TOKEN_BYTES: usize = 32;
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Issues opaque refresh tokens and owns their expiry and revocation rules.
/// Storage uniqueness is left to the repo; a collision surfaces as
/// `AuthError::PersistenceConflict` and is not retried here.
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepo>,
    ttl: Duration,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>, ttl: Duration) -> Self {
        RefreshTokenStore { repo, ttl }
    }

    /// 32 bytes from the OS CSPRNG, lowercase hex (64 chars).
    pub fn generate() -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub async fn issue(&self, user_id: UserId) -> Result<RefreshTokenRecord, AuthError> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at = Utc::now();
        let record = RefreshTokenRecord {
            token: Self::generate(),
            user_id,
            created_at,
            expires_at: created_at + ttl,
            revoked_at: None,
        };
        self.repo.insert(&record).await?;
        Ok(record)
    }

    pub async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        self.repo
            .get_by_token(token)
            .await?
            .ok_or(AuthError::NotFound)
    }

    pub fn validate(&self, record: &RefreshTokenRecord) -> Result<UserId, AuthError> {
        Self::validate_at(record, Utc::now())
    }

    /// Expiry is checked before revocation.
    pub fn validate_at(record: &RefreshTokenRecord, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        if record.is_usable_at(now) {
            Ok(record.user_id)
        } else if record.is_expired_at(now) {
            Err(AuthError::TokenExpired)
        } else {
            Err(AuthError::TokenRevoked)
        }
    }

    /// Lookup then validate.
    pub async fn validate_token(&self, token: &str) -> Result<UserId, AuthError> {
        let record = self.lookup(token).await?;
        self.validate(&record)
    }

    /// Idempotent: revoking a revoked token succeeds and keeps the first instant.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        if self.repo.mark_revoked(token, Utc::now()).await? {
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::InMemoryStore;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Every insert collides.
    #[derive(Default)]
    struct CollidingRepo {
        inserts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RefreshTokenRepo for CollidingRepo {
        async fn insert(&self, _record: &RefreshTokenRecord) -> Result<(), AuthError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::PersistenceConflict(
                "refresh token value already exists".to_string(),
            ))
        }

        async fn get_by_token(&self, _token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
            Ok(None)
        }

        async fn mark_revoked(&self, _token: &str, _at: DateTime<Utc>) -> Result<bool, AuthError> {
            Ok(false)
        }
    }

    fn store() -> RefreshTokenStore {
        RefreshTokenStore::new(Arc::new(InMemoryStore::new()), DEFAULT_REFRESH_TTL)
    }

    #[test]
    fn generated_tokens_are_64_lowercase_hex() {
        let token = RefreshTokenStore::generate();
        assert_eq!(token.len(), 64);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn ten_thousand_tokens_never_collide() {
        let tokens: HashSet<String> = (0..10_000).map(|_| RefreshTokenStore::generate()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[tokio::test]
    async fn issue_persists_a_sixty_day_token() {
        let store = store();
        let user = UserId::new_random();
        let record = store.issue(user).await.unwrap();

        assert_eq!(record.user_id, user);
        assert!(record.revoked_at.is_none());
        assert_eq!((record.expires_at - record.created_at).num_days(), 60);
        assert_eq!(store.lookup(&record.token).await.unwrap(), record);
    }

    #[tokio::test]
    async fn token_collision_is_a_conflict_without_retry() {
        let repo = Arc::new(CollidingRepo::default());
        let store = RefreshTokenStore::new(repo.clone(), DEFAULT_REFRESH_TTL);

        assert!(matches!(
            store.issue(UserId::new_random()).await,
            Err(AuthError::PersistenceConflict(_))
        ));
        assert_eq!(repo.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let store = store();
        assert!(matches!(
            store.lookup("deadbeef").await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(
            store.revoke("deadbeef").await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn validate_fails_on_every_call_after_revoke() {
        let store = store();
        let user = UserId::new_random();
        let record = store.issue(user).await.unwrap();

        assert_eq!(store.validate_token(&record.token).await.unwrap(), user);
        assert_eq!(store.validate_token(&record.token).await.unwrap(), user);

        for _ in 0..3 {
            store.revoke(&record.token).await.unwrap();
            for _ in 0..3 {
                assert!(matches!(
                    store.validate_token(&record.token).await,
                    Err(AuthError::TokenRevoked)
                ));
            }
        }
    }

    #[tokio::test]
    async fn repeated_revoke_keeps_first_timestamp() {
        let store = store();
        let record = store.issue(UserId::new_random()).await.unwrap();
        store.revoke(&record.token).await.unwrap();
        let first = store.lookup(&record.token).await.unwrap().revoked_at;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.revoke(&record.token).await.unwrap();
        assert_eq!(store.lookup(&record.token).await.unwrap().revoked_at, first);
    }

    #[test]
    fn expiry_is_checked_before_revocation() {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            token: RefreshTokenStore::generate(),
            user_id: UserId::new_random(),
            created_at: now - chrono::Duration::days(61),
            expires_at: now - chrono::Duration::days(1),
            revoked_at: Some(now - chrono::Duration::days(2)),
        };
        assert!(matches!(
            RefreshTokenStore::validate_at(&record, now),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            RefreshTokenStore::validate_at(&record, record.expires_at),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            RefreshTokenStore::validate_at(&record, now - chrono::Duration::days(10)),
            Err(AuthError::TokenRevoked)
        ));
    }

    #[tokio::test]
    async fn zero_ttl_tokens_are_born_expired() {
        let store = RefreshTokenStore::new(Arc::new(InMemoryStore::new()), Duration::ZERO);
        let record = store.issue(UserId::new_random()).await.unwrap();
        assert!(matches!(
            store.validate_token(&record.token).await,
            Err(AuthError::TokenExpired)
        ));
    }
}

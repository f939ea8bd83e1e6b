use super::RefreshTokenStore;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::CredentialRepo;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEV_PLATFORM: &str = "dev";

/// Process-wide settings fixed at construction.
#[derive(Clone)]
pub struct AuthConfig {
    pub access_ttl: Duration,
    /// Shared secret for the `ApiKey` scheme. Empty disables service callers.
    pub service_api_key: String,
    pub platform: String,
}

impl AuthConfig {
    pub fn is_dev(&self) -> bool {
        self.platform == DEV_PLATFORM
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            access_ttl: DEFAULT_ACCESS_TTL,
            service_api_key: String::new(),
            platform: DEV_PLATFORM.to_string(),
        }
    }
}

pub struct RealAuthSessionManager {
    credential_repo: Arc<dyn CredentialRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    refresh_tokens: RefreshTokenStore,
    config: AuthConfig,
}

impl RealAuthSessionManager {
    pub fn new(
        credential_repo: Arc<dyn CredentialRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        refresh_tokens: RefreshTokenStore,
        config: AuthConfig,
    ) -> Self {
        Self {
            credential_repo,
            credential_hasher,
            token_codec,
            refresh_tokens,
            config,
        }
    }

    fn service_key_mac(&self) -> Result<Hmac<Sha256>, AuthError> {
        Hmac::<Sha256>::new_from_slice(self.config.service_api_key.as_bytes())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn login_state(succeeded: bool) -> SessionState {
        let event = if succeeded {
            SessionEvent::LoginSucceeded
        } else {
            SessionEvent::LoginFailed
        };
        SessionState::Anonymous.after(event)
    }

    fn login_rejected(err: AuthError) -> AuthError {
        let state = Self::login_state(false);
        debug!(?state, error = %err, "login rejected");
        err
    }

    fn log_failure(op: &str, err: &AuthError) {
        if err.is_internal() {
            warn!(op, error = %err, "auth operation failed");
        } else {
            debug!(op, error = %err, "auth operation rejected");
        }
    }
}

#[async_trait::async_trait]
impl AuthSessionManager for RealAuthSessionManager {
    async fn register(&self, request: RegisterInput) -> Result<CredentialRecord, AuthError> {
        let RegisterInput { email, password } = request;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let record = CredentialRecord::new(UserId::new_random(), email, password_hash);
        self.credential_repo
            .create(&record)
            .await
            .inspect_err(|e| Self::log_failure("register", e))?;

        info!(user_id = %record.user_id, "user registered");
        Ok(record)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let rec = self
            .credential_repo
            .get_by_email(&email)
            .await?
            .ok_or_else(|| Self::login_rejected(AuthError::UnknownUser))?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            debug!(user_id = %rec.user_id, "login with wrong password");
            return Err(Self::login_rejected(AuthError::BadCredentials));
        }

        let (access_token, access_exp) = self
            .token_codec
            .issue_access_token(rec.user_id, self.config.access_ttl)
            .await?;

        let refresh = self
            .refresh_tokens
            .issue(rec.user_id)
            .await
            .inspect_err(|e| Self::log_failure("login", e))?;

        let state = Self::login_state(true);
        info!(user_id = %rec.user_id, ?state, "login succeeded");

        Ok(LoginResult {
            user_id: rec.user_id,
            email: rec.email,
            tokens: AuthTokens {
                access_token,
                refresh_token: RefreshToken(refresh.token),
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh.expires_at,
            },
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<IssuedAccessToken, AuthError> {
        let user_id = self
            .refresh_tokens
            .validate_token(refresh_token)
            .await
            .inspect_err(|e| Self::log_failure("refresh", e))?;

        if self.credential_repo.get_by_id(user_id).await?.is_none() {
            debug!(%user_id, "refresh for a removed user");
            return Err(AuthError::Unauthorized);
        }

        let (access_token, expires_at) = self
            .token_codec
            .issue_access_token(user_id, self.config.access_ttl)
            .await?;

        let state = SessionState::Authenticated.after(SessionEvent::RefreshSucceeded);
        info!(%user_id, ?state, "access token refreshed");

        Ok(IssuedAccessToken {
            access_token,
            expires_at,
        })
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens
            .revoke(refresh_token)
            .await
            .inspect_err(|e| Self::log_failure("revoke", e))?;

        let state = SessionState::Authenticated.after(SessionEvent::RevokeSucceeded);
        info!(?state, "refresh token revoked");
        Ok(())
    }

    async fn change_password(
        &self,
        access_token: &str,
        request: ChangePasswordInput,
    ) -> Result<CredentialRecord, AuthError> {
        let ChangePasswordInput {
            new_email,
            new_password,
        } = request;

        let user_id = self.authenticate(access_token).await?;

        let password_hash = self.credential_hasher.hash_password(&new_password).await?;
        let updated = self
            .credential_repo
            .update(user_id, &new_email, &password_hash)
            .await
            .inspect_err(|e| Self::log_failure("change_password", e))?;

        info!(%user_id, "credentials updated");
        Ok(updated)
    }

    async fn authenticate(&self, access_token: &str) -> Result<UserId, AuthError> {
        let user_id = self
            .token_codec
            .verify_access_token(&AccessToken(access_token.to_string()))
            .await
            .map_err(|e| {
                Self::log_failure("authenticate", &e);
                if e.is_internal() { e } else { AuthError::Unauthorized }
            })?;

        if self.credential_repo.get_by_id(user_id).await?.is_none() {
            debug!(%user_id, "access token for a removed user");
            return Err(AuthError::Unauthorized);
        }

        Ok(user_id)
    }

    async fn authorize_service(&self, api_key: &str) -> Result<(), AuthError> {
        if self.config.service_api_key.is_empty() {
            debug!("service key presented but none is configured");
            return Err(AuthError::Unauthorized);
        }

        // Compare HMAC tags so the check does not leak the matching prefix length.
        let mut expected = self.service_key_mac()?;
        expected.update(self.config.service_api_key.as_bytes());
        let expected = expected.finalize().into_bytes();

        let mut presented = self.service_key_mac()?;
        presented.update(api_key.as_bytes());
        presented.verify_slice(&expected[..]).map_err(|_| {
            debug!("service key mismatch");
            AuthError::Unauthorized
        })
    }

    async fn reset_credentials(&self) -> Result<u64, AuthError> {
        if !self.config.is_dev() {
            warn!(platform = %self.config.platform, "credential reset refused");
            return Err(AuthError::Forbidden {
                platform: self.config.platform.clone(),
            });
        }

        let removed = self
            .credential_repo
            .delete_all()
            .await
            .inspect_err(|e| Self::log_failure("reset_credentials", e))?;
        warn!(removed, "all credentials deleted");
        Ok(removed)
    }
}

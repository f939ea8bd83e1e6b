use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::{anyhow, bail};
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Composition root: picks backends from settings and wires the session manager.
pub struct Server {
    pub session_manager: Arc<dyn AuthSessionManager>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        if settings.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must be set");
        }

        let (credential_repo, sql_refresh_repo, pool): (
            Arc<dyn CredentialRepo>,
            Arc<dyn RefreshTokenRepo>,
            Option<Pool<MySql>>,
        ) = match settings.storage.backend.as_str() {
            "memory" => {
                let store = Arc::new(InMemoryStore::new());
                let credentials: Arc<dyn CredentialRepo> = store.clone();
                let refresh_tokens: Arc<dyn RefreshTokenRepo> = store;
                (credentials, refresh_tokens, None)
            }
            "mysql" => {
                let dsn = settings
                    .storage
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("storage.mysql_dsn is required for the mysql backend"))?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                ensure_schema(&pool).await?;
                let credentials: Arc<dyn CredentialRepo> =
                    Arc::new(MySqlCredentialRepo::new(pool.clone()));
                let refresh_tokens: Arc<dyn RefreshTokenRepo> =
                    Arc::new(MySqlRefreshTokenRepo::new(pool.clone()));
                (credentials, refresh_tokens, Some(pool))
            }
            other => return Err(anyhow!("Unknown storage backend: {}", other)),
        };

        let refresh_repo: Arc<dyn RefreshTokenRepo> =
            match settings.storage.refresh_backend.as_str() {
                "sql" => sql_refresh_repo,
                "redis" => {
                    let dsn = settings.storage.redis_dsn.as_deref().ok_or_else(|| {
                        anyhow!("storage.redis_dsn is required for the redis refresh backend")
                    })?;
                    let redis_client = redis::Client::open(dsn)?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    Arc::new(RedisRefreshTokenRepo::new(
                        redis_manager,
                        settings.storage.redis_prefix.clone(),
                    ))
                }
                other => return Err(anyhow!("Unknown refresh token backend: {}", other)),
            };

        let credential_hasher: Arc<dyn CredentialHasher> = match settings.auth.argon2 {
            Some(cost) => Arc::new(Argon2PasswordHasher::with_cost(
                cost.memory_kib,
                cost.iterations,
                cost.parallelism,
            )?),
            None => Arc::new(Argon2PasswordHasher::new()),
        };
        let token_codec: Arc<dyn TokenCodec> =
            Arc::new(JwtHs256Codec::new(settings.auth.jwt_secret.as_bytes()));

        let refresh_tokens = RefreshTokenStore::new(
            refresh_repo,
            Duration::from_secs(settings.auth.refresh_ttl_days * 24 * 60 * 60),
        );
        let config = AuthConfig {
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            service_api_key: settings.auth.api_key.clone(),
            platform: settings.auth.platform.clone(),
        };

        let session_manager: Arc<dyn AuthSessionManager> = Arc::new(RealAuthSessionManager::new(
            credential_repo,
            credential_hasher,
            token_codec,
            refresh_tokens,
            config,
        ));

        info!(
            storage = %settings.storage.backend,
            refresh = %settings.storage.refresh_backend,
            platform = %settings.auth.platform,
            "server ready"
        );

        Ok(Self {
            session_manager,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        info!("server shut down");
    }
}

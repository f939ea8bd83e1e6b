use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;

const REFRESH_TOKEN_INSERT: &str = include_str!("refresh_token_insert.lua");
const REFRESH_TOKEN_REVOKE: &str = include_str!("refresh_token_revoke.lua");

/// Refresh tokens as Redis hashes under `{prefix}:{token}`.
///
/// Keys carry no TTL: an expired token must still answer `TokenExpired`
/// rather than disappear into `NotFound`.
pub struct RedisRefreshTokenRepo {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRefreshTokenRepo {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRefreshTokenRepo {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token: &str) -> String {
        format!("{}:{}", self.prefix, token)
    }
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, AuthError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AuthError::Store(format!("refresh token hash missing {name}")))
}

fn parse_millis(raw: &str) -> Result<DateTime<Utc>, AuthError> {
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| AuthError::Store(format!("invalid timestamp {raw:?}")))
}

fn record_from_fields(
    token: &str,
    fields: &HashMap<String, String>,
) -> Result<RefreshTokenRecord, AuthError> {
    let user_id = field(fields, "user_id")?
        .parse::<UserId>()
        .map_err(|e| AuthError::Store(e.to_string()))?;
    let revoked_at = fields
        .get("revoked_at")
        .map(|raw| parse_millis(raw))
        .transpose()?;

    Ok(RefreshTokenRecord {
        token: token.to_string(),
        user_id,
        created_at: parse_millis(field(fields, "created_at")?)?,
        expires_at: parse_millis(field(fields, "expires_at")?)?,
        revoked_at,
    })
}

#[async_trait::async_trait]
impl RefreshTokenRepo for RedisRefreshTokenRepo {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AuthError> {
        let key = self.key(&record.token);
        let mut conn = self.conn.clone();
        let script = Script::new(REFRESH_TOKEN_INSERT);
        let inserted: i64 = script
            .key(&key)
            .arg(record.user_id.to_string())
            .arg(record.created_at.timestamp_millis())
            .arg(record.expires_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        match inserted {
            1 => Ok(()),
            _ => Err(AuthError::PersistenceConflict(
                "refresh token value already exists".to_string(),
            )),
        }
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let key = self.key(token);
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        if fields.is_empty() {
            return Ok(None);
        }
        record_from_fields(token, &fields).map(Some)
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AuthError> {
        let key = self.key(token);
        let mut conn = self.conn.clone();
        let script = Script::new(REFRESH_TOKEN_REVOKE);
        let found: i64 = script
            .key(&key)
            .arg(at.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(found == 1)
    }
}

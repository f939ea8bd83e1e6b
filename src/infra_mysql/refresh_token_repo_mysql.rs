use super::util::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlRefreshTokenRepo {
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, AuthError> {
        let token: String = row.try_get("token").map_err(store_err)?;
        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(store_err)?;
        let user_id = uid_from_bytes(&user_id_bytes)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(store_err)?;
        let revoked_at: Option<DateTime<Utc>> = row.try_get("revoked_at").map_err(store_err)?;

        Ok(RefreshTokenRecord {
            token,
            user_id,
            created_at,
            expires_at,
            revoked_at,
        })
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MySqlRefreshTokenRepo {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO refresh_token (token, user_id, created_at, expires_at, revoked_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(&record.token)
        .bind(uid_as_bytes(&record.user_id))
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::PersistenceConflict("refresh token value already exists".to_string())
            } else {
                store_err(e)
            }
        })?;

        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token, user_id, created_at, expires_at, revoked_at
FROM refresh_token
WHERE token = ?
"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
UPDATE refresh_token
SET revoked_at = COALESCE(revoked_at, ?)
WHERE token = ?
"#,
        )
        .bind(at)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Already revoked rows report 0 affected rows unless CLIENT_FOUND_ROWS is set.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM refresh_token WHERE token = ?")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(count > 0)
    }
}

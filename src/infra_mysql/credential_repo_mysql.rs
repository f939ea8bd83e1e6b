use super::util::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlCredentialRepo {
    pool: MySqlPool,
}

impl MySqlCredentialRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlCredentialRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<CredentialRecord, AuthError> {
        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(store_err)?;
        let user_id = uid_from_bytes(&user_id_bytes)?;

        let email: String = row.try_get("email").map_err(store_err)?;
        let password_hash: String = row.try_get("password_hash").map_err(store_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(store_err)?;

        Ok(CredentialRecord {
            user_id,
            email,
            password_hash,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl CredentialRepo for MySqlCredentialRepo {
    async fn create(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO credential (user_id, email, password_hash, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(uid_as_bytes(&record.user_id))
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                store_err(e)
            }
        })?;

        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, created_at, updated_at
FROM credential
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<CredentialRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, created_at, updated_at
FROM credential
WHERE user_id = ?
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn update(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<CredentialRecord, AuthError> {
        sqlx::query(
            r#"
UPDATE credential
SET email = ?, password_hash = ?, updated_at = ?
WHERE user_id = ?
"#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .bind(uid_as_bytes(&user_id))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                store_err(e)
            }
        })?;

        // rows_affected is 0 for a no-op update too, so re-read to tell a missing user apart
        self.get_by_id(user_id).await?.ok_or(AuthError::UnknownUser)
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM credential")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }
}

use sqlx::MySqlPool;

const SCHEMA: &str = include_str!("schema.sql");

/// Create the `credential` and `refresh_token` tables if they are missing.
pub async fn ensure_schema(pool: &MySqlPool) -> anyhow::Result<()> {
    for statement in SCHEMA.split("-- statement") {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

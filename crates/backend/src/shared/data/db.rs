use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use sqlx::PgPool;

use crate::shared::config::DatabaseConfig;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect to the analytics database and keep the connection for the process lifetime.
///
/// The analytics store is populated by the ETL jobs; this service never creates
/// or migrates tables, it only checks that the expected schema is reachable.
pub async fn initialize_database(config: &DatabaseConfig, schema: &str) -> anyhow::Result<()> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(false);

    let conn = Database::connect(options).await?;

    let check_schema = format!(
        "SELECT COUNT(*)::int AS tables FROM information_schema.tables WHERE table_schema = '{}'",
        schema.replace('\'', "''")
    );
    let row = conn
        .query_one(Statement::from_string(DatabaseBackend::Postgres, check_schema))
        .await?;
    let tables: i32 = row
        .map(|r| r.try_get("", "tables"))
        .transpose()?
        .unwrap_or(0);

    if tables == 0 {
        tracing::warn!("Schema '{}' has no tables, queries will return errors", schema);
    } else {
        tracing::info!(
            "Connected to analytics database, schema '{}' has {} tables",
            schema,
            tables
        );
    }

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

/// sqlx pool underneath the sea-orm connection, for queries whose shape is only known at runtime
pub fn get_pool() -> &'static PgPool {
    get_connection().get_postgres_connection_pool()
}

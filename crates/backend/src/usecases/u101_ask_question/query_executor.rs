use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use contracts::shared::query_row::QueryRow;
use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::AskError;
use crate::shared::data::db::get_pool;
use crate::shared::data::row::normalize_row;

static TRAILING_SEMICOLON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r";\s*$").expect("semicolon pattern is valid"));

/// Any `LIMIT n` counts, even one inside a subquery
static HAS_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bLIMIT\s+\d+").expect("limit pattern is valid"));

/// Strip one trailing `;` and append `LIMIT <limit>` unless a limit is already present
pub fn apply_row_limit(sql: &str, limit: u32) -> String {
    let cleaned = TRAILING_SEMICOLON.replace(sql, "");
    let cleaned = cleaned.trim();
    if HAS_LIMIT.is_match(cleaned) {
        cleaned.to_string()
    } else {
        format!("{} LIMIT {}", cleaned, limit)
    }
}

/// Runs a single statement and returns its rows in column order
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run(&self, sql: &str) -> Result<Vec<QueryRow>>;
}

/// Runner over the shared PostgreSQL pool.
///
/// Every statement runs inside a transaction that is rolled back afterwards,
/// marked read-only unless disabled in config.
pub struct PgQueryRunner {
    read_only: bool,
}

impl PgQueryRunner {
    pub fn new(read_only: bool) -> Self {
        Self { read_only }
    }
}

#[async_trait]
impl QueryRunner for PgQueryRunner {
    async fn run(&self, sql: &str) -> Result<Vec<QueryRow>> {
        let mut tx = get_pool().begin().await?;
        if self.read_only {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await?;
        }

        // Prepared statement: the extended protocol refuses multiple statements
        let rows = sqlx::query(sql).fetch_all(&mut *tx).await?;
        tx.rollback().await?;

        Ok(rows.iter().map(normalize_row).collect())
    }
}

/// Row-limited execution of generated SQL
pub struct QueryExecutor {
    runner: Arc<dyn QueryRunner>,
    default_limit: u32,
}

impl QueryExecutor {
    pub fn new(runner: Arc<dyn QueryRunner>, default_limit: u32) -> Self {
        Self {
            runner,
            default_limit,
        }
    }

    pub async fn execute(&self, sql: &str) -> Result<Vec<QueryRow>, AskError> {
        let limited = apply_row_limit(sql, self.default_limit);
        match self.runner.run(&limited).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::error!("Database error: {} | SQL: {}", e, limited);
                Err(AskError::QueryExecution(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording runner for unit tests.

    use super::*;
    use std::sync::Mutex;

    pub struct RecordingRunner {
        rows: std::result::Result<Vec<QueryRow>, String>,
        pub statements: Mutex<Vec<String>>,
    }

    impl RecordingRunner {
        pub fn returning(rows: Vec<QueryRow>) -> Self {
            Self {
                rows: Ok(rows),
                statements: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                rows: Err(message.into()),
                statements: Mutex::new(Vec::new()),
            }
        }

        pub fn statement_count(&self) -> usize {
            self.statements.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl QueryRunner for RecordingRunner {
        async fn run(&self, sql: &str) -> Result<Vec<QueryRow>> {
            self.statements.lock().unwrap().push(sql.to_string());
            match &self.rows {
                Ok(rows) => Ok(rows.clone()),
                Err(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }
    }
}

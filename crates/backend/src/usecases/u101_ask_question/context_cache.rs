use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{DatabaseBackend, FromQueryResult, Statement};

use crate::shared::data::db::get_connection;

/// Fallback when the orders table is empty
const DEFAULT_MIN_DATE: (i32, u32, u32) = (2024, 1, 1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// Live snapshot of the names the model should match user wording against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseContext {
    pub salespeople: Vec<String>,
    pub customers: Vec<String>,
    pub products: Vec<String>,
    pub categories: Vec<String>,
    pub date_range: DateRange,
}

/// The five lookups a context refresh is made of
#[async_trait]
pub trait ContextLookup: Send + Sync {
    async fn salespeople(&self) -> Result<Vec<String>>;
    async fn customers(&self) -> Result<Vec<String>>;
    async fn products(&self) -> Result<Vec<String>>;
    async fn categories(&self) -> Result<Vec<String>>;
    /// `(min, max)` order date not in the future, either side may be missing
    async fn order_date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CachedContext {
    context: Arc<DatabaseContext>,
    stored_at: DateTime<Utc>,
}

/// Process-wide cache of [`DatabaseContext`] with a fixed time window.
///
/// The slot lock is only taken to read or swap the `Arc`, never across a lookup.
/// Two requests that miss at the same time both refresh; the later store wins.
pub struct SchemaContextCache {
    lookup: Arc<dyn ContextLookup>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: RwLock<Option<CachedContext>>,
}

impl SchemaContextCache {
    pub fn new(lookup: Arc<dyn ContextLookup>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            lookup,
            clock,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Cached context, refreshed when older than the window
    pub async fn get(&self) -> Result<Arc<DatabaseContext>> {
        let now = self.clock.now();
        self.get_or_refresh(now).await
    }

    pub async fn get_or_refresh(&self, now: DateTime<Utc>) -> Result<Arc<DatabaseContext>> {
        if let Some(context) = self.fresh(now) {
            return Ok(context);
        }

        let context = Arc::new(self.refresh(now).await?);
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedContext {
            context: Arc::clone(&context),
            stored_at: now,
        });
        Ok(context)
    }

    fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<DatabaseContext>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| now - cached.stored_at < self.ttl)
            .map(|cached| Arc::clone(&cached.context))
    }

    async fn refresh(&self, now: DateTime<Utc>) -> Result<DatabaseContext> {
        let started = std::time::Instant::now();
        let (salespeople, customers, products, categories, (min, max)) = tokio::try_join!(
            self.lookup.salespeople(),
            self.lookup.customers(),
            self.lookup.products(),
            self.lookup.categories(),
            self.lookup.order_date_range(),
        )?;

        let (y, m, d) = DEFAULT_MIN_DATE;
        let date_range = DateRange {
            min: min.or_else(|| NaiveDate::from_ymd_opt(y, m, d)).unwrap_or(now.date_naive()),
            max: max.unwrap_or(now.date_naive()),
        };

        tracing::info!(
            "Database context refreshed in {}ms: {} salespeople, {} customers, \
             {} products, {} categories",
            started.elapsed().as_millis(),
            salespeople.len(),
            customers.len(),
            products.len(),
            categories.len()
        );

        Ok(DatabaseContext {
            salespeople,
            customers,
            products,
            categories,
            date_range,
        })
    }
}

// ─── PostgreSQL lookups ───────────────────────────────────────────────────────

#[derive(Debug, FromQueryResult)]
struct NameRow {
    name: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct DateRangeRow {
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
}

/// Context lookups against the analytics schema
pub struct PgContextLookup {
    schema: String,
}

impl PgContextLookup {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    async fn names(&self, sql: String) -> Result<Vec<String>> {
        let db = get_connection();
        let stmt = Statement::from_string(DatabaseBackend::Postgres, sql);
        let rows = NameRow::find_by_statement(stmt).all(db).await?;
        Ok(rows.into_iter().filter_map(|r| r.name).collect())
    }
}

#[async_trait]
impl ContextLookup for PgContextLookup {
    async fn salespeople(&self) -> Result<Vec<String>> {
        self.names(format!(
            "SELECT DISTINCT salesperson_name AS name FROM {}.salespeople ORDER BY name",
            self.schema
        ))
        .await
    }

    async fn customers(&self) -> Result<Vec<String>> {
        self.names(format!(
            "SELECT DISTINCT customer_name AS name FROM {}.customers ORDER BY name LIMIT 50",
            self.schema
        ))
        .await
    }

    async fn products(&self) -> Result<Vec<String>> {
        self.names(format!(
            "SELECT DISTINCT product_name AS name FROM {}.product_catalog ORDER BY name",
            self.schema
        ))
        .await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.names(format!(
            "SELECT DISTINCT product_category AS name FROM {}.sales_orders ORDER BY name",
            self.schema
        ))
        .await
    }

    async fn order_date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let db = get_connection();
        let sql = format!(
            r#"
            SELECT
                MIN(order_date) AS min_date,
                MAX(order_date) AS max_date
            FROM {}.sales_orders
            WHERE order_date <= CURRENT_DATE
            "#,
            self.schema
        );
        let stmt = Statement::from_string(DatabaseBackend::Postgres, sql);
        let row = DateRangeRow::find_by_statement(stmt).one(db).await?;
        Ok(row.map(|r| (r.min_date, r.max_date)).unwrap_or((None, None)))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_same_context_within_window() {
        let lookup = Arc::new(CountingLookup::default());
        let clock = Arc::new(FixedClock::at(start()));
        let cache = SchemaContextCache::new(lookup.clone(), clock.clone(), Duration::minutes(5));

        let first = cache.get().await.unwrap();
        clock.advance(Duration::minutes(4));
        let second = cache.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(lookup.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_after_window() {
        let lookup = Arc::new(CountingLookup::default());
        let clock = Arc::new(FixedClock::at(start()));
        let cache = SchemaContextCache::new(lookup.clone(), clock.clone(), Duration::minutes(5));

        let first = cache.get().await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = cache.get().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(lookup.refresh_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_max_date_defaults_to_refresh_day() {
        let cache = SchemaContextCache::new(
            Arc::new(CountingLookup::default()),
            Arc::new(SystemClock),
            Duration::minutes(5),
        );

        let context = cache.get_or_refresh(start()).await.unwrap();
        assert_eq!(context.date_range.min, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(context.date_range.max, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(context.customers.len(), 30);
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_refresh() {
        let cache = SchemaContextCache::new(
            Arc::new(CountingLookup::failing()),
            Arc::new(SystemClock),
            Duration::minutes(5),
        );

        let err = cache.get_or_refresh(start()).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    /// Every lookup waits until all five have started
    struct RendezvousLookup(tokio::sync::Barrier);

    impl RendezvousLookup {
        async fn meet(&self) -> Vec<String> {
            self.0.wait().await;
            vec!["x".to_string()]
        }
    }

    #[async_trait]
    impl ContextLookup for RendezvousLookup {
        async fn salespeople(&self) -> Result<Vec<String>> {
            Ok(self.meet().await)
        }

        async fn customers(&self) -> Result<Vec<String>> {
            Ok(self.meet().await)
        }

        async fn products(&self) -> Result<Vec<String>> {
            Ok(self.meet().await)
        }

        async fn categories(&self) -> Result<Vec<String>> {
            Ok(self.meet().await)
        }

        async fn order_date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
            self.meet().await;
            Ok((None, None))
        }
    }

    #[tokio::test]
    async fn test_lookups_run_concurrently() {
        let cache = SchemaContextCache::new(
            Arc::new(RendezvousLookup(tokio::sync::Barrier::new(5))),
            Arc::new(SystemClock),
            Duration::minutes(5),
        );

        let context = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            cache.get_or_refresh(start()),
        )
        .await
        .expect("lookups were awaited one after another")
        .unwrap();

        assert_eq!(context.salespeople, vec!["x"]);
        assert_eq!(context.date_range.min, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}

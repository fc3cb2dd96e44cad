use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{DatabaseBackend, FromQueryResult, Statement};

use crate::shared::data::db::get_connection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyRevenue {
    pub this_week: f64,
    pub last_week: f64,
    /// Revenue of the last 7 days, oldest first, zero-filled
    pub daily: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, FromQueryResult)]
pub struct YesterdayOrders {
    pub orders: i32,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct TopPerformer {
    pub name: String,
    pub revenue: f64,
    pub orders: i32,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct TrendingCategory {
    pub category: String,
    pub this_week_orders: i32,
    pub last_week_orders: i32,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, FromQueryResult)]
pub struct ActivePipeline {
    pub active: i32,
    pub value: f64,
}

/// One lookup per insight card. `None` means there is nothing to show.
#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn weekly_revenue(&self) -> Result<Option<WeeklyRevenue>>;
    async fn yesterday_orders(&self) -> Result<Option<YesterdayOrders>>;
    async fn top_performer(&self) -> Result<Option<TopPerformer>>;
    async fn trending_category(&self) -> Result<Option<TrendingCategory>>;
    async fn active_pipeline(&self) -> Result<Option<ActivePipeline>>;
}

#[derive(Debug, FromQueryResult)]
struct WeekTotalsRow {
    this_week: f64,
    last_week: f64,
}

#[derive(Debug, FromQueryResult)]
struct DailyRow {
    revenue: f64,
}

pub struct PgInsightSource {
    schema: String,
}

impl PgInsightSource {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    fn stmt(&self, sql: &str) -> Statement {
        Statement::from_string(DatabaseBackend::Postgres, sql.replace("{schema}", &self.schema))
    }
}

#[async_trait]
impl InsightSource for PgInsightSource {
    async fn weekly_revenue(&self) -> Result<Option<WeeklyRevenue>> {
        let db = get_connection();

        let totals_sql = r#"
            SELECT
                COALESCE(SUM(CASE WHEN order_date >= CURRENT_DATE - INTERVAL '7 days' THEN revenue_amount ELSE 0 END), 0)::float AS this_week,
                COALESCE(SUM(CASE WHEN order_date >= CURRENT_DATE - INTERVAL '14 days'
                                   AND order_date < CURRENT_DATE - INTERVAL '7 days' THEN revenue_amount ELSE 0 END), 0)::float AS last_week
            FROM {schema}.sales_orders
            WHERE order_date >= CURRENT_DATE - INTERVAL '14 days'
        "#;
        let Some(totals) = WeekTotalsRow::find_by_statement(self.stmt(totals_sql))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let daily_sql = r#"
            SELECT COALESCE(o.revenue, 0)::float AS revenue
            FROM (
                SELECT generate_series(CURRENT_DATE - INTERVAL '6 days', CURRENT_DATE, '1 day')::date AS d
            ) dates
            LEFT JOIN (
                SELECT order_date::date AS day, SUM(revenue_amount) AS revenue
                FROM {schema}.sales_orders
                WHERE order_date >= CURRENT_DATE - INTERVAL '6 days'
                GROUP BY order_date::date
            ) o ON dates.d = o.day
            ORDER BY dates.d
        "#;
        let daily = DailyRow::find_by_statement(self.stmt(daily_sql))
            .all(db)
            .await?
            .into_iter()
            .map(|r| r.revenue)
            .collect();

        Ok(Some(WeeklyRevenue {
            this_week: totals.this_week,
            last_week: totals.last_week,
            daily,
        }))
    }

    async fn yesterday_orders(&self) -> Result<Option<YesterdayOrders>> {
        let sql = r#"
            SELECT
                COUNT(*)::int AS orders,
                COALESCE(SUM(revenue_amount), 0)::float AS revenue
            FROM {schema}.sales_orders
            WHERE order_date = CURRENT_DATE - INTERVAL '1 day'
        "#;
        Ok(YesterdayOrders::find_by_statement(self.stmt(sql))
            .one(get_connection())
            .await?)
    }

    async fn top_performer(&self) -> Result<Option<TopPerformer>> {
        let sql = r#"
            SELECT
                s.salesperson_name AS name,
                SUM(o.revenue_amount)::float AS revenue,
                COUNT(*)::int AS orders
            FROM {schema}.sales_orders o
            JOIN {schema}.salespeople s ON o.salesperson_id = s.salesperson_id
            WHERE o.order_date >= CURRENT_DATE - INTERVAL '30 days'
            GROUP BY s.salesperson_id, s.salesperson_name
            ORDER BY revenue DESC
            LIMIT 1
        "#;
        Ok(TopPerformer::find_by_statement(self.stmt(sql))
            .one(get_connection())
            .await?)
    }

    async fn trending_category(&self) -> Result<Option<TrendingCategory>> {
        let sql = r#"
            WITH category_orders AS (
                SELECT
                    product_category,
                    COUNT(CASE WHEN order_date >= CURRENT_DATE - INTERVAL '7 days' THEN 1 END)::int AS this_week_orders,
                    COUNT(CASE WHEN order_date >= CURRENT_DATE - INTERVAL '14 days'
                                AND order_date < CURRENT_DATE - INTERVAL '7 days' THEN 1 END)::int AS last_week_orders
                FROM {schema}.sales_orders
                WHERE order_date >= CURRENT_DATE - INTERVAL '14 days'
                GROUP BY product_category
            )
            SELECT
                product_category AS category,
                this_week_orders,
                last_week_orders,
                CASE
                    WHEN last_week_orders > 0
                    THEN ((this_week_orders - last_week_orders)::float / last_week_orders * 100)
                    ELSE 0
                END::float AS change_pct
            FROM category_orders
            WHERE this_week_orders > 0 AND product_category IS NOT NULL
            ORDER BY change_pct DESC
            LIMIT 1
        "#;
        Ok(TrendingCategory::find_by_statement(self.stmt(sql))
            .one(get_connection())
            .await?)
    }

    async fn active_pipeline(&self) -> Result<Option<ActivePipeline>> {
        let sql = r#"
            SELECT
                COUNT(*)::int AS active,
                COALESCE(SUM(quoted_amount), 0)::float AS value
            FROM {schema}.sales_quotations
            WHERE status::text = 'Active'
        "#;
        Ok(ActivePipeline::find_by_statement(self.stmt(sql))
            .one(get_connection())
            .await?)
    }
}

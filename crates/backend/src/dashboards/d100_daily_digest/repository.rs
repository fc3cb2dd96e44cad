use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{DatabaseBackend, FromQueryResult, Statement};

use crate::shared::data::db::get_connection;

// ─── Metrics model ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthTotals {
    pub revenue: f64,
    pub orders: i64,
    pub profit: f64,
    pub avg_order: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodTotals {
    pub revenue: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub name: String,
    pub category: String,
    pub revenue: f64,
    pub units: i64,
}

/// Customer or salesperson ranked by revenue
#[derive(Debug, Clone, PartialEq)]
pub struct RankedAccount {
    pub name: String,
    pub revenue: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChange {
    pub category: String,
    pub revenue: f64,
    /// Month over month percent, 0 without last month revenue
    pub change: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub active: i64,
    pub value: f64,
    pub avg_probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTrend {
    pub name: String,
    pub change: f64,
}

/// Everything the digest is computed from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DigestMetrics {
    pub this_month: MonthTotals,
    pub last_month: MonthTotals,
    pub this_week: PeriodTotals,
    pub last_week: PeriodTotals,
    pub yesterday: PeriodTotals,
    pub top_products: Vec<ProductSales>,
    pub top_customers: Vec<RankedAccount>,
    /// Ordered by this month revenue, descending
    pub category_performance: Vec<CategoryChange>,
    pub top_salespeople: Vec<RankedAccount>,
    pub pipeline: PipelineStats,
    pub rising_products: Vec<ProductTrend>,
    pub declining_products: Vec<ProductTrend>,
}

#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_metrics(&self) -> Result<DigestMetrics>;
}

// ─── Query rows ───────────────────────────────────────────────────────────────

#[derive(Debug, FromQueryResult)]
struct MonthRow {
    period: String,
    revenue: f64,
    orders: i32,
    profit: f64,
    avg_order: f64,
}

#[derive(Debug, FromQueryResult)]
struct WeekRow {
    period: String,
    revenue: f64,
    orders: i32,
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    revenue: f64,
    orders: i32,
}

#[derive(Debug, FromQueryResult)]
struct ProductRow {
    name: Option<String>,
    category: Option<String>,
    revenue: Option<f64>,
    units: Option<i32>,
}

#[derive(Debug, FromQueryResult)]
struct AccountRow {
    name: Option<String>,
    revenue: Option<f64>,
    orders: i32,
}

#[derive(Debug, FromQueryResult)]
struct CategoryRow {
    category: Option<String>,
    revenue: f64,
    change: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct PipelineRow {
    active: i32,
    value: f64,
    avg_probability: f64,
}

#[derive(Debug, FromQueryResult)]
struct ProductTrendRow {
    name: Option<String>,
    change: Option<f64>,
    direction: String,
}

/// Rising = first `n` rising rows; declining = last `n` declining rows, weakest first.
/// Rows arrive ordered by change descending.
pub fn split_product_trends(
    rows: Vec<(ProductTrend, bool)>,
    n: usize,
) -> (Vec<ProductTrend>, Vec<ProductTrend>) {
    let (rising, declining): (Vec<_>, Vec<_>) = rows.into_iter().partition(|(_, up)| *up);
    let rising = rising.into_iter().take(n).map(|(t, _)| t).collect();
    let skip = declining.len().saturating_sub(n);
    let declining = declining
        .into_iter()
        .skip(skip)
        .rev()
        .map(|(t, _)| t)
        .collect();
    (rising, declining)
}

// ─── PostgreSQL source ────────────────────────────────────────────────────────

/// Runs the digest query battery against the analytics schema, one query at a time
pub struct PgMetricsSource {
    schema: String,
}

impl PgMetricsSource {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    fn stmt(&self, sql: &str) -> Statement {
        Statement::from_string(DatabaseBackend::Postgres, sql.replace("{schema}", &self.schema))
    }

    async fn monthly_comparison(&self) -> Result<(MonthTotals, MonthTotals)> {
        let sql = r#"
            SELECT
                CASE
                    WHEN order_date >= date_trunc('month', CURRENT_DATE) THEN 'this_month'
                    ELSE 'last_month'
                END AS period,
                COALESCE(SUM(revenue_amount), 0)::float AS revenue,
                COUNT(*)::int AS orders,
                COALESCE(SUM(gross_profit), 0)::float AS profit,
                COALESCE(AVG(revenue_amount), 0)::float AS avg_order
            FROM {schema}.sales_orders
            WHERE order_date >= date_trunc('month', CURRENT_DATE) - INTERVAL '1 month'
              AND order_date <= CURRENT_DATE
            GROUP BY 1
        "#;
        let rows = MonthRow::find_by_statement(self.stmt(sql))
            .all(get_connection())
            .await?;

        let mut this_month = MonthTotals::default();
        let mut last_month = MonthTotals::default();
        for row in rows {
            let totals = MonthTotals {
                revenue: row.revenue,
                orders: row.orders as i64,
                profit: row.profit,
                avg_order: row.avg_order,
            };
            match row.period.as_str() {
                "this_month" => this_month = totals,
                _ => last_month = totals,
            }
        }
        Ok((this_month, last_month))
    }

    async fn weekly_comparison(&self) -> Result<(PeriodTotals, PeriodTotals)> {
        let sql = r#"
            SELECT
                CASE
                    WHEN order_date >= CURRENT_DATE - INTERVAL '7 days' THEN 'this_week'
                    ELSE 'last_week'
                END AS period,
                COALESCE(SUM(revenue_amount), 0)::float AS revenue,
                COUNT(*)::int AS orders
            FROM {schema}.sales_orders
            WHERE order_date >= CURRENT_DATE - INTERVAL '14 days'
              AND order_date <= CURRENT_DATE
            GROUP BY 1
        "#;
        let rows = WeekRow::find_by_statement(self.stmt(sql))
            .all(get_connection())
            .await?;

        let mut this_week = PeriodTotals::default();
        let mut last_week = PeriodTotals::default();
        for row in rows {
            let totals = PeriodTotals {
                revenue: row.revenue,
                orders: row.orders as i64,
            };
            match row.period.as_str() {
                "this_week" => this_week = totals,
                _ => last_week = totals,
            }
        }
        Ok((this_week, last_week))
    }

    async fn yesterday(&self) -> Result<PeriodTotals> {
        let sql = r#"
            SELECT
                COALESCE(SUM(revenue_amount), 0)::float AS revenue,
                COUNT(*)::int AS orders
            FROM {schema}.sales_orders
            WHERE order_date = CURRENT_DATE - INTERVAL '1 day'
        "#;
        let row = TotalsRow::find_by_statement(self.stmt(sql))
            .one(get_connection())
            .await?;
        Ok(row
            .map(|r| PeriodTotals {
                revenue: r.revenue,
                orders: r.orders as i64,
            })
            .unwrap_or_default())
    }

    async fn top_products(&self) -> Result<Vec<ProductSales>> {
        let sql = r#"
            SELECT
                product_name AS name,
                product_category AS category,
                SUM(revenue_amount)::float AS revenue,
                SUM(quantity)::int AS units
            FROM {schema}.sales_orders
            WHERE order_date >= date_trunc('month', CURRENT_DATE)
              AND order_date <= CURRENT_DATE
            GROUP BY product_name, product_category
            ORDER BY revenue DESC
            LIMIT 5
        "#;
        let rows = ProductRow::find_by_statement(self.stmt(sql))
            .all(get_connection())
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ProductSales {
                name: r.name.unwrap_or_default(),
                category: r.category.unwrap_or_default(),
                revenue: r.revenue.unwrap_or(0.0),
                units: r.units.unwrap_or(0) as i64,
            })
            .collect())
    }

    async fn ranked_accounts(&self, sql: &str) -> Result<Vec<RankedAccount>> {
        let rows = AccountRow::find_by_statement(self.stmt(sql))
            .all(get_connection())
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| RankedAccount {
                name: r.name.unwrap_or_default(),
                revenue: r.revenue.unwrap_or(0.0),
                orders: r.orders as i64,
            })
            .collect())
    }

    async fn top_customers(&self) -> Result<Vec<RankedAccount>> {
        self.ranked_accounts(
            r#"
            SELECT
                c.customer_name AS name,
                SUM(o.revenue_amount)::float AS revenue,
                COUNT(*)::int AS orders
            FROM {schema}.sales_orders o
            JOIN {schema}.customers c ON o.customer_id = c.customer_id
            WHERE o.order_date >= date_trunc('month', CURRENT_DATE)
              AND o.order_date <= CURRENT_DATE
            GROUP BY c.customer_name
            ORDER BY revenue DESC
            LIMIT 5
            "#,
        )
        .await
    }

    async fn top_salespeople(&self) -> Result<Vec<RankedAccount>> {
        self.ranked_accounts(
            r#"
            SELECT
                s.salesperson_name AS name,
                SUM(o.revenue_amount)::float AS revenue,
                COUNT(*)::int AS orders
            FROM {schema}.sales_orders o
            JOIN {schema}.salespeople s ON o.salesperson_id = s.salesperson_id
            WHERE o.order_date >= date_trunc('month', CURRENT_DATE)
              AND o.order_date <= CURRENT_DATE
            GROUP BY s.salesperson_name
            ORDER BY revenue DESC
            LIMIT 5
            "#,
        )
        .await
    }

    async fn category_performance(&self) -> Result<Vec<CategoryChange>> {
        let sql = r#"
            WITH this_month AS (
                SELECT product_category, SUM(revenue_amount) AS revenue
                FROM {schema}.sales_orders
                WHERE order_date >= date_trunc('month', CURRENT_DATE)
                  AND order_date <= CURRENT_DATE
                GROUP BY product_category
            ),
            last_month AS (
                SELECT product_category, SUM(revenue_amount) AS revenue
                FROM {schema}.sales_orders
                WHERE order_date >= date_trunc('month', CURRENT_DATE) - INTERVAL '1 month'
                  AND order_date < date_trunc('month', CURRENT_DATE)
                GROUP BY product_category
            )
            SELECT
                COALESCE(t.product_category, l.product_category) AS category,
                COALESCE(t.revenue, 0)::float AS revenue,
                CASE
                    WHEN COALESCE(l.revenue, 0) > 0
                    THEN ((COALESCE(t.revenue, 0) - l.revenue) / l.revenue * 100)::float
                    ELSE 0
                END AS change
            FROM this_month t
            FULL OUTER JOIN last_month l ON t.product_category = l.product_category
            ORDER BY revenue DESC
        "#;
        let rows = CategoryRow::find_by_statement(self.stmt(sql))
            .all(get_connection())
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| CategoryChange {
                category: r.category.unwrap_or_default(),
                revenue: r.revenue,
                change: r.change.unwrap_or(0.0),
            })
            .collect())
    }

    async fn pipeline_stats(&self) -> Result<PipelineStats> {
        let sql = r#"
            SELECT
                COUNT(*)::int AS active,
                COALESCE(SUM(quoted_amount), 0)::float AS value,
                COALESCE(AVG(probability)::float, 0) AS avg_probability
            FROM {schema}.sales_quotations
            WHERE status::text = 'Active'
        "#;
        let row = PipelineRow::find_by_statement(self.stmt(sql))
            .one(get_connection())
            .await?;
        Ok(row
            .map(|r| PipelineStats {
                active: r.active as i64,
                value: r.value,
                avg_probability: r.avg_probability,
            })
            .unwrap_or_default())
    }

    async fn product_trends(&self) -> Result<(Vec<ProductTrend>, Vec<ProductTrend>)> {
        let sql = r#"
            WITH this_week AS (
                SELECT product_name, SUM(revenue_amount) AS revenue
                FROM {schema}.sales_orders
                WHERE order_date >= CURRENT_DATE - INTERVAL '7 days'
                  AND order_date <= CURRENT_DATE
                GROUP BY product_name
            ),
            last_week AS (
                SELECT product_name, SUM(revenue_amount) AS revenue
                FROM {schema}.sales_orders
                WHERE order_date >= CURRENT_DATE - INTERVAL '14 days'
                  AND order_date < CURRENT_DATE - INTERVAL '7 days'
                GROUP BY product_name
            )
            SELECT
                COALESCE(t.product_name, l.product_name) AS name,
                CASE
                    WHEN COALESCE(l.revenue, 0) > 0
                    THEN ((COALESCE(t.revenue, 0) - l.revenue) / l.revenue * 100)::float
                    ELSE 100
                END AS change,
                CASE
                    WHEN COALESCE(t.revenue, 0) > COALESCE(l.revenue, 0) THEN 'rising'
                    ELSE 'declining'
                END AS direction
            FROM this_week t
            FULL OUTER JOIN last_week l ON t.product_name = l.product_name
            WHERE COALESCE(t.revenue, 0) > 0 OR COALESCE(l.revenue, 0) > 0
            ORDER BY change DESC
        "#;
        let rows = ProductTrendRow::find_by_statement(self.stmt(sql))
            .all(get_connection())
            .await?;
        let trends = rows
            .into_iter()
            .map(|r| {
                (
                    ProductTrend {
                        name: r.name.unwrap_or_default(),
                        change: r.change.unwrap_or(0.0),
                    },
                    r.direction == "rising",
                )
            })
            .collect();
        Ok(split_product_trends(trends, 3))
    }
}

#[async_trait]
impl MetricsSource for PgMetricsSource {
    async fn fetch_metrics(&self) -> Result<DigestMetrics> {
        let (this_month, last_month) = self.monthly_comparison().await?;
        let (this_week, last_week) = self.weekly_comparison().await?;
        let yesterday = self.yesterday().await?;
        let top_products = self.top_products().await?;
        let top_customers = self.top_customers().await?;
        let category_performance = self.category_performance().await?;
        let top_salespeople = self.top_salespeople().await?;
        let pipeline = self.pipeline_stats().await?;
        let (rising_products, declining_products) = self.product_trends().await?;

        Ok(DigestMetrics {
            this_month,
            last_month,
            this_week,
            last_week,
            yesterday,
            top_products,
            top_customers,
            category_performance,
            top_salespeople,
            pipeline,
            rising_products,
            declining_products,
        })
    }
}

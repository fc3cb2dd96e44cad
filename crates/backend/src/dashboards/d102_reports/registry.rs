/// A canned, parameterless report over the analytics schema
#[derive(Debug, Clone, Copy)]
pub struct ReportDefinition {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub period: &'static str,
    /// Result columns in query order
    pub columns: &'static [&'static str],
    /// `{schema}` is replaced with the configured analytics schema
    pub sql: &'static str,
}

impl ReportDefinition {
    pub fn render_sql(&self, schema: &str) -> String {
        self.sql.replace("{schema}", schema)
    }
}

pub static REPORTS: [ReportDefinition; 5] = [
    ReportDefinition {
        slug: "sales-overview",
        title: "Sales Overview",
        description: "Revenue trends, order volume, and key metrics",
        period: "Last 6 months",
        columns: &["month", "revenue", "profit", "orders"],
        sql: r#"
            SELECT
                to_char(date_trunc('month', order_date), 'Mon YYYY') AS month,
                SUM(revenue_amount)::float AS revenue,
                SUM(gross_profit)::float AS profit,
                COUNT(*)::int AS orders
            FROM {schema}.sales_orders
            WHERE order_date >= CURRENT_DATE - INTERVAL '6 months'
            GROUP BY date_trunc('month', order_date)
            ORDER BY date_trunc('month', order_date)
        "#,
    },
    ReportDefinition {
        slug: "category-performance",
        title: "Category Performance",
        description: "Revenue and margin by product category",
        period: "Last 30 days",
        columns: &["product_category", "revenue", "profit", "orders", "margin_pct"],
        sql: r#"
            SELECT
                product_category,
                SUM(revenue_amount)::float AS revenue,
                SUM(gross_profit)::float AS profit,
                COUNT(*)::int AS orders,
                ROUND(SUM(gross_profit)::numeric / NULLIF(SUM(revenue_amount), 0) * 100, 1)::float AS margin_pct
            FROM {schema}.sales_orders
            WHERE order_date >= CURRENT_DATE - INTERVAL '30 days'
            GROUP BY product_category
            ORDER BY revenue DESC
        "#,
    },
    ReportDefinition {
        slug: "salesperson-ranking",
        title: "Salesperson Ranking",
        description: "Top performers and target achievement",
        period: "Last 30 days",
        columns: &["salesperson_name", "territory", "revenue", "orders", "avg_order_value"],
        sql: r#"
            SELECT
                s.salesperson_name,
                s.territory,
                SUM(o.revenue_amount)::float AS revenue,
                COUNT(*)::int AS orders,
                ROUND(AVG(o.revenue_amount)::numeric, 0)::float AS avg_order_value
            FROM {schema}.sales_orders o
            JOIN {schema}.salespeople s ON o.salesperson_id = s.salesperson_id
            WHERE o.order_date >= CURRENT_DATE - INTERVAL '30 days'
            GROUP BY s.salesperson_id, s.salesperson_name, s.territory
            ORDER BY revenue DESC
        "#,
    },
    ReportDefinition {
        slug: "product-analysis",
        title: "Product Analysis",
        description: "Best sellers and inventory status",
        period: "Last 30 days, top 15",
        columns: &["product_name", "product_category", "units_sold", "revenue", "unique_customers"],
        sql: r#"
            SELECT
                product_name,
                product_category,
                SUM(quantity)::int AS units_sold,
                SUM(revenue_amount)::float AS revenue,
                COUNT(DISTINCT customer_id)::int AS unique_customers
            FROM {schema}.sales_orders
            WHERE order_date >= CURRENT_DATE - INTERVAL '30 days'
            GROUP BY product_name, product_category
            ORDER BY revenue DESC
            LIMIT 15
        "#,
    },
    ReportDefinition {
        slug: "quotation-pipeline",
        title: "Quotation Pipeline",
        description: "Active quotes and conversion rates",
        period: "Last 90 days",
        columns: &["status", "quote_count", "total_value", "avg_probability"],
        sql: r#"
            SELECT
                status::text AS status,
                COUNT(*)::int AS quote_count,
                SUM(quoted_amount)::float AS total_value,
                ROUND(AVG(probability)::numeric * 100, 0)::float AS avg_probability
            FROM {schema}.sales_quotations
            WHERE quotation_date >= CURRENT_DATE - INTERVAL '90 days'
            GROUP BY status
            ORDER BY
                CASE status::text
                    WHEN 'Draft' THEN 1
                    WHEN 'Active' THEN 2
                    WHEN 'Completed' THEN 3
                    ELSE 4
                END
        "#,
    },
];

pub fn find(slug: &str) -> Option<&'static ReportDefinition> {
    REPORTS.iter().find(|r| r.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(REPORTS.len(), 5);
        assert_eq!(find("product-analysis").map(|r| r.title), Some("Product Analysis"));
        assert!(find("does-not-exist").is_none());
    }

    #[test]
    fn test_every_report_is_schema_qualified_select() {
        for report in REPORTS.iter() {
            let sql = report.render_sql("sales_insights");
            assert!(sql.trim_start().starts_with("SELECT"), "{}", report.slug);
            assert!(sql.contains("sales_insights."), "{}", report.slug);
            assert!(!sql.contains("{schema}"), "{}", report.slug);
        }
    }
}

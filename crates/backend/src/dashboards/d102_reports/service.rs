use std::sync::Arc;

use contracts::dashboards::d102_reports::{ReportColumn, ReportData, ReportSummary};

use super::registry::{self, ReportDefinition, REPORTS};
use crate::shared::format::humanize_column;
use crate::usecases::u101_ask_question::QueryRunner;

pub struct ReportsService {
    runner: Arc<dyn QueryRunner>,
    schema: String,
}

impl ReportsService {
    pub fn new(runner: Arc<dyn QueryRunner>, schema: impl Into<String>) -> Self {
        Self {
            runner,
            schema: schema.into(),
        }
    }

    pub fn list_reports(&self) -> Vec<ReportSummary> {
        REPORTS.iter().map(summary).collect()
    }

    /// `None` for an unknown slug. A failing query still yields a report, with `error` set.
    pub async fn run_report(&self, slug: &str) -> Option<ReportData> {
        let report = registry::find(slug)?;
        let columns = report
            .columns
            .iter()
            .map(|id| ReportColumn {
                id: id.to_string(),
                name: humanize_column(id),
            })
            .collect();

        let (rows, error) = match self.runner.run(&report.render_sql(&self.schema)).await {
            Ok(rows) => {
                tracing::info!("Report {} returned {} rows", slug, rows.len());
                (rows, None)
            }
            Err(e) => {
                tracing::error!("Report {} failed: {}", slug, e);
                (Vec::new(), Some("Failed to load report data".to_string()))
            }
        };

        Some(ReportData {
            slug: report.slug.to_string(),
            title: report.title.to_string(),
            period: report.period.to_string(),
            columns,
            rows,
            error,
        })
    }
}

fn summary(report: &ReportDefinition) -> ReportSummary {
    ReportSummary {
        slug: report.slug.to_string(),
        title: report.title.to_string(),
        description: report.description.to_string(),
        period: report.period.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u101_ask_question::query_executor::testing::RecordingRunner;
    use contracts::shared::query_row::QueryRow;

    #[test]
    fn test_list_reports() {
        let service =
            ReportsService::new(Arc::new(RecordingRunner::returning(vec![])), "sales_insights");
        let slugs: Vec<_> = service.list_reports().into_iter().map(|r| r.slug).collect();
        assert_eq!(
            slugs,
            vec![
                "sales-overview",
                "category-performance",
                "salesperson-ranking",
                "product-analysis",
                "quotation-pipeline",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_report() {
        let runner = Arc::new(RecordingRunner::returning(vec![QueryRow::new()
            .with("product_category", "Cables")
            .with("margin_pct", 21.5)]));
        let service = ReportsService::new(runner.clone(), "sales_insights");

        let data = service.run_report("category-performance").await.unwrap();
        assert_eq!(data.title, "Category Performance");
        assert_eq!(data.rows.len(), 1);
        assert!(data.error.is_none());
        assert_eq!(data.columns[4].name, "Margin Pct");
        assert!(runner.statements.lock().unwrap()[0].contains("FROM sales_insights.sales_orders"));
    }

    #[tokio::test]
    async fn test_unknown_and_failing_reports() {
        let service =
            ReportsService::new(Arc::new(RecordingRunner::failing("timeout")), "sales_insights");
        assert!(service.run_report("nope").await.is_none());

        let data = service.run_report("sales-overview").await.unwrap();
        assert!(data.rows.is_empty());
        assert_eq!(data.error.as_deref(), Some("Failed to load report data"));
    }
}

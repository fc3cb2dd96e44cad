use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, SecondsFormat, Timelike, Utc};
use contracts::dashboards::d100_daily_digest::{
    Chart, ChartPoint, ChartType, DailyDigest, DigestSection, Highlight,
};
use contracts::shared::trend::Trend;

use super::repository::{DigestMetrics, MetricsSource, RankedAccount};
use super::summarizer::Summarizer;
use crate::shared::format::{first_words, format_currency_compact, round_half_up};
use crate::shared::trend::change_text;

/// Builds the daily digest from one metrics snapshot
pub struct DigestGenerator {
    source: Arc<dyn MetricsSource>,
    summarizer: Arc<dyn Summarizer>,
    currency: String,
}

impl DigestGenerator {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        summarizer: Arc<dyn Summarizer>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            source,
            summarizer,
            currency: currency.into(),
        }
    }

    /// `now` carries the server's local offset; it drives the greeting and the date line
    pub async fn generate(&self, now: DateTime<FixedOffset>) -> Result<DailyDigest> {
        let started = std::time::Instant::now();
        let metrics = self.source.fetch_metrics().await?;
        let summary = self.summarizer.summarize(&metrics).await;
        let sections = build_sections(&metrics, &self.currency);

        tracing::info!(
            "Daily digest generated in {}ms ({} sections)",
            started.elapsed().as_millis(),
            sections.len()
        );

        Ok(DailyDigest {
            date: format_long_date(now),
            greeting: greeting(now.hour()).to_string(),
            summary,
            sections,
            generated_at: now
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 17 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

/// `Friday, 16 October 2026`
pub fn format_long_date(now: DateTime<FixedOffset>) -> String {
    now.format("%A, %-d %B %Y").to_string()
}

/// The seven digest sections, always in the same order
pub fn build_sections(metrics: &DigestMetrics, currency: &str) -> Vec<DigestSection> {
    let money = |v: f64| format_currency_compact(v, currency);

    vec![
        monthly_performance(metrics, &money),
        weekly_snapshot(metrics, &money),
        whats_selling(metrics, &money),
        category_trends(metrics, &money),
        top_customers(metrics, &money),
        team_performance(metrics, &money),
        pipeline(metrics, &money),
    ]
}

fn section(id: &str, title: &str, icon: &str, content: String) -> DigestSection {
    DigestSection {
        id: id.to_string(),
        title: title.to_string(),
        icon: icon.to_string(),
        content,
        highlights: None,
        chart: None,
    }
}

fn bar_chart(accounts: impl Iterator<Item = (String, f64)>) -> Chart {
    Chart {
        kind: ChartType::Bar,
        data: accounts
            .take(5)
            .map(|(name, value)| ChartPoint {
                label: first_words(&name, 2),
                value,
            })
            .collect(),
    }
}

fn monthly_performance(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let revenue = change_text(metrics.this_month.revenue, metrics.last_month.revenue);
    let orders = change_text(
        metrics.this_month.orders as f64,
        metrics.last_month.orders as f64,
    );
    let position = if revenue.trend == Trend::Up { "ahead" } else { "behind" };

    let mut s = section(
        "monthly-performance",
        "Monthly Performance",
        "📊",
        format!(
            "You're {} last month by {:.0}%. {} orders placed so far this month with an average order value of {}.",
            position,
            revenue.change.abs(),
            metrics.this_month.orders,
            money(metrics.this_month.avg_order)
        ),
    );
    s.highlights = Some(vec![
        Highlight::with_change(
            "Revenue",
            money(metrics.this_month.revenue),
            revenue.change,
            revenue.trend,
        ),
        Highlight::with_change(
            "Orders",
            metrics.this_month.orders.to_string(),
            orders.change,
            orders.trend,
        ),
        Highlight::plain("Avg Order", money(metrics.this_month.avg_order)),
    ]);
    s
}

fn weekly_snapshot(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let revenue = change_text(metrics.this_week.revenue, metrics.last_week.revenue);
    let movement = if revenue.trend == Trend::Up { "an improvement" } else { "a dip" };

    let mut s = section(
        "weekly-snapshot",
        "This Week",
        "📈",
        format!(
            "This week brought in {} from {} orders, {} of {:.0}% from last week.",
            money(metrics.this_week.revenue),
            metrics.this_week.orders,
            movement,
            revenue.change.abs()
        ),
    );
    s.highlights = Some(vec![
        Highlight::with_change(
            "Week Revenue",
            money(metrics.this_week.revenue),
            revenue.change,
            revenue.trend,
        ),
        Highlight::plain("Yesterday", money(metrics.yesterday.revenue)),
    ]);
    s
}

fn whats_selling(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let top = metrics.top_products.first();
    let growing = metrics.category_performance.iter().find(|c| c.change > 0.0);

    let mut s = section(
        "whats-selling",
        "What's Selling",
        "🔥",
        format!(
            "{} leads this month with {} in sales. {} is the fastest growing category at +{:.0}%.",
            top.map(|p| p.name.as_str()).unwrap_or("No data"),
            money(top.map(|p| p.revenue).unwrap_or(0.0)),
            growing.map(|c| c.category.as_str()).unwrap_or("No category"),
            growing.map(|c| c.change).unwrap_or(0.0)
        ),
    );
    s.chart = Some(bar_chart(
        metrics
            .top_products
            .iter()
            .map(|p| (p.name.clone(), p.revenue)),
    ));
    s
}

fn category_trends(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let categories = &metrics.category_performance;
    let content = if categories.is_empty() {
        "No category data available.".to_string()
    } else {
        format!(
            "{} categories are growing, {} are declining compared to last month.",
            categories.iter().filter(|c| c.change > 0.0).count(),
            categories.iter().filter(|c| c.change < 0.0).count()
        )
    };

    let mut s = section("category-trends", "Category Trends", "📦", content);
    s.highlights = Some(
        categories
            .iter()
            .take(4)
            .map(|c| {
                Highlight::with_change(
                    first_words(&c.category, 1),
                    money(c.revenue),
                    round_half_up(c.change),
                    Trend::from_change(c.change),
                )
            })
            .collect(),
    );
    s
}

fn leader_line(leader: Option<&RankedAccount>) -> (&str, f64, i64) {
    leader
        .map(|a| (a.name.as_str(), a.revenue, a.orders))
        .unwrap_or(("N/A", 0.0, 0))
}

fn top_customers(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let (name, revenue, orders) = leader_line(metrics.top_customers.first());

    let mut s = section(
        "top-customers",
        "Top Customers",
        "👥",
        format!(
            "{} leads with {} from {} orders this month.",
            name,
            money(revenue),
            orders
        ),
    );
    s.chart = Some(bar_chart(
        metrics
            .top_customers
            .iter()
            .map(|c| (c.name.clone(), c.revenue)),
    ));
    s
}

fn team_performance(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let (name, revenue, orders) = leader_line(metrics.top_salespeople.first());

    let mut s = section(
        "team-performance",
        "Sales Team",
        "🏆",
        format!(
            "{} is leading the team with {} in sales from {} orders.",
            name,
            money(revenue),
            orders
        ),
    );
    s.highlights = Some(
        metrics
            .top_salespeople
            .iter()
            .take(3)
            .map(|p| Highlight::plain(first_words(&p.name, 1), money(p.revenue)))
            .collect(),
    );
    s
}

fn pipeline(metrics: &DigestMetrics, money: &dyn Fn(f64) -> String) -> DigestSection {
    let stats = &metrics.pipeline;
    let probability = format!("{:.0}%", stats.avg_probability * 100.0);

    let mut s = section(
        "pipeline",
        "Pipeline",
        "🎯",
        format!(
            "{} active quotations worth {} with an average close probability of {}.",
            stats.active,
            money(stats.value),
            probability
        ),
    );
    s.highlights = Some(vec![
        Highlight::plain("Active Quotes", stats.active.to_string()),
        Highlight::plain("Pipeline Value", money(stats.value)),
        Highlight::plain("Avg Probability", probability),
    ]);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d100_daily_digest::repository::{
        CategoryChange, MonthTotals, PeriodTotals, PipelineStats, ProductSales,
    };
    use crate::dashboards::d100_daily_digest::summarizer::TemplateSummarizer;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct StaticMetrics(DigestMetrics);

    #[async_trait]
    impl MetricsSource for StaticMetrics {
        async fn fetch_metrics(&self) -> Result<DigestMetrics> {
            Ok(self.0.clone())
        }
    }

    struct BrokenMetrics;

    #[async_trait]
    impl MetricsSource for BrokenMetrics {
        async fn fetch_metrics(&self) -> Result<DigestMetrics> {
            anyhow::bail!("connection refused")
        }
    }

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 16, hour, 30, 0)
            .unwrap()
    }

    fn generator(metrics: DigestMetrics) -> DigestGenerator {
        DigestGenerator::new(
            Arc::new(StaticMetrics(metrics)),
            Arc::new(TemplateSummarizer::new("MYR")),
            "MYR",
        )
    }

    #[tokio::test]
    async fn test_zero_metrics_still_yield_seven_sections() {
        let digest = generator(DigestMetrics::default()).generate(at(9)).await.unwrap();

        let ids: Vec<_> = digest.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "monthly-performance",
                "weekly-snapshot",
                "whats-selling",
                "category-trends",
                "top-customers",
                "team-performance",
                "pipeline",
            ]
        );
        assert_eq!(digest.sections[3].content, "No category data available.");
        assert_eq!(
            digest.sections[2].content,
            "No data leads this month with MYR 0 in sales. No category is the fastest growing category at +0%."
        );
        assert_eq!(digest.greeting, "Good morning");
        assert_eq!(digest.date, "Friday, 16 October 2026");
        assert_eq!(digest.generated_at, "2026-10-16T01:30:00.000Z");
    }

    #[tokio::test]
    async fn test_metrics_failure_propagates() {
        let generator = DigestGenerator::new(
            Arc::new(BrokenMetrics),
            Arc::new(TemplateSummarizer::new("MYR")),
            "MYR",
        );
        assert!(generator.generate(at(9)).await.is_err());
    }

    #[test]
    fn test_greeting_boundaries() {
        assert_eq!(greeting(0), "Good morning");
        assert_eq!(greeting(11), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(16), "Good afternoon");
        assert_eq!(greeting(17), "Good evening");
        assert_eq!(greeting(23), "Good evening");
    }

    #[test]
    fn test_section_content() {
        let metrics = DigestMetrics {
            this_month: MonthTotals {
                revenue: 1_500_000.0,
                orders: 60,
                profit: 0.0,
                avg_order: 25_000.0,
            },
            last_month: MonthTotals {
                revenue: 1_000_000.0,
                orders: 80,
                profit: 0.0,
                avg_order: 12_500.0,
            },
            this_week: PeriodTotals {
                revenue: 90_000.0,
                orders: 9,
            },
            last_week: PeriodTotals {
                revenue: 100_000.0,
                orders: 10,
            },
            top_products: vec![ProductSales {
                name: "Copper Cable 2.5mm Roll".into(),
                category: "Cables".into(),
                revenue: 300_000.0,
                units: 500,
            }],
            category_performance: vec![
                CategoryChange {
                    category: "Power Cables".into(),
                    revenue: 800_000.0,
                    change: -12.5,
                },
                CategoryChange {
                    category: "Lighting".into(),
                    revenue: 400_000.0,
                    change: 33.6,
                },
            ],
            pipeline: PipelineStats {
                active: 12,
                value: 450_000.0,
                avg_probability: 0.62,
            },
            ..Default::default()
        };
        let sections = build_sections(&metrics, "MYR");

        assert_eq!(
            sections[0].content,
            "You're ahead last month by 50%. 60 orders placed so far this month with an average order value of MYR 25K."
        );
        let highlights = sections[0].highlights.as_ref().unwrap();
        assert_eq!(highlights[0].value, "MYR 1.5M");
        assert_eq!(highlights[1].trend, Some(Trend::Down));

        assert_eq!(
            sections[1].content,
            "This week brought in MYR 90K from 9 orders, a dip of 10% from last week."
        );
        assert_eq!(
            sections[2].content,
            "Copper Cable 2.5mm Roll leads this month with MYR 300K in sales. Lighting is the fastest growing category at +34%."
        );
        let chart = sections[2].chart.as_ref().unwrap();
        assert_eq!(chart.data[0].label, "Copper Cable");

        assert_eq!(
            sections[3].content,
            "1 categories are growing, 1 are declining compared to last month."
        );
        let categories = sections[3].highlights.as_ref().unwrap();
        assert_eq!(categories[0].label, "Power");
        assert_eq!(categories[0].change, Some(-12.0));
        assert_eq!(categories[0].trend, Some(Trend::Down));

        assert_eq!(
            sections[6].content,
            "12 active quotations worth MYR 450K with an average close probability of 62%."
        );
    }
}

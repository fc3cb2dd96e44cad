use std::sync::Arc;

use async_trait::async_trait;
use contracts::shared::trend::Trend;

use super::repository::DigestMetrics;
use crate::shared::format::format_currency_compact;
use crate::shared::llm::{ChatMessage, CompletionOptions, LlmProvider};
use crate::shared::trend::change_text;

/// Writes the narrative paragraph at the top of the digest. Never fails.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, metrics: &DigestMetrics) -> String;
}

/// Fixed sentence built from the monthly numbers
pub struct TemplateSummarizer {
    currency: String,
}

impl TemplateSummarizer {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn render(&self, metrics: &DigestMetrics) -> String {
        let mom = change_text(metrics.this_month.revenue, metrics.last_month.revenue);
        let direction = if mom.trend == Trend::Up { "up" } else { "down" };
        let top_product = metrics
            .top_products
            .first()
            .map(|p| p.name.as_str())
            .unwrap_or("N/A");
        let top_customer = metrics
            .top_customers
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("N/A");

        format!(
            "This month's revenue is {} {:.0}% compared to last month, with {} orders totaling {}. \
             {} is leading product sales, while {} is the top customer this month.",
            direction,
            mom.change.abs(),
            metrics.this_month.orders,
            format_currency_compact(metrics.this_month.revenue, &self.currency),
            top_product,
            top_customer
        )
    }
}

#[async_trait]
impl Summarizer for TemplateSummarizer {
    async fn summarize(&self, metrics: &DigestMetrics) -> String {
        self.render(metrics)
    }
}

/// Model-written summary; falls back to the template when the provider fails or replies blank
pub struct LlmSummarizer {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
    fallback: TemplateSummarizer,
    currency: String,
}

impl LlmSummarizer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        temperature: f32,
        max_tokens: u32,
        currency: impl Into<String>,
    ) -> Self {
        let currency = currency.into();
        Self {
            provider,
            options: CompletionOptions::text(temperature, max_tokens),
            fallback: TemplateSummarizer::new(currency.clone()),
            currency,
        }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, metrics: &DigestMetrics) -> String {
        let prompt = summary_prompt(metrics, &self.currency);
        match self
            .provider
            .chat_completion(vec![ChatMessage::user(prompt)], &self.options)
            .await
        {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                tracing::warn!(
                    "Digest summary from {} failed, using template: {}",
                    self.provider.provider_name(),
                    e
                );
                self.fallback.render(metrics)
            }
        }
    }
}

/// Analyst prompt for the daily summary
pub fn summary_prompt(metrics: &DigestMetrics, currency: &str) -> String {
    let money = |v: f64| format_currency_compact(v, currency);
    let mom = change_text(metrics.this_month.revenue, metrics.last_month.revenue);
    let top_product = metrics.top_products.first();
    let growing = metrics.category_performance.iter().find(|c| c.change > 0.0);
    let trend_list = |items: &[super::repository::ProductTrend]| {
        if items.is_empty() {
            "N/A".to_string()
        } else {
            items
                .iter()
                .map(|p| format!("{} ({:+.0}%)", p.name, p.change))
                .collect::<Vec<_>>()
                .join(", ")
        }
    };

    let mut prompt = String::from(
        "You are a business analyst writing a brief daily digest for a sales team. \
         Write 2-3 sentences summarizing the key insights from this data. \
         Be specific with numbers. Use a friendly, professional tone.\n\nData:\n",
    );
    prompt.push_str(&format!(
        "- This month revenue: {} ({} orders)\n",
        money(metrics.this_month.revenue),
        metrics.this_month.orders
    ));
    prompt.push_str(&format!(
        "- Last month revenue: {} ({} orders)\n",
        money(metrics.last_month.revenue),
        metrics.last_month.orders
    ));
    prompt.push_str(&format!("- Month-over-month change: {}\n", mom.text));
    prompt.push_str(&format!(
        "- This week revenue: {} vs last week {}\n",
        money(metrics.this_week.revenue),
        money(metrics.last_week.revenue)
    ));
    prompt.push_str(&format!(
        "- Top product: {} ({})\n",
        top_product.map(|p| p.name.as_str()).unwrap_or("N/A"),
        money(top_product.map(|p| p.revenue).unwrap_or(0.0))
    ));
    prompt.push_str(&format!(
        "- Top customer: {}\n",
        metrics
            .top_customers
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "- Top category growth: {} ({:.0}% up)\n",
        growing.map(|c| c.category.as_str()).unwrap_or("N/A"),
        growing.map(|c| c.change).unwrap_or(0.0)
    ));
    prompt.push_str(&format!(
        "- Rising products this week: {}\n",
        trend_list(&metrics.rising_products)
    ));
    prompt.push_str(&format!(
        "- Declining products this week: {}\n",
        trend_list(&metrics.declining_products)
    ));
    prompt.push_str(&format!(
        "- Active pipeline: {} quotes worth {}\n\n",
        metrics.pipeline.active,
        money(metrics.pipeline.value)
    ));
    prompt.push_str(
        "Write a 2-3 sentence summary highlighting the most important trends and opportunities.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d100_daily_digest::repository::{
        MonthTotals, ProductSales, ProductTrend, RankedAccount,
    };
    use crate::shared::llm::testing::ScriptedProvider;

    fn metrics() -> DigestMetrics {
        DigestMetrics {
            this_month: MonthTotals {
                revenue: 120_000.0,
                orders: 48,
                profit: 30_000.0,
                avg_order: 2_500.0,
            },
            last_month: MonthTotals {
                revenue: 100_000.0,
                orders: 40,
                profit: 25_000.0,
                avg_order: 2_500.0,
            },
            top_products: vec![ProductSales {
                name: "Copper Cable 2.5mm".into(),
                category: "Cables".into(),
                revenue: 20_000.0,
                units: 120,
            }],
            top_customers: vec![RankedAccount {
                name: "Aurora Builders".into(),
                revenue: 15_000.0,
                orders: 6,
            }],
            rising_products: vec![ProductTrend {
                name: "LED Panel".into(),
                change: 45.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_template_summary() {
        let summary = TemplateSummarizer::new("MYR").render(&metrics());
        assert_eq!(
            summary,
            "This month's revenue is up 20% compared to last month, with 48 orders totaling MYR 120K. \
             Copper Cable 2.5mm is leading product sales, while Aurora Builders is the top customer this month."
        );
    }

    #[test]
    fn test_template_summary_without_data() {
        let summary = TemplateSummarizer::new("MYR").render(&DigestMetrics::default());
        assert_eq!(
            summary,
            "This month's revenue is down 0% compared to last month, with 0 orders totaling MYR 0. \
             N/A is leading product sales, while N/A is the top customer this month."
        );
    }

    #[test]
    fn test_summary_prompt_mentions_trends() {
        let prompt = summary_prompt(&metrics(), "MYR");
        assert!(prompt.contains("- Month-over-month change: +20.0%"));
        assert!(prompt.contains("- Rising products this week: LED Panel (+45%)"));
        assert!(prompt.contains("- Declining products this week: N/A"));
    }

    #[tokio::test]
    async fn test_llm_summary_and_fallback() {
        let provider = Arc::new(ScriptedProvider::replying("  Strong month so far.  "));
        let summarizer = LlmSummarizer::new(provider.clone(), 0.7, 150, "MYR");
        assert_eq!(summarizer.summarize(&metrics()).await, "Strong month so far.");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].1.max_tokens, Some(150));
        assert!(!calls[0].1.json_response);
        drop(calls);

        let failing =
            LlmSummarizer::new(Arc::new(ScriptedProvider::failing("boom")), 0.7, 150, "MYR");
        let expected = TemplateSummarizer::new("MYR").render(&metrics());
        assert_eq!(failing.summarize(&metrics()).await, expected);

        let empty = LlmSummarizer::new(Arc::new(ScriptedProvider::replying("")), 0.7, 150, "MYR");
        assert_eq!(empty.summarize(&metrics()).await, expected);
    }
}

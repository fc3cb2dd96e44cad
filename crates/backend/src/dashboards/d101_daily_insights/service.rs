use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use contracts::dashboards::d101_daily_insights::{Insight, InsightCategory};
use contracts::shared::trend::Trend;

use super::repository::{
    ActivePipeline, InsightSource, TopPerformer, TrendingCategory, WeeklyRevenue, YesterdayOrders,
};
use crate::shared::format::{format_currency_whole, round_half_up};

/// Headline cards for the pulse page
pub struct InsightsService {
    source: Arc<dyn InsightSource>,
    currency: String,
}

impl InsightsService {
    pub fn new(source: Arc<dyn InsightSource>, currency: impl Into<String>) -> Self {
        Self {
            source,
            currency: currency.into(),
        }
    }

    /// Five cards in a fixed order; a card whose lookup fails is logged and left out
    pub async fn generate_daily_insights(&self) -> Vec<Insight> {
        let currency = self.currency.as_str();

        let cards = [
            card("revenue-trend", self.source.weekly_revenue(), |d| {
                revenue_insight(d, currency)
            })
            .await,
            card("daily-orders", self.source.yesterday_orders(), |d| {
                orders_insight(d, currency)
            })
            .await,
            card("top-performer", self.source.top_performer(), |d| {
                top_performer_insight(d, currency)
            })
            .await,
            card(
                "trending-category",
                self.source.trending_category(),
                trending_category_insight,
            )
            .await,
            card("pipeline", self.source.active_pipeline(), |d| {
                pipeline_insight(d, currency)
            })
            .await,
        ];

        cards.into_iter().flatten().collect()
    }
}

async fn card<T, F, B>(id: &str, lookup: F, build: B) -> Option<Insight>
where
    F: Future<Output = Result<Option<T>>>,
    B: FnOnce(T) -> Insight,
{
    match lookup.await {
        Ok(data) => data.map(build),
        Err(e) => {
            tracing::warn!("Error generating {} insight: {}", id, e);
            None
        }
    }
}

fn up_or_down(change: f64) -> Trend {
    if change >= 0.0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

pub fn revenue_insight(data: WeeklyRevenue, currency: &str) -> Insight {
    let change = if data.last_week > 0.0 {
        (data.this_week - data.last_week) / data.last_week * 100.0
    } else {
        0.0
    };
    let direction = if change >= 0.0 { "up" } else { "down" };

    Insight {
        id: "revenue-trend".to_string(),
        title: format!("Revenue {} {:.1}% vs last week", direction, change.abs()),
        value: format_currency_whole(data.this_week, currency),
        change: Some(round_half_up(change * 10.0) / 10.0),
        trend: Some(up_or_down(change)),
        category: InsightCategory::Revenue,
        subtitle: None,
        sparkline_data: Some(data.daily),
    }
}

pub fn orders_insight(data: YesterdayOrders, currency: &str) -> Insight {
    Insight {
        id: "daily-orders".to_string(),
        title: format!("{} orders yesterday", data.orders),
        value: format_currency_whole(data.revenue, currency),
        change: None,
        trend: None,
        category: InsightCategory::Orders,
        subtitle: Some("Prior day performance".to_string()),
        sparkline_data: None,
    }
}

pub fn top_performer_insight(data: TopPerformer, currency: &str) -> Insight {
    Insight {
        id: "top-performer".to_string(),
        title: format!("Top Performer: {}", data.name),
        value: format!("{} {:.1}K", currency, data.revenue / 1000.0),
        change: None,
        trend: None,
        category: InsightCategory::Salesperson,
        subtitle: Some(format!("{} orders in the last 30 days", data.orders)),
        sparkline_data: None,
    }
}

pub fn trending_category_insight(data: TrendingCategory) -> Insight {
    let sign = if data.change_pct >= 0.0 { "+" } else { "" };
    Insight {
        id: "trending-category".to_string(),
        title: format!("{} trending", data.category),
        value: format!("{}{:.0}% orders", sign, data.change_pct),
        change: Some(round_half_up(data.change_pct)),
        trend: Some(up_or_down(data.change_pct)),
        category: InsightCategory::Product,
        subtitle: None,
        sparkline_data: None,
    }
}

pub fn pipeline_insight(data: ActivePipeline, currency: &str) -> Insight {
    Insight {
        id: "pipeline".to_string(),
        title: format!("{} active quotations", data.active),
        value: format!("{} {:.0}K pipeline", currency, data.value / 1000.0),
        change: None,
        trend: None,
        category: InsightCategory::Pipeline,
        subtitle: Some("Awaiting customer decision".to_string()),
        sparkline_data: None,
    }
}

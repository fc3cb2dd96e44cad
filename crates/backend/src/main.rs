pub mod api;
pub mod dashboards;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use std::sync::Arc;

use crate::api::state::{AppState, DigestCachePolicy};
use crate::dashboards::d100_daily_digest::{
    DigestGenerator, LlmSummarizer, PgMetricsSource, Summarizer, TemplateSummarizer,
};
use crate::dashboards::d101_daily_insights::{InsightsService, PgInsightSource};
use crate::dashboards::d102_reports::ReportsService;
use crate::shared::llm::openai_provider::OpenAiProvider;
use crate::shared::llm::LlmProvider;
use crate::usecases::u101_ask_question::{
    AskExecutor, PgContextLookup, PgQueryRunner, QueryExecutor, QueryRunner, SchemaContextCache,
    SqlGenerator, SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    // .env is optional
    let dotenv = dotenvy::dotenv().ok();

    let log_file = system::tracing::initialize()?;
    tracing::info!("Logging to {}", log_file.display());
    if let Some(path) = dotenv {
        tracing::info!("Loaded environment from {}", path.display());
    }

    let config = shared::config::load_config()?;

    shared::data::db::initialize_database(&config.database, &config.ask.schema)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    // Language model is optional: without a key the ask endpoint explains
    // how to configure it and the digest uses the template summary
    let provider: Option<Arc<dyn LlmProvider>> = OpenAiProvider::from_config(&config.llm)
        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>);
    match &provider {
        Some(p) => tracing::info!("LLM provider: {} ({})", p.provider_name(), config.llm.model),
        None => tracing::warn!("OPENAI_API_KEY is not set, AI Q&A is disabled"),
    }

    let schema = config.ask.schema.clone();
    let runner: Arc<dyn QueryRunner> =
        Arc::new(PgQueryRunner::new(config.ask.read_only_transaction));

    let context_cache = Arc::new(SchemaContextCache::new(
        Arc::new(PgContextLookup::new(schema.clone())),
        Arc::new(SystemClock),
        chrono::Duration::seconds(config.ask.context_ttl_secs as i64),
    ));
    let ask = Arc::new(AskExecutor::new(
        Arc::new(SqlGenerator::new(context_cache, provider.clone(), schema.clone())),
        Arc::new(QueryExecutor::new(runner.clone(), config.ask.default_limit)),
    ));

    let summarizer: Arc<dyn Summarizer> = match provider {
        Some(provider) => Arc::new(LlmSummarizer::new(
            provider,
            config.llm.summary_temperature as f32,
            config.llm.summary_max_tokens,
            config.digest.currency.clone(),
        )),
        None => Arc::new(TemplateSummarizer::new(config.digest.currency.clone())),
    };
    let digest = Arc::new(DigestGenerator::new(
        Arc::new(PgMetricsSource::new(schema.clone())),
        summarizer,
        config.digest.currency.clone(),
    ));

    let state = AppState {
        ask,
        digest,
        digest_cache: DigestCachePolicy {
            revalidate_secs: config.digest.revalidate_secs,
        },
        insights: Arc::new(InsightsService::new(
            Arc::new(PgInsightSource::new(schema.clone())),
            config.digest.currency.clone(),
        )),
        reports: Arc::new(ReportsService::new(runner, schema)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server address: {e}"))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

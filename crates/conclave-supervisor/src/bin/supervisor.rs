//! The supervisor process: wires up the intent router, the illustrative
//! demo plan table, an in-memory session store, and an `McpClient`
//! pointed at one or more specialist endpoints, then serves `/chat` over
//! HTTP. Styled after the teacher's presentation-layer `main.rs`
//! (clap-derived CLI, `env` fallbacks, axum server bound via `TcpListener`).

use clap::Parser;
use conclave_client::descriptor_cache::DescriptorCache;
use conclave_client::McpClient;
use conclave_supervisor::demo_plan::default_plan_table;
use conclave_supervisor::http::{app, AppState};
use conclave_supervisor::intent_router::IntentRouter;
use conclave_supervisor::orchestrator::{Orchestrator, OrchestratorConfig};
use conclave_supervisor::rate_limit::SessionRateLimiter;
use conclave_supervisor::session_store::{CompactionConfig, InMemorySessionStore};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "conclave-supervisor")]
struct Cli {
    #[arg(long, env = "CONCLAVE_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "CONCLAVE_SUPERVISOR_PORT", default_value = "8800")]
    port: u16,

    /// MCP endpoints to discover at startup, e.g.
    /// `http://127.0.0.1:8801`. Repeatable.
    #[arg(long = "specialist", env = "CONCLAVE_SPECIALISTS", value_delimiter = ',', default_value = "http://127.0.0.1:8801")]
    specialists: Vec<String>,

    #[arg(long, env = "CONCLAVE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// When set, `/chat*` requests must carry a matching `X-API-Key`
    /// header. Unset means the check is disabled.
    #[arg(long, env = "SUPERVISOR_API_KEY")]
    api_key: Option<String>,

    /// Chat turns allowed per session per minute. Zero disables the
    /// limiter entirely.
    #[arg(long, env = "CONCLAVE_RATE_LIMIT_PER_MINUTE", default_value = "60")]
    rate_limit_per_minute: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_level)).init();

    let descriptors = Arc::new(DescriptorCache::new());
    let client = Arc::new(McpClient::new(descriptors));

    for endpoint in &cli.specialists {
        client.discover(endpoint, endpoint).await;
    }

    let orchestrator = Orchestrator::new(
        IntentRouter::default(),
        default_plan_table(),
        client,
        Arc::new(InMemorySessionStore::new(CompactionConfig::default())),
        OrchestratorConfig::default(),
    );

    let rate_limiter = (cli.rate_limit_per_minute > 0).then(|| SessionRateLimiter::new(cli.rate_limit_per_minute));
    let state = Arc::new(AppState { orchestrator, api_key: cli.api_key, rate_limiter });
    let router = app(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    tracing::info!(%addr, "supervisor listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

//! # conclave-demo-tools
//!
//! The illustrative specialist bundled with this repo: a handful of toy
//! CVSS/EPSS/KEV/exploit/recon/risk-scoring tools wired through the real
//! `conclave-server` registry and dispatch pipeline, so the pipeline
//! itself — caching, approval gating, normalization, audit — runs for
//! real even though the scores it computes are synthetic. No
//! `ResolutionRule`s are registered: none of these tools have a missing
//! field worth looking up from another tool.

mod tools;

use clap::Parser;
use conclave_cache::InMemoryCache;
use conclave_core::error::CoreError;
use conclave_server::dispatch::Dispatcher;
use conclave_server::registry::ToolRegistry;
use conclave_server::resolver::{EntityLookup, ParameterResolver};
use conclave_server::transport::http::{app, AppState};
use serde_json::Value;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "conclave-demo-tools")]
struct Cli {
    #[arg(long, env = "CONCLAVE_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "CONCLAVE_DEMO_TOOLS_PORT", default_value = "8801")]
    port: u16,

    /// Secret used to sign/verify approval tokens for mutating tools
    /// (e.g. `ports_scan`). In a real deployment this comes from a
    /// secret store, not a CLI flag with a default.
    #[arg(long, env = "CONCLAVE_APPROVAL_SECRET", default_value = "demo-only-insecure-secret")]
    approval_secret: String,

    #[arg(long, env = "CONCLAVE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

struct NoLookup;

#[async_trait::async_trait]
impl EntityLookup for NoLookup {
    async fn call(&self, tool_name: &str, _args: Value) -> Result<Value, CoreError> {
        Err(CoreError::Internal(format!("no resolution rule should ever call '{tool_name}' on this specialist")))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_level)).init();

    let registry = Arc::new(ToolRegistry::new());
    registry.register(Arc::new(tools::CvssLookup));
    registry.register(Arc::new(tools::EpssLookup));
    registry.register(Arc::new(tools::KevLookup));
    registry.register(Arc::new(tools::ExploitLookup));
    registry.register(Arc::new(tools::PortsScan));
    registry.register(Arc::new(tools::RiskEngine));

    let dispatcher = Dispatcher {
        registry,
        cache: Arc::new(InMemoryCache::new(1024)),
        resolver: Arc::new(ParameterResolver::new(Vec::new())),
        lookup: Arc::new(NoLookup),
        approval_secret: cli.approval_secret,
        server_name: "conclave-demo-tools".to_string(),
        tool_version: "1".to_string(),
    };

    let state = Arc::new(AppState { dispatcher, service_name: Arc::from("conclave-demo-tools") });
    let router = app(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    tracing::info!(%addr, "demo specialist listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

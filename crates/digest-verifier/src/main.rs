mod api;
mod config;
mod error;
mod provider;
mod server;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use digest_core::redis::RedisCache;
use digest_core::summary_cache::SummaryCache;

use config::Config;
use server::DigestVerifierServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to stderr (stdout is reserved for MCP JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting digest-verifier MCP server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        redis = config.redis_url.is_some(),
        model = %config.llm.model,
        llm_enabled = config.llm.enabled,
        cache_ttl_secs = config.llm.cache_ttl_secs,
        fixtures_dir = %config.evals.fixtures_dir.display(),
        eval_now = %config.evals.now,
        "configuration loaded"
    );

    // 2. Connect to Redis (optional, the summary cache misses without it)
    let redis = RedisCache::new(config.redis_url.as_deref());
    match redis.ping().await {
        Ok(()) => info!("redis connected"),
        Err(e) => info!(reason = %e, "redis unavailable, running without summary cache"),
    }
    let cache = SummaryCache::new(redis, config.llm.cache_ttl_secs);

    // 3. Build MCP server and serve on stdio
    let server = DigestVerifierServer::new(config, cache);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}

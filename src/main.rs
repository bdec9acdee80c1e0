//! Wayfarer Content Service
//!
//! Travel content RPC backend with a cache-aside top-destinations read path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Wayfarer Content Service                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────────┐    ┌───────────┐  │
//! │  │  gRPC        │───▶│ TopDestinations  │───▶│  Redis    │  │
//! │  │  Handler     │    │ Cache            │    │  (cache)  │  │
//! │  └──────────────┘    │                  │    └───────────┘  │
//! │                      │        miss ─────┼───▶┌───────────┐  │
//! │                      └──────────────────┘    │ Postgres  │  │
//! │                                              │ (ranking) │  │
//! │                                              └───────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wayfarer::adapters::{PostgresRankingSource, RedisCacheStore};
use wayfarer::cache::{CacheConfig, TopDestinationsCache};
use wayfarer::domain::{CacheStore, RankingSource};
use wayfarer::error::{Error, Result};
use wayfarer::metrics;
use wayfarer::rpc::{self, ContentService};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Wayfarer content service - cache-aside top destinations over gRPC
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Postgres host
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    db_host: String,

    /// Postgres port
    #[arg(long, env = "DB_PORT", default_value = "5432")]
    db_port: u16,

    /// Postgres user
    #[arg(long, env = "DB_USER", default_value = "postgres")]
    db_user: String,

    /// Postgres database name
    #[arg(long, env = "DB_NAME", default_value = "content")]
    db_name: String,

    /// Postgres password
    #[arg(long, env = "DB_PASSWORD", default_value = "")]
    db_password: String,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// gRPC server bind address
    #[arg(long, env = "RPC_ADDR", default_value = "0.0.0.0:50052")]
    rpc_addr: String,

    /// Cache entry lifetime in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "3600")]
    cache_ttl_secs: u64,

    /// Number of destinations returned by the ranking query
    #[arg(long, env = "RANKING_LIMIT", default_value = "10")]
    ranking_limit: i64,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    info!("Starting Wayfarer content service");
    info!("  Postgres: {}:{}/{}", args.db_host, args.db_port, args.db_name);
    info!("  Redis: {}", args.redis_url);
    info!("  Cache TTL: {}s", args.cache_ttl_secs);
    info!("  Ranking limit: {}", args.ranking_limit);

    metrics::init();

    // Long-lived connection pool, created once and shared across requests
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&args.database_url())
        .await
        .map_err(|e| {
            error!("Failed to connect to Postgres: {}", e);
            Error::Config(format!("Postgres connection failed: {}", e))
        })?;

    info!("Connected to Postgres");

    let source = Arc::new(PostgresRankingSource::new(pool, args.ranking_limit));

    // Long-lived Redis connection manager, same lifetime as the process
    let store = RedisCacheStore::connect(&args.redis_url).await.map_err(|e| {
        error!("Failed to connect to Redis: {}", e);
        e
    })?;

    info!("Connected to Redis");

    // Best-effort health checks at startup; degraded collaborators are
    // logged, not fatal
    if let Err(e) = source.health_check().await {
        error!("Postgres health check failed: {}", e);
        error!("Continuing anyway - ranking queries may fail");
    }
    if let Err(e) = store.health_check().await {
        error!("Redis health check failed: {}", e);
        error!("Continuing anyway - reads will fall through to Postgres");
    }

    let cache_config = CacheConfig {
        ttl: Duration::from_secs(args.cache_ttl_secs),
        coalesce_misses: true,
    };
    let cache = TopDestinationsCache::new(
        cache_config,
        Arc::new(store) as Arc<dyn CacheStore>,
        source as Arc<dyn RankingSource>,
    );

    // Start health server
    let health_addr = args.health_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics_addr = args.metrics_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr).await {
            error!("Metrics server error: {}", e);
        }
    });

    // Serve gRPC until shutdown
    let rpc_addr: SocketAddr = args
        .rpc_addr
        .parse()
        .map_err(|e| Error::Config(format!("Invalid RPC address: {}", e)))?;

    rpc::serve(rpc_addr, ContentService::new(cache)).await?;

    info!("Service shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("h2=warn".parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: &str) -> Result<()> {
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    async fn health_handler(
        req: Request<hyper::body::Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, std::convert::Infallible> {
        let response = match req.uri().path() {
            "/healthz" | "/livez" => Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("ok")))
                .unwrap(),
            "/readyz" => Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("ok")))
                .unwrap(),
            _ => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("not found")))
                .unwrap(),
        };
        Ok(response)
    }

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Config(format!("Invalid health server address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind health server: {}", e)))?;

    info!("Health server listening on {}", addr);

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| Error::Internal(format!("Health server accept error: {}", e)))?;

        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service_fn(health_handler))
                .await
            {
                tracing::error!("Health server connection error: {}", e);
            }
        });
    }
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str) -> Result<()> {
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use prometheus::{Encoder, TextEncoder};
    use tokio::net::TcpListener;

    async fn metrics_handler(
        req: Request<hyper::body::Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, std::convert::Infallible> {
        let response = match req.uri().path() {
            "/metrics" => {
                let encoder = TextEncoder::new();
                let metric_families = prometheus::gather();
                let mut buffer = Vec::new();
                encoder.encode(&metric_families, &mut buffer).unwrap();

                Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", encoder.format_type())
                    .body(Full::new(Bytes::from(buffer)))
                    .unwrap()
            }
            _ => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("not found")))
                .unwrap(),
        };
        Ok(response)
    }

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Config(format!("Invalid metrics server address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind metrics server: {}", e)))?;

    info!("Metrics server listening on {}", addr);

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| Error::Internal(format!("Metrics server accept error: {}", e)))?;

        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service_fn(metrics_handler))
                .await
            {
                tracing::error!("Metrics server connection error: {}", e);
            }
        });
    }
}

//! Broker Server
//!
//! Binds the HTTP transport to a socket and owns the pieces it shares:
//! the broker, the per-key rate limiter and the health checker.

use {
    crate::{
        broker::Broker,
        config::BrokerConfig,
        health::HealthChecker,
        http::{self, HttpState},
        logging,
        rate_limit::RateLimiter,
        validation::ToolkitReport,
    },
    anyhow::{Context, Result},
    std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration},
    tokio::task::JoinHandle,
    tokio_stream::wrappers::TcpListenerStream,
    tracing::debug,
    warp::{Filter, Reply},
};

pub struct BrokerServer {
    broker: Arc<Broker>,
    limiter: Arc<RateLimiter>,
    health: HealthChecker,
    toolkit: Option<ToolkitReport>,
    config: BrokerConfig,
}

impl BrokerServer {
    /// Create a server for `broker`. The rate limiter is built from `config.rate_limit`.
    pub fn new(broker: Arc<Broker>, config: BrokerConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        Self {
            broker,
            limiter,
            health: HealthChecker::default(),
            toolkit: None,
            config,
        }
    }

    /// Serve `report` on `/health/toolkit` instead of auditing the registry on each request.
    pub fn with_toolkit_report(mut self, report: ToolkitReport) -> Self {
        self.toolkit = Some(report);
        self
    }

    pub fn with_health_checker(mut self, health: HealthChecker) -> Self {
        self.health = health;
        self
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// The full route tree, for serving or for `warp::test`.
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        let state = Arc::new(HttpState {
            broker: Arc::clone(&self.broker),
            limiter: Arc::clone(&self.limiter),
            health: self.health.clone(),
            toolkit: self.toolkit.clone(),
        });
        http::routes(state)
    }

    /// Start on the configured host and port.
    pub async fn start(&self) -> Result<()> {
        self.start_on(self.config.port).await
    }

    /// Start on the configured host and `port`. Runs until the server future ends.
    pub async fn start_on(&self, port: u16) -> Result<()> {
        logging::log_server_startup(port);

        let addr = format!("{}:{port}", self.config.host)
            .parse::<SocketAddr>()
            .context("Invalid address")?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Could not bind to {}: {}", addr, e))?;

        logging::log_server_ready(&addr.to_string());

        let pruner = self
            .config
            .rate_limit
            .idle_ttl_secs
            .map(|ttl| spawn_pruner(Arc::clone(&self.limiter), Duration::from_secs(ttl)));

        warp::serve(self.routes())
            .run_incoming(TcpListenerStream::new(listener))
            .await;

        if let Some(handle) = pruner {
            handle.abort();
        }
        logging::log_server_shutdown();
        Ok(())
    }
}

/// Periodically drop buckets idle for longer than `ttl`.
fn spawn_pruner(limiter: Arc<RateLimiter>, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 2).max(Duration::from_secs(1));
    debug!(period_secs = period.as_secs(), "Starting rate-limit bucket pruner");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.prune_idle(ttl);
        }
    })
}

//! Tool Broker Server
//!
//! Loads vendor catalogs, registers them with a broker and serves the HTTP API.

use anyhow::{Context, Result};
use std::sync::Arc;
use toolbroker::{
    catalog, logging, toolkit_health, Broker, BrokerConfig, BrokerServer, DryRunExecutor, ToolRegistry,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();

    let config = match std::env::var("TOOLBROKER_CONFIG") {
        Ok(path) => BrokerConfig::from_file(&path)
            .with_context(|| format!("Failed to read config file {path}"))?
            .with_overrides(|name| std::env::var(name).ok())?,
        Err(_) => BrokerConfig::from_env()?,
    };

    let raw = catalog::load_catalogs(&config.catalog_paths).context("Failed to load catalogs")?;
    let report = toolkit_health(&raw);
    if report.is_healthy() {
        info!(total = report.total, event = "toolkit_checked", "Catalog passed validation");
    } else {
        warn!(
            total = report.total,
            invalid = report.invalid_count,
            event = "toolkit_checked",
            "Catalog has invalid tool definitions"
        );
    }

    let broker = Broker::new(ToolRegistry::new())
        .with_limits(config.default_page_limit, config.default_discover_limit);
    broker.register_tools(catalog::parse_tools(&raw));

    if config.dry_run {
        let executor = Arc::new(DryRunExecutor);
        let categories = broker.registry().read().category_names();
        for category in categories {
            broker.register_executor(&category, executor.clone());
        }
    }

    let server = BrokerServer::new(Arc::new(broker), config).with_toolkit_report(report);

    tokio::select! {
        result = server.start() => result?,
        _ = tokio::signal::ctrl_c() => logging::log_server_shutdown(),
    }

    Ok(())
}

//! Health check functionality for the broker server
//!
//! Wraps the broker's catalog health with process-level information
//! (version, uptime) for monitoring systems.

use crate::broker::{Broker, BrokerHealth};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Health check response structure
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// "healthy" while the server responds and has at least one tool, else "degraded"
    pub status: String,

    /// Current timestamp in seconds since Unix epoch
    pub timestamp: u64,

    pub server_name: String,
    pub version: String,
    pub uptime_seconds: u64,

    /// Tracked caller keys in the rate limiter
    pub rate_limit_buckets: usize,

    pub broker: BrokerHealth,
}

#[derive(Debug, Clone)]
pub struct HealthChecker {
    start_time: SystemTime,
    version: String,
    server_name: String,
}

impl HealthChecker {
    pub fn new(server_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            start_time: SystemTime::now(),
            version: version.into(),
            server_name: server_name.into(),
        }
    }

    pub fn get_status(&self, broker: &Broker, rate_limit_buckets: usize) -> HealthStatus {
        self.status_from(broker.health_check(), rate_limit_buckets)
    }

    pub fn status_from(&self, broker: BrokerHealth, rate_limit_buckets: usize) -> HealthStatus {
        let now = SystemTime::now();
        let timestamp = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let uptime_seconds = now
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_secs();

        let status = if broker.total_tools > 0 { "healthy" } else { "degraded" };

        HealthStatus {
            status: status.to_string(),
            timestamp,
            server_name: self.server_name.clone(),
            version: self.version.clone(),
            uptime_seconds,
            rate_limit_buckets,
            broker,
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new("toolbroker", env!("CARGO_PKG_VERSION"))
    }
}

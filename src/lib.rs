//! Tool Broker Library
//!
//! A registry of third-party SaaS tools grouped into vendor categories, and a
//! broker that exposes them through one uniform interface: list categories,
//! page through tools, fetch schemas, search by keyword and invoke a tool by
//! name (or alias) behind a per-caller rate limit.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use toolbroker::{Broker, BrokerConfig, BrokerServer, DryRunExecutor, ToolRegistry, ToolSchema};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let broker = Broker::new(ToolRegistry::new());
//!     broker.register_tools(vec![ToolSchema::new(
//!         "github_list_repos",
//!         "List repositories for a user",
//!         json!({"type": "object"}),
//!     )]);
//!     broker.register_executor("github", Arc::new(DryRunExecutor));
//!
//!     BrokerServer::new(Arc::new(broker), BrokerConfig::default()).start().await
//! }
//! ```

pub mod alias;
pub mod broker;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod health;
pub mod http;
pub mod logging;
pub mod rate_limit;
pub mod registry;
pub mod server;
pub mod types;
pub mod validation;

// Test modules
#[cfg(test)]
mod tests;

// Re-export key types
pub use alias::{AliasEntry, AliasMetadata, AliasResolver, ParamTransform};
pub use broker::{Broker, CallRequest, DiscoverParams, ListToolsParams};
pub use config::{BrokerConfig, RateLimitConfig};
pub use error::{BrokerError, BrokerResult};
pub use executor::{DryRunExecutor, FnExecutor, ToolExecutor};
pub use health::{HealthChecker, HealthStatus};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use registry::{CategoryCatalog, CategoryMetadata, RegistrationSummary, ToolRegistry};
pub use server::BrokerServer;
pub use types::{CategoryInfo, SearchHit, ToolSchema, ToolSummary};
pub use validation::{toolkit_health, ToolkitReport};

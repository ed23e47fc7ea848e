//! Test helpers for integration tests
//!
//! Starts a broker server on a free port and gives tests its base URL.

#![allow(dead_code)]

use serde_json::json;
use std::{sync::Arc, time::Duration};
use toolbroker::{Broker, BrokerConfig, BrokerServer, DryRunExecutor, ToolRegistry, ToolSchema};

/// Find an available port for testing
pub async fn find_available_port() -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// A small catalog spanning a plain vendor and a grouped one
pub fn sample_tools() -> Vec<ToolSchema> {
    vec![
        ToolSchema::new(
            "github_list_repos",
            "List repositories for a user",
            json!({"type": "object", "properties": {"owner": {"type": "string"}}}),
        ),
        ToolSchema::new(
            "github_create_issue",
            "Open an issue in a repository",
            json!({"type": "object", "properties": {"title": {"type": "string"}}}),
        ),
        ToolSchema::new(
            "workers_list_scripts",
            "List Workers scripts in an account",
            json!({"type": "object"}),
        ),
        ToolSchema::new(
            "stripe_create_customer",
            "Create a customer record",
            json!({"type": "object", "properties": {"email": {"type": "string"}}}),
        ),
    ]
}

/// Broker over [`sample_tools`] with a dry-run executor for every category
pub fn sample_broker() -> Broker {
    let broker = Broker::new(ToolRegistry::new());
    broker.register_tools(sample_tools());
    for category in ["github", "cloudflare", "stripe"] {
        broker.register_executor(category, Arc::new(DryRunExecutor));
    }
    broker
}

/// A broker server running on a dynamic port
pub struct TestServer {
    pub port: u16,
    pub handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start(broker: Broker, config: BrokerConfig) -> Self {
        let port = find_available_port().await.expect("free port");
        let server = BrokerServer::new(Arc::new(broker), config);

        let handle = tokio::spawn(async move {
            if let Err(e) = server.start_on(port).await {
                eprintln!("Test server error: {e}");
            }
        });

        // Wait a bit for the server to start
        tokio::time::sleep(Duration::from_millis(150)).await;

        Self { port, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

//! Broker Logging Module
//!
//! Structured logging for the broker using the tracing crate. Every event
//! carries an `event` field so log pipelines can filter on it.

use {
    tracing::{debug, info, span, warn, Level, Span},
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
    uuid::Uuid,
};

/// Initialize the tracing subscriber with appropriate configuration
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("toolbroker=info,warp=info"));

    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if json_format {
        // JSON format for production/structured logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }

    info!("Tracing initialized");
}

/// Generate a unique request ID for tracking
pub fn generate_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Create a span for tracking a request
pub fn request_span(route: &str, request_id: &str, api_key_id: &str) -> Span {
    span!(
        Level::INFO,
        "broker_request",
        route = %route,
        request_id = %request_id,
        caller = %api_key_id,
    )
}

/// Registration events
pub fn log_category_synthesized(category: &str) {
    warn!(
        category = %category,
        event = "category_synthesized",
        "No predefined metadata for category, using generated defaults"
    );
}

pub fn log_invalid_category(tool: &str, candidate: &str) {
    warn!(
        tool = %tool,
        candidate = %candidate,
        event = "invalid_category",
        "Derived category must match ^[a-z0-9]+$"
    );
}

pub fn log_tool_skipped(tool: &str) {
    warn!(
        tool = %tool,
        event = "tool_skipped",
        "Skipping tool without a valid category prefix"
    );
}

pub fn log_noncanonical_tool_name(tool: &str) {
    warn!(
        tool = %tool,
        pattern = crate::types::TOOL_NAME_PATTERN,
        event = "noncanonical_tool_name",
        "Registered tool name does not match the canonical pattern"
    );
}

pub fn log_registration_complete(registered: usize, skipped: usize, categories: usize) {
    info!(
        registered = registered,
        skipped = skipped,
        categories = categories,
        event = "registration_complete",
        "Tool registration complete"
    );
}

pub fn log_catalog_loaded(path: &str, entries: usize) {
    info!(
        path = %path,
        entries = entries,
        event = "catalog_loaded",
        "Loaded tool catalog"
    );
}

/// Dispatch events
///
/// Arguments can carry caller secrets, so they are only logged at debug.
pub fn log_tool_call(category: &str, tool: &str, args: &serde_json::Value) {
    info!(
        category = %category,
        tool = %tool,
        event = "tool_call",
        "Tool call requested"
    );
    debug!(
        tool = %tool,
        args = ?args,
        event = "tool_call_arguments",
        "Tool call arguments"
    );
}

pub fn log_alias_resolved(alias: &str, canonical: &str) {
    debug!(
        alias = %alias,
        canonical = %canonical,
        event = "alias_resolved",
        "Resolved tool alias"
    );
}

pub fn log_unknown_category(category: &str) {
    warn!(
        category = %category,
        event = "unknown_category",
        "Unknown category requested"
    );
}

pub fn log_unknown_tool(category: &str, tool: &str) {
    warn!(
        category = %category,
        tool = %tool,
        event = "unknown_tool",
        "Unknown tool requested"
    );
}

pub fn log_executor_missing(category: &str) {
    warn!(
        category = %category,
        event = "executor_missing",
        "No executor wired for category"
    );
}

pub fn log_rate_limited(key_id: &str, reset_in: u64) {
    warn!(
        caller = %key_id,
        reset_in_secs = reset_in,
        event = "rate_limited",
        "Request rejected by rate limiter"
    );
}

pub fn log_buckets_pruned(removed: usize, remaining: usize) {
    debug!(
        removed = removed,
        remaining = remaining,
        event = "buckets_pruned",
        "Pruned idle rate limit buckets"
    );
}

/// Server lifecycle logging
pub fn log_server_startup(port: u16) {
    info!(
        port = port,
        event = "server_startup",
        "Starting tool broker"
    );
}

pub fn log_server_ready(addr: &str) {
    info!(
        address = %addr,
        event = "server_ready",
        "Tool broker ready and listening"
    );
}

pub fn log_server_shutdown() {
    info!(
        event = "server_shutdown",
        "Tool broker shutting down"
    );
}

#[macro_export]
macro_rules! log_tool_execution {
    ($tool_name:expr, $duration:expr, $result:expr) => {
        match $result {
            Ok(_) => tracing::info!(
                tool = %$tool_name,
                duration_ms = $duration.as_millis() as u64,
                event = "tool_execution_success",
                "Tool executed successfully"
            ),
            Err(ref e) => tracing::error!(
                tool = %$tool_name,
                duration_ms = $duration.as_millis() as u64,
                error = %e,
                event = "tool_execution_error",
                "Tool execution failed"
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_tool_call_arguments_only_at_debug() {
        let args = serde_json::json!({"token": "secret"});

        let (_, events) = crate::tests::capture_events_at(tracing::Level::INFO, || {
            log_tool_call("github", "github_list_repos", &args)
        });
        assert_eq!(events, vec!["tool_call".to_string()]);

        let (_, events) = crate::tests::capture_events_at(tracing::Level::DEBUG, || {
            log_tool_call("github", "github_list_repos", &args)
        });
        assert_eq!(events, vec!["tool_call".to_string(), "tool_call_arguments".to_string()]);
    }

    #[test]
    fn test_log_tool_execution_does_not_consume_result() {
        let result: anyhow::Result<u32> = Err(anyhow::anyhow!("boom"));
        crate::log_tool_execution!("acme_ping", std::time::Duration::from_millis(3), result);
        assert!(result.is_err());
    }
}

//! Tool Executor Trait
//!
//! Core trait that vendor integrations implement to actually perform a tool
//! call. The broker validates every call against the catalog and then hands
//! it to the executor wired for the tool's category; it never talks to a
//! vendor API itself.

use {
    anyhow::Result,
    async_trait::async_trait,
    serde_json::{json, Value},
    std::future::Future,
};

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `tool_name` (canonical, already validated) with `arguments`.
    /// The returned value is passed back to the caller verbatim.
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value>;
}

/// Adapts an async closure into a [`ToolExecutor`].
///
/// # Examples
/// ```rust
/// use toolbroker::executor::FnExecutor;
/// use serde_json::json;
///
/// let executor = FnExecutor::new(|tool: String, args: serde_json::Value| async move {
///     Ok::<_, anyhow::Error>(json!({ "tool": tool, "echo": args }))
/// });
/// ```
pub struct FnExecutor<F> {
    func: F,
}

impl<F> FnExecutor<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> ToolExecutor for FnExecutor<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        (self.func)(tool_name.to_string(), arguments).await
    }
}

/// Echoes the validated call instead of contacting a vendor. Useful for
/// checking catalog and alias wiring end to end.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl ToolExecutor for DryRunExecutor {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        Ok(json!({
            "dryRun": true,
            "tool": tool_name,
            "arguments": arguments,
        }))
    }
}

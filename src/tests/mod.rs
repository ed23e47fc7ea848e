//! Broker Tests
//!
//! Unit tests for the registry, search ranking, aliases, rate limiting,
//! dispatch, validation and the HTTP routes.

pub mod rate_limit_tests;

use {
    crate::{executor::ToolExecutor, types::ToolSchema},
    async_trait::async_trait,
    serde_json::{json, Value},
    std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    tracing::Subscriber,
    tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer},
};

/// Tool with an empty object schema
pub(crate) fn tool(name: &str, description: &str) -> ToolSchema {
    ToolSchema::new(name, description, json!({"type": "object"}))
}

/// The two GitHub tools used throughout the registry tests
pub(crate) fn github_tools() -> Vec<ToolSchema> {
    vec![
        tool("github_list_repos", "List repos"),
        tool("github_get_repo", "Get a repo"),
    ]
}

/// Records every call it receives and echoes the arguments back.
#[derive(Default)]
pub(crate) struct CountingExecutor {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Value)>>,
}

impl CountingExecutor {
    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_call(&self) -> Option<(String, Value)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ToolExecutor for CountingExecutor {
    async fn execute(&self, tool_name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((tool_name.to_string(), arguments.clone()));
        Ok(json!({ "tool": tool_name, "arguments": arguments }))
    }
}

/// Always fails, for checking error propagation.
pub(crate) struct FailingExecutor;

#[async_trait]
impl ToolExecutor for FailingExecutor {
    async fn execute(&self, _tool_name: &str, _arguments: Value) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("vendor returned 503"))
    }
}

/// Tracing layer that records the `event` field of every log line.
struct EventCapture {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        if let (Some(name), Ok(mut events)) = (visitor.event, self.events.lock()) {
            events.push(name);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
}

impl tracing::field::Visit for EventVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "event" {
            self.event = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "event" {
            self.event = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }
}

/// Run `f` with a thread-local subscriber and return the `event` names it logged.
pub(crate) fn capture_events<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    capture_events_at(tracing::Level::TRACE, f)
}

/// Like [`capture_events`], keeping only events at `level` or more severe.
pub(crate) fn capture_events_at<T>(level: tracing::Level, f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(EventCapture {
            events: events.clone(),
        })
        .with(LevelFilter::from_level(level));

    let result = tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().map(|e| e.clone()).unwrap_or_default();
    (result, captured)
}

//! HTTP Transport Module
//!
//! warp routes exposing the broker. The transport extracts the caller's API
//! key, gates `/call` through the rate limiter and translates broker errors
//! into status codes; everything else is delegated to [`Broker`].

mod auth;
pub mod response;

pub use response::{apply_cors_headers, ResponseBuilder};

use crate::{
    broker::{Broker, CallRequest, CategoryParams, DiscoverParams, GetToolSchemaParams, ListToolsParams},
    error::BrokerError,
    health::HealthChecker,
    logging,
    rate_limit::{RateLimiter, ANONYMOUS_KEY},
    types::ToolSchema,
    validation::{toolkit_health, ToolkitReport},
};
use serde::Deserialize;
use serde_json::Value;
use std::{convert::Infallible, sync::Arc};
use tracing::Instrument;
use warp::{
    http::StatusCode,
    reply::Response,
    Filter, Rejection, Reply,
};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// Everything the route handlers share
pub struct HttpState {
    pub broker: Arc<Broker>,
    pub limiter: Arc<RateLimiter>,
    pub health: HealthChecker,
    /// Report of the raw catalog as loaded; computed from the registry when absent
    pub toolkit: Option<ToolkitReport>,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    subcategory: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

fn with_state(
    state: Arc<HttpState>,
) -> impl Filter<Extract = (Arc<HttpState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// All broker routes, with rejections rendered as JSON errors.
pub fn routes(state: Arc<HttpState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let list_categories = warp::path!("categories")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_list_categories);

    let list_tools = warp::path!("categories" / String / "tools")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(with_state(state.clone()))
        .and_then(handle_list_tools);

    let list_subcategories = warp::path!("categories" / String / "subcategories")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_list_subcategories);

    let get_schema = warp::path!("categories" / String / "tools" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_get_schema);

    let discover = warp::path!("discover")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_discover);

    let call = warp::path!("call")
        .and(warp::post())
        .and(warp::header::optional::<String>("x-api-key"))
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_call);

    let meta_tools = warp::path!("tools")
        .and(warp::get())
        .and_then(handle_meta_tools);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_health);

    let toolkit = warp::path!("health" / "toolkit")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_toolkit);

    list_categories
        .or(list_tools)
        .or(list_subcategories)
        .or(get_schema)
        .or(discover)
        .or(call)
        .or(meta_tools)
        .or(health)
        .or(toolkit)
        .recover(handle_rejection)
}

async fn handle_list_categories(state: Arc<HttpState>) -> Result<Response, Rejection> {
    Ok(ResponseBuilder::new().build_ok(&state.broker.list_categories()))
}

async fn handle_list_tools(
    category: String,
    query: PageQuery,
    state: Arc<HttpState>,
) -> Result<Response, Rejection> {
    let params = ListToolsParams {
        category,
        subcategory: query.subcategory,
        limit: query.limit,
        offset: query.offset,
    };
    Ok(respond(state.broker.list_tools(params)))
}

async fn handle_list_subcategories(category: String, state: Arc<HttpState>) -> Result<Response, Rejection> {
    Ok(respond(state.broker.list_subcategories(CategoryParams { category })))
}

async fn handle_get_schema(
    category: String,
    tool_name: String,
    state: Arc<HttpState>,
) -> Result<Response, Rejection> {
    Ok(respond(
        state
            .broker
            .get_tool_schema(GetToolSchemaParams { category, tool_name }),
    ))
}

async fn handle_discover(params: DiscoverParams, state: Arc<HttpState>) -> Result<Response, Rejection> {
    Ok(ResponseBuilder::new().build_ok(&state.broker.discover(params)))
}

async fn handle_call(
    api_key: Option<String>,
    authorization: Option<String>,
    request: CallRequest,
    state: Arc<HttpState>,
) -> Result<Response, Rejection> {
    let request_id = logging::generate_request_id();
    let key = auth::extract_api_key(api_key.as_deref(), authorization.as_deref());
    let caller = key
        .as_deref()
        .map(auth::key_fingerprint)
        .unwrap_or_else(|| ANONYMOUS_KEY.to_string());
    let span = logging::request_span("call", &request_id, &caller);

    async move {
        let decision = state.limiter.check(key.as_deref());
        let builder = ResponseBuilder::new()
            .with_header("x-request-id", &request_id)
            .with_rate_limit(&decision);

        if !decision.allowed {
            logging::log_rate_limited(&caller, decision.reset_in);
            let error = BrokerError::RateLimitExceeded {
                key: caller,
                reset_in: decision.reset_in,
            };
            return Ok(builder.build_error(&error));
        }

        match state.broker.call_registered(request).await {
            Ok(result) => Ok(builder.build_ok(&result)),
            Err(error) => Ok(builder.build_error(&error)),
        }
    }
    .instrument(span)
    .await
}

async fn handle_meta_tools() -> Result<Response, Rejection> {
    let tools: Vec<ToolSchema> = Broker::meta_tools();
    Ok(ResponseBuilder::new().build_ok(&serde_json::json!({ "tools": tools })))
}

async fn handle_health(state: Arc<HttpState>) -> Result<Response, Rejection> {
    let status = state
        .health
        .get_status(&state.broker, state.limiter.bucket_count());
    Ok(ResponseBuilder::new().build_ok(&status))
}

async fn handle_toolkit(state: Arc<HttpState>) -> Result<Response, Rejection> {
    let report = match &state.toolkit {
        Some(report) => report.clone(),
        None => {
            let registry = state.broker.registry();
            let registry = registry.read();
            let raw: Vec<Value> = registry
                .all_tools()
                .filter_map(|(_, tool)| serde_json::to_value(tool).ok())
                .collect();
            toolkit_health(&raw)
        }
    };
    Ok(ResponseBuilder::new().build_ok(&report))
}

fn respond<T: serde::Serialize>(result: Result<T, BrokerError>) -> Response {
    match result {
        Ok(body) => ResponseBuilder::new().build_ok(&body),
        Err(error) => ResponseBuilder::new().build_error(&error),
    }
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    if rejection.is_not_found() {
        let body = serde_json::json!({
            "error": { "code": "not_found", "message": "No such route" }
        });
        return Ok(ResponseBuilder::new().build_json(StatusCode::NOT_FOUND, &body));
    }

    if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(ResponseBuilder::new().build_error(&BrokerError::InvalidParams(e.to_string())));
    }

    if let Some(e) = rejection.find::<warp::reject::InvalidQuery>() {
        return Ok(ResponseBuilder::new().build_error(&BrokerError::InvalidParams(e.to_string())));
    }

    if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        let body = serde_json::json!({
            "error": { "code": "payload_too_large", "message": "Request body too large" }
        });
        return Ok(ResponseBuilder::new().build_json(StatusCode::PAYLOAD_TOO_LARGE, &body));
    }

    if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        let body = serde_json::json!({
            "error": { "code": "method_not_allowed", "message": "Method not allowed" }
        });
        return Ok(ResponseBuilder::new().build_json(StatusCode::METHOD_NOT_ALLOWED, &body));
    }

    Ok(ResponseBuilder::new().build_error(&BrokerError::Internal(format!("{rejection:?}"))))
}

//! Broker dispatcher.
//!
//! This module provides the `Broker` struct, the façade every transport talks
//! to. It answers catalog queries against a shared [`ToolRegistry`] and, on
//! `call`, validates the category and tool before handing the request to a
//! [`ToolExecutor`]. Validation always finishes before any executor runs.

use crate::{
    alias::AliasResolver,
    error::{BrokerError, BrokerResult},
    executor::ToolExecutor,
    log_tool_execution, logging,
    registry::{RegistrationSummary, ToolRegistry},
    types::{CategoryInfo, SearchHit, ToolSchema, ToolSummary},
};
use parking_lot::RwLock;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Instant,
};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const DEFAULT_DISCOVER_LIMIT: usize = 10;

/// Parameters for listing the tools of a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListToolsParams {
    /// Category to list, e.g. `github`
    pub category: String,
    /// Only tools of this product line
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Page size (default 50)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of tools to skip
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CategoryParams {
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetToolSchemaParams {
    pub category: String,
    pub tool_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DiscoverParams {
    /// Space-separated keywords
    pub query: String,
    /// Maximum number of results (default 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A tool invocation. `tool_name` may be an alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CallRequest {
    /// Derived from the tool name when omitted
    #[serde(default)]
    pub category: Option<String>,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl CallRequest {
    pub fn new(category: &str, tool_name: &str, arguments: Value) -> Self {
        Self {
            category: Some(category.to_string()),
            tool_name: tool_name.to_string(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListing {
    pub categories: Vec<CategoryInfo>,
    pub total_tools: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPage {
    pub category: String,
    pub subcategory: Option<String>,
    pub tools: Vec<ToolSummary>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryListing {
    pub category: String,
    pub subcategories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverResult {
    pub query: String,
    pub total: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHealth {
    pub name: String,
    pub enabled: bool,
    pub tool_count: usize,
    pub has_executor: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerHealth {
    pub status: String,
    pub total_tools: usize,
    pub categories: Vec<CategoryHealth>,
    /// Credential variable name → whether it is set. Values are never reported.
    pub credentials: BTreeMap<String, bool>,
    pub alias_count: usize,
}

/// A call that passed validation.
#[derive(Debug, Clone)]
struct ResolvedCall {
    category: String,
    tool_name: String,
    arguments: Value,
}

pub struct Broker {
    registry: Arc<RwLock<ToolRegistry>>,
    aliases: AliasResolver,
    executors: RwLock<HashMap<String, Arc<dyn ToolExecutor>>>,
    page_limit: usize,
    discover_limit: usize,
}

impl Broker {
    /// Create a broker over `registry` with the built-in alias table.
    pub fn new(registry: ToolRegistry) -> Self {
        Self::shared(Arc::new(RwLock::new(registry)))
    }

    /// Create a broker over a registry that other components also hold.
    pub fn shared(registry: Arc<RwLock<ToolRegistry>>) -> Self {
        Self {
            registry,
            aliases: AliasResolver::builtin(),
            executors: RwLock::new(HashMap::new()),
            page_limit: DEFAULT_PAGE_LIMIT,
            discover_limit: DEFAULT_DISCOVER_LIMIT,
        }
    }

    pub fn with_aliases(mut self, aliases: AliasResolver) -> Self {
        self.aliases = aliases;
        self
    }

    /// Override the default page size and discovery limit.
    pub fn with_limits(mut self, page_limit: usize, discover_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self.discover_limit = discover_limit.max(1);
        self
    }

    pub fn with_executor(self, category: &str, executor: Arc<dyn ToolExecutor>) -> Self {
        self.register_executor(category, executor);
        self
    }

    /// Wire the executor that performs calls for `category`. Replaces any previous one.
    pub fn register_executor(&self, category: &str, executor: Arc<dyn ToolExecutor>) {
        self.executors.write().insert(category.to_string(), executor);
    }

    pub fn registry(&self) -> Arc<RwLock<ToolRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn aliases(&self) -> &AliasResolver {
        &self.aliases
    }

    /// Bulk-register under one write lock so readers never see tools without
    /// their recomputed counts.
    pub fn register_tools<I>(&self, tools: I) -> RegistrationSummary
    where
        I: IntoIterator<Item = ToolSchema>,
    {
        self.registry.write().bulk_register_tools(tools)
    }

    pub fn list_categories(&self) -> CategoryListing {
        let registry = self.registry.read();
        CategoryListing {
            categories: registry.categories(),
            total_tools: registry.get_total_tool_count(),
        }
    }

    pub fn list_tools(&self, params: ListToolsParams) -> BrokerResult<ToolPage> {
        let registry = self.registry.read();
        require_category(&registry, &params.category)?;

        let tools = match params.subcategory.as_deref() {
            Some(sub) => registry.list_tools_in_subcategory(&params.category, sub),
            None => registry.list_tools_in_category(&params.category),
        };

        let total = tools.len();
        let limit = params.limit.unwrap_or(self.page_limit);
        let offset = params.offset.unwrap_or(0);
        let page: Vec<ToolSummary> = tools.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(page.len()) < total;

        Ok(ToolPage {
            category: params.category,
            subcategory: params.subcategory,
            tools: page,
            total,
            limit,
            offset,
            has_more,
        })
    }

    pub fn list_subcategories(&self, params: CategoryParams) -> BrokerResult<SubcategoryListing> {
        let registry = self.registry.read();
        require_category(&registry, &params.category)?;

        let subcategories = registry
            .category(&params.category)
            .map(|info| info.subcategories.clone())
            .unwrap_or_default();

        Ok(SubcategoryListing {
            category: params.category,
            subcategories,
        })
    }

    pub fn get_tool_schema(&self, params: GetToolSchemaParams) -> BrokerResult<ToolSchema> {
        let registry = self.registry.read();
        require_category(&registry, &params.category)?;
        require_tool(&registry, &params.category, &params.tool_name).cloned()
    }

    pub fn discover(&self, params: DiscoverParams) -> DiscoverResult {
        let limit = params.limit.unwrap_or(self.discover_limit);
        let results = self.registry.read().search_tools(&params.query, limit);
        DiscoverResult {
            query: params.query,
            total: results.len(),
            results,
        }
    }

    /// Validate `request` and run it on `executor`.
    pub async fn call(&self, request: CallRequest, executor: &dyn ToolExecutor) -> BrokerResult<Value> {
        let resolved = self.resolve_call(request)?;
        self.execute(resolved, executor).await
    }

    /// Validate `request` and run it on the executor wired for its category.
    pub async fn call_registered(&self, request: CallRequest) -> BrokerResult<Value> {
        let resolved = self.resolve_call(request)?;

        let executor = self.executors.read().get(&resolved.category).cloned();
        let Some(executor) = executor else {
            logging::log_executor_missing(&resolved.category);
            return Err(BrokerError::ExecutorMissing(resolved.category));
        };

        self.execute(resolved, executor.as_ref()).await
    }

    fn resolve_call(&self, request: CallRequest) -> BrokerResult<ResolvedCall> {
        let original = request.tool_name;
        let tool_name = self.aliases.resolve_tool_name(&original).to_string();
        if tool_name != original {
            logging::log_alias_resolved(&original, &tool_name);
        }

        let arguments = match request.arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let arguments = self.aliases.map_parameters(&original, arguments);

        let registry = self.registry.read();
        let category = match request.category.filter(|c| !c.is_empty()) {
            Some(category) => category,
            None => registry.extract_category(&tool_name).ok_or_else(|| {
                let candidate = tool_name.split('_').next().unwrap_or_default().to_string();
                logging::log_unknown_category(&candidate);
                BrokerError::UnknownCategory {
                    category: candidate,
                    valid: registry.category_names(),
                }
            })?,
        };

        require_category(&registry, &category)?;
        require_tool(&registry, &category, &tool_name)?;

        Ok(ResolvedCall {
            category,
            tool_name,
            arguments,
        })
    }

    async fn execute(&self, call: ResolvedCall, executor: &dyn ToolExecutor) -> BrokerResult<Value> {
        logging::log_tool_call(&call.category, &call.tool_name, &call.arguments);

        let started = Instant::now();
        let result = executor.execute(&call.tool_name, call.arguments).await;
        log_tool_execution!(call.tool_name, started.elapsed(), result);

        result.map_err(BrokerError::from)
    }

    /// Catalog and credential status. Reads the process environment.
    pub fn health_check(&self) -> BrokerHealth {
        self.health_check_with_env(|name| std::env::var_os(name).is_some())
    }

    /// Like [`health_check`](Self::health_check) with `is_set` deciding whether a variable is present.
    pub fn health_check_with_env<F>(&self, is_set: F) -> BrokerHealth
    where
        F: Fn(&str) -> bool,
    {
        let registry = self.registry.read();
        let executors = self.executors.read();

        let mut credentials = BTreeMap::new();
        let categories = registry
            .categories()
            .into_iter()
            .map(|info| {
                for var in registry.catalog().credential_env(&info.name) {
                    credentials.insert(var.clone(), is_set(var));
                }
                CategoryHealth {
                    has_executor: executors.contains_key(&info.name),
                    name: info.name,
                    enabled: info.enabled,
                    tool_count: info.tool_count,
                }
            })
            .collect();

        BrokerHealth {
            status: "ok".to_string(),
            total_tools: registry.get_total_tool_count(),
            categories,
            credentials,
            alias_count: self.aliases.get_all_aliases().len(),
        }
    }

    /// The broker's own operations, described as tools.
    pub fn meta_tools() -> Vec<ToolSchema> {
        vec![
            ToolSchema::from_input::<EmptyParams>(
                "broker_list_categories",
                "List every integration category with its tool count",
            ),
            ToolSchema::from_input::<ListToolsParams>(
                "broker_list_tools",
                "List the tools of one category, optionally filtered by subcategory",
            ),
            ToolSchema::from_input::<CategoryParams>(
                "broker_list_subcategories",
                "List the product-line subcategories of a category",
            ),
            ToolSchema::from_input::<GetToolSchemaParams>(
                "broker_get_tool_schema",
                "Get the full input schema of one tool",
            ),
            ToolSchema::from_input::<DiscoverParams>(
                "broker_discover",
                "Keyword search across the whole tool catalog",
            ),
            ToolSchema::from_input::<CallRequest>(
                "broker_call",
                "Invoke a tool by category and name (aliases accepted)",
            ),
        ]
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct EmptyParams {}

fn require_category(registry: &ToolRegistry, category: &str) -> BrokerResult<()> {
    if registry.has_category(category) {
        return Ok(());
    }
    logging::log_unknown_category(category);
    Err(BrokerError::UnknownCategory {
        category: category.to_string(),
        valid: registry.category_names(),
    })
}

fn require_tool<'r>(registry: &'r ToolRegistry, category: &str, tool: &str) -> BrokerResult<&'r ToolSchema> {
    registry.get_tool_schema(category, tool).ok_or_else(|| {
        logging::log_unknown_tool(category, tool);
        BrokerError::ToolNotFound {
            category: category.to_string(),
            tool: tool.to_string(),
        }
    })
}

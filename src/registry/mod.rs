//! Tool registry for the vendor catalog.
//!
//! This module provides the `ToolRegistry` struct which aggregates tool
//! definitions from many independent vendor modules into one namespace. Tools
//! are grouped by the category derived from their name prefix, and every
//! category carries derived metadata (tool count, subcategories) that is
//! recomputed after each bulk registration.

mod category;
mod search;

pub use category::{
    capitalize, synthesize_metadata, CategoryCatalog, CategoryMetadata, CategoryMetadataSource,
    CategoryRejection,
};

use crate::{
    logging,
    types::{is_valid_tool_name, CategoryInfo, SearchHit, ToolSchema, ToolSummary},
};
use search::IndexedFields;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// A registered tool plus its precomputed search text.
#[derive(Debug, Clone)]
struct ToolEntry {
    schema: ToolSchema,
    fields: IndexedFields,
}

/// Tools of one category, remembering registration order.
#[derive(Debug, Clone, Default)]
struct CategoryTools {
    order: Vec<String>,
    entries: HashMap<String, ToolEntry>,
}

impl CategoryTools {
    fn insert(&mut self, entry: ToolEntry) {
        let name = entry.schema.name.clone();
        if self.entries.insert(name.clone(), entry).is_none() {
            self.order.push(name);
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> impl Iterator<Item = &ToolEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }
}

/// Outcome of a bulk registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    pub registered: usize,
    /// Names that yielded no valid category
    pub skipped: Vec<String>,
}

/// The central catalog: category → tool name → schema, plus category metadata.
///
/// A registry is an ordinary value. Build one at startup, fill it with
/// [`bulk_register_tools`](Self::bulk_register_tools) and hand it to the
/// [`Broker`](crate::broker::Broker).
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    catalog: CategoryCatalog,
    tools: HashMap<String, CategoryTools>,
    categories: HashMap<String, CategoryInfo>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create an empty registry using the built-in category metadata.
    pub fn new() -> Self {
        Self::with_catalog(CategoryCatalog::builtin())
    }

    pub fn with_catalog(catalog: CategoryCatalog) -> Self {
        Self {
            catalog,
            tools: HashMap::new(),
            categories: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Make sure `name` has a `CategoryInfo`. Existing categories are left untouched.
    pub fn ensure_category(&mut self, name: &str) {
        if self.categories.contains_key(name) {
            return;
        }

        let source = self.catalog.metadata_for(name);
        if source.is_synthesized() {
            logging::log_category_synthesized(name);
        }
        let metadata = source.into_metadata();

        self.categories.insert(
            name.to_string(),
            CategoryInfo {
                name: name.to_string(),
                display_name: metadata.display_name,
                description: metadata.description,
                tool_count: 0,
                enabled: true,
                subcategories: Vec::new(),
            },
        );
        self.tools.entry(name.to_string()).or_default();
    }

    /// Insert or overwrite `tool` under `category` and refresh that category's
    /// derived fields. Name format is not checked here.
    pub fn register_tool(&mut self, category: &str, tool: ToolSchema) {
        self.ensure_category(category);
        self.insert_tool(category, tool);
        self.refresh_category(category);
    }

    fn insert_tool(&mut self, category: &str, tool: ToolSchema) {
        let fields = IndexedFields::build(&tool.name, &tool.description, &tool.input_schema, category);
        self.tools
            .entry(category.to_string())
            .or_default()
            .insert(ToolEntry { schema: tool, fields });
    }

    /// Category of `tool_name`, or `None` (with a warning for malformed prefixes).
    pub fn extract_category(&self, tool_name: &str) -> Option<String> {
        match self.catalog.derive_category(tool_name) {
            Ok(category) => Some(category),
            Err(CategoryRejection::NoUnderscore) => None,
            Err(CategoryRejection::InvalidCharacters(candidate)) => {
                logging::log_invalid_category(tool_name, &candidate);
                None
            }
        }
    }

    pub fn extract_subcategory(&self, tool_name: &str) -> Option<String> {
        self.catalog.derive_subcategory(tool_name)
    }

    /// Register a batch of tools, skipping (and logging) any whose name yields
    /// no category. Derived counts and subcategory lists are recomputed once
    /// every tool has been inserted.
    pub fn bulk_register_tools<I>(&mut self, tools: I) -> RegistrationSummary
    where
        I: IntoIterator<Item = ToolSchema>,
    {
        let mut summary = RegistrationSummary::default();

        for mut tool in tools {
            let Some(category) = self.extract_category(&tool.name) else {
                logging::log_tool_skipped(&tool.name);
                summary.skipped.push(tool.name);
                continue;
            };

            if !is_valid_tool_name(&tool.name) {
                logging::log_noncanonical_tool_name(&tool.name);
            }

            self.ensure_category(&category);

            if tool.subcategory.is_none() && self.catalog.supports_subcategories(&category) {
                tool.subcategory = self.extract_subcategory(&tool.name);
            }

            self.insert_tool(&category, tool);
            summary.registered += 1;
        }

        self.recompute_tool_counts();
        self.recompute_subcategories();

        logging::log_registration_complete(
            summary.registered,
            summary.skipped.len(),
            self.categories.len(),
        );
        summary
    }

    fn recompute_tool_counts(&mut self) {
        for (name, info) in self.categories.iter_mut() {
            info.tool_count = self.tools.get(name).map(CategoryTools::len).unwrap_or(0);
        }
    }

    fn recompute_subcategories(&mut self) {
        for (name, info) in self.categories.iter_mut() {
            info.subcategories = collect_subcategories(self.tools.get(name));
        }
    }

    fn refresh_category(&mut self, category: &str) {
        let tools = self.tools.get(category);
        if let Some(info) = self.categories.get_mut(category) {
            info.tool_count = tools.map(CategoryTools::len).unwrap_or(0);
            info.subcategories = collect_subcategories(tools);
        }
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryInfo> {
        self.categories.get(name)
    }

    /// All categories, sorted by name.
    pub fn categories(&self) -> Vec<CategoryInfo> {
        let mut categories: Vec<CategoryInfo> = self.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    /// Sorted category names.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name/description projections in registration order; empty for unknown categories.
    pub fn list_tools_in_category(&self, category: &str) -> Vec<ToolSummary> {
        self.tools
            .get(category)
            .map(|tools| tools.iter().map(|e| e.schema.summary()).collect())
            .unwrap_or_default()
    }

    pub fn list_tools_in_subcategory(&self, category: &str, subcategory: &str) -> Vec<ToolSummary> {
        self.tools
            .get(category)
            .map(|tools| {
                tools
                    .iter()
                    .filter(|e| e.schema.subcategory.as_deref() == Some(subcategory))
                    .map(|e| e.schema.summary())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_tool_schema(&self, category: &str, name: &str) -> Option<&ToolSchema> {
        self.tools
            .get(category)?
            .entries
            .get(name)
            .map(|e| &e.schema)
    }

    /// Every registered tool with its category, in no particular order.
    pub fn all_tools(&self) -> impl Iterator<Item = (&str, &ToolSchema)> {
        self.tools
            .iter()
            .flat_map(|(category, tools)| tools.iter().map(move |e| (category.as_str(), &e.schema)))
    }

    /// Rank every tool against `query` and return the best `limit` hits.
    pub fn search_tools(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let terms = search::query_terms(query);
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let terms = terms.as_slice();
        let mut hits: Vec<SearchHit> = self
            .tools
            .iter()
            .flat_map(|(category, tools)| {
                tools.iter().filter_map(move |entry| {
                    let (score, matched_fields) = entry.fields.score(terms);
                    (score > 0).then(|| SearchHit {
                        category: category.clone(),
                        score,
                        matched_fields,
                        tool: entry.schema.clone(),
                    })
                })
            })
            .collect();

        hits.sort_by(search::compare_hits);
        hits.truncate(limit);
        hits
    }

    pub fn get_total_tool_count(&self) -> usize {
        self.tools.values().map(CategoryTools::len).sum()
    }
}

fn collect_subcategories(tools: Option<&CategoryTools>) -> Vec<String> {
    let Some(tools) = tools else {
        return Vec::new();
    };
    tools
        .iter()
        .filter_map(|e| e.schema.subcategory.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

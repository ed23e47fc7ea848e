//! Core types for the tool catalog
//!
//! This module contains the shared type definitions used by the registry,
//! the broker and the transport layer.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical tool name rule, shared by the toolkit validator and the registry's
/// registration diagnostics.
pub const TOOL_NAME_PATTERN: &str = r"^[A-Za-z0-9._-]{1,64}$";

static TOOL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TOOL_NAME_PATTERN).expect("tool name pattern is valid"));

/// Returns true when `name` satisfies [`TOOL_NAME_PATTERN`].
pub fn is_valid_tool_name(name: &str) -> bool {
    TOOL_NAME_RE.is_match(name)
}

/// Definition of one invocable vendor operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    /// Globally unique name, prefixed with `<category>_`
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema describing the accepted arguments
    pub input_schema: Value,
    /// Product line within a grouped vendor category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            subcategory: None,
        }
    }

    /// Build a tool whose input schema is generated from `I`.
    pub fn from_input<I: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(I))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));
        Self::new(name, description, schema)
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Name and description only; listings never carry schemas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// One vendor/integration namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Recomputed after every bulk registration
    pub tool_count: usize,
    pub enabled: bool,
    pub subcategories: Vec<String>,
}

/// Field of a tool that a search term matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedField {
    Name,
    Description,
    Schema,
    Category,
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub category: String,
    pub score: usize,
    pub matched_fields: Vec<MatchedField>,
    pub tool: ToolSchema,
}

//! Toolkit Validation
//!
//! Structural audit of raw vendor tool arrays. Findings are reported, never
//! raised, so malformed vendor data can be inspected before the registry
//! silently skips it.

use {
    crate::types::{is_valid_tool_name, TOOL_NAME_PATTERN},
    serde::Serialize,
    serde_json::Value,
    std::collections::BTreeMap,
    tracing::debug,
};

/// How many invalid entries a report lists in full.
pub const MAX_REPORTED_INVALID: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidTool {
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolkitReport {
    pub total: usize,
    pub valid: usize,
    pub invalid_count: usize,
    /// First [`MAX_REPORTED_INVALID`] findings
    pub invalid: Vec<InvalidTool>,
    /// Tools per name prefix, `"unknown"` when the name has none
    pub categories: BTreeMap<String, usize>,
}

impl ToolkitReport {
    pub fn is_healthy(&self) -> bool {
        self.invalid_count == 0
    }
}

/// Classify one entry; `Err` carries the reason it is invalid.
fn check_tool(tool: &Value) -> Result<(), String> {
    let Some(obj) = tool.as_object() else {
        return Err("not an object".to_string());
    };

    let name = match obj.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => return Err("missing or invalid name".to_string()),
    };

    if !is_valid_tool_name(name) {
        return Err(format!("name does not match {TOOL_NAME_PATTERN}"));
    }

    if !obj.get("inputSchema").is_some_and(Value::is_object) {
        return Err("missing or invalid inputSchema".to_string());
    }

    if !obj.get("description").is_some_and(Value::is_string) {
        return Err("missing or invalid description".to_string());
    }

    Ok(())
}

fn category_of(tool: &Value) -> String {
    tool.get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.split_once('_'))
        .map(|(prefix, _)| prefix)
        .filter(|prefix| !prefix.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Scan a flat tool array and report structural problems.
pub fn toolkit_health(tools: &[Value]) -> ToolkitReport {
    let mut report = ToolkitReport {
        total: tools.len(),
        valid: 0,
        invalid_count: 0,
        invalid: Vec::new(),
        categories: BTreeMap::new(),
    };

    for (index, tool) in tools.iter().enumerate() {
        *report.categories.entry(category_of(tool)).or_insert(0) += 1;

        match check_tool(tool) {
            Ok(()) => report.valid += 1,
            Err(reason) => {
                report.invalid_count += 1;
                if report.invalid.len() < MAX_REPORTED_INVALID {
                    report.invalid.push(InvalidTool {
                        index,
                        name: tool.get("name").and_then(Value::as_str).map(str::to_string),
                        reason,
                    });
                }
            }
        }
    }

    debug!(
        total = report.total,
        valid = report.valid,
        invalid = report.invalid_count,
        event = "toolkit_health",
        "Toolkit scan finished"
    );
    report
}

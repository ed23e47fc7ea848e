//! Vendor catalog loading.
//!
//! Vendor tool tables are plain JSON: either an array of tool objects or an
//! object with a `tools` array. Raw values are kept so the toolkit validator
//! can audit entries that fail to parse.

use crate::{
    error::{BrokerError, BrokerResult},
    logging,
    types::ToolSchema,
};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// Read one catalog file into raw tool values.
pub fn load_catalog_file(path: impl AsRef<Path>) -> BrokerResult<Vec<Value>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&raw)?;

    let tools = match document {
        Value::Array(tools) => tools,
        Value::Object(mut obj) => match obj.remove("tools") {
            Some(Value::Array(tools)) => tools,
            _ => {
                return Err(BrokerError::Config(format!(
                    "{} has no `tools` array",
                    path.display()
                )))
            }
        },
        _ => {
            return Err(BrokerError::Config(format!(
                "{} must hold a JSON array of tools",
                path.display()
            )))
        }
    };

    logging::log_catalog_loaded(&path.display().to_string(), tools.len());
    Ok(tools)
}

/// Read and concatenate several catalog files.
pub fn load_catalogs<P: AsRef<Path>>(paths: &[P]) -> BrokerResult<Vec<Value>> {
    let mut all = Vec::new();
    for path in paths {
        all.extend(load_catalog_file(path)?);
    }
    Ok(all)
}

/// Deserialize every entry that has the `ToolSchema` shape; the rest are logged and dropped.
pub fn parse_tools(raw: &[Value]) -> Vec<ToolSchema> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<ToolSchema>(value.clone()) {
            Ok(tool) => Some(tool),
            Err(e) => {
                warn!(
                    index = index,
                    error = %e,
                    event = "catalog_entry_rejected",
                    "Catalog entry is not a tool definition"
                );
                None
            }
        })
        .collect()
}

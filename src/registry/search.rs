//! Keyword ranking over the tool catalog.
//!
//! Each tool is indexed into four normalized text fields. A query term earns
//! one point for the first field it appears in, checked in the order name,
//! description, schema, category.

use crate::types::{MatchedField, SearchHit};
use serde_json::Value;
use std::cmp::Ordering;

/// Field order is part of the ranking contract.
pub(crate) const FIELD_ORDER: [MatchedField; 4] = [
    MatchedField::Name,
    MatchedField::Description,
    MatchedField::Schema,
    MatchedField::Category,
];

/// Normalized search text of one tool, in [`FIELD_ORDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexedFields([String; 4]);

impl IndexedFields {
    pub(crate) fn build(name: &str, description: &str, input_schema: &Value, category: &str) -> Self {
        Self([
            normalize_text(name),
            normalize_text(description),
            normalize_text(&schema_hint_text(input_schema)),
            normalize_text(category),
        ])
    }

    /// Score `terms` against this tool, returning the points and the fields that matched.
    pub(crate) fn score(&self, terms: &[String]) -> (usize, Vec<MatchedField>) {
        let mut score = 0;
        let mut matched = Vec::new();

        for term in terms {
            let hit = self
                .0
                .iter()
                .zip(FIELD_ORDER)
                .find(|(text, _)| text.contains(term.as_str()));

            if let Some((_, field)) = hit {
                score += 1;
                if !matched.contains(&field) {
                    matched.push(field);
                }
            }
        }

        matched.sort();
        (score, matched)
    }
}

/// Lowercase, turn `_`/`-` into spaces, drop other punctuation, collapse whitespace.
pub(crate) fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '_' | '-' => Some(' '),
            c if c.is_ascii_alphanumeric() || c.is_whitespace() => Some(c),
            _ => None,
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-split, de-duplicated query terms in first-seen order.
///
/// Each term goes through [`normalize_text`] so that `list_repos` matches the
/// normalized name `github list repos`. Terms that normalize to nothing are dropped.
pub(crate) fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in query.split_whitespace() {
        let term = normalize_text(raw);
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Property names, property descriptions and enum values of a top-level object schema.
pub(crate) fn schema_hint_text(schema: &Value) -> String {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return String::new();
    };

    let mut parts = Vec::new();
    for (name, property) in properties {
        parts.push(name.clone());

        if let Some(description) = property.get("description").and_then(Value::as_str) {
            parts.push(description.to_string());
        }

        if let Some(values) = property.get("enum").and_then(Value::as_array) {
            for value in values {
                match value {
                    Value::String(s) => parts.push(s.clone()),
                    Value::Null => {}
                    other => parts.push(other.to_string()),
                }
            }
        }
    }

    parts.join(" ")
}

/// Score descending, then category ascending, then tool name ascending.
pub(crate) fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.tool.name.cmp(&b.tool.name))
}

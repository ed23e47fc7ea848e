//! Caller identity helpers for the HTTP transport

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

/// API key from `x-api-key`, falling back to `Authorization: Bearer <key>`.
pub(crate) fn extract_api_key(api_key: Option<&str>, authorization: Option<&str>) -> Option<String> {
    if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    authorization.and_then(|value| {
        let value = value.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
    })
}

/// Stable, non-reversible label for a key, safe to log.
pub(crate) fn key_fingerprint(key: &str) -> String {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    format!("key-{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}

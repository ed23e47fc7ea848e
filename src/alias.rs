//! Short tool names and their canonical, category-prefixed targets.
//!
//! Callers may invoke a tool by a friendly alias (`list_repos`) and with
//! argument names that differ from the vendor's (`owner` vs `org`). The
//! resolver rewrites both before the broker validates the call.

use crate::error::{BrokerError, BrokerResult};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// How an alias rewrites the caller's arguments.
#[derive(Debug, Clone)]
pub enum ParamTransform {
    Identity,
    /// Move `from` to `to`. An explicit `to` supplied by the caller wins.
    RenameKey { from: String, to: String },
    /// Apply each step in order.
    Chain(Vec<ParamTransform>),
    /// Anything the other variants cannot express. Must be pure.
    Custom {
        label: &'static str,
        apply: fn(Value) -> Value,
    },
}

impl ParamTransform {
    pub fn rename(from: &str, to: &str) -> Self {
        Self::RenameKey {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn apply(&self, args: Value) -> Value {
        match self {
            Self::Identity => args,
            Self::RenameKey { from, to } => match args {
                Value::Object(mut map) => {
                    if let Some(value) = map.remove(from) {
                        map.entry(to.clone()).or_insert(value);
                    }
                    Value::Object(map)
                }
                other => other,
            },
            Self::Chain(steps) => steps.iter().fold(args, |acc, step| step.apply(acc)),
            Self::Custom { apply, .. } => apply(args),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TransformView<'a> {
    Identity,
    RenameKey { from: &'a str, to: &'a str },
    Chain { steps: &'a [ParamTransform] },
    Custom { label: &'a str },
}

impl Serialize for ParamTransform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = match self {
            Self::Identity => TransformView::Identity,
            Self::RenameKey { from, to } => TransformView::RenameKey { from, to },
            Self::Chain(steps) => TransformView::Chain { steps },
            Self::Custom { label, .. } => TransformView::Custom { label },
        };
        view.serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AliasEntry {
    pub alias: String,
    pub canonical: String,
    pub transform: ParamTransform,
}

impl AliasEntry {
    pub fn new(alias: &str, canonical: &str) -> Self {
        Self {
            alias: alias.to_string(),
            canonical: canonical.to_string(),
            transform: ParamTransform::Identity,
        }
    }

    pub fn with_transform(mut self, transform: ParamTransform) -> Self {
        self.transform = transform;
        self
    }
}

/// Curated discovery metadata for an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasMetadata {
    pub alias: String,
    pub intent: String,
    pub tags: Vec<String>,
    pub description: String,
}

impl AliasMetadata {
    pub fn new(alias: &str, intent: &str, tags: &[&str], description: &str) -> Self {
        Self {
            alias: alias.to_string(),
            intent: intent.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentField {
    Intent,
    Tags,
    Description,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMatch {
    pub alias: String,
    pub canonical: Option<String>,
    pub matched_field: IntentField,
    pub metadata: AliasMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    entries: HashMap<String, AliasEntry>,
    metadata: Vec<AliasMetadata>,
}

impl AliasResolver {
    /// Build a resolver, rejecting tables where an alias targets another alias.
    pub fn new(entries: Vec<AliasEntry>, metadata: Vec<AliasMetadata>) -> BrokerResult<Self> {
        validate_entries(&entries)?;
        Ok(Self::from_parts(entries, metadata))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The curated alias table shipped with the broker.
    pub fn builtin() -> Self {
        Self::from_parts(builtin_entries(), builtin_metadata())
    }

    fn from_parts(entries: Vec<AliasEntry>, metadata: Vec<AliasMetadata>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.alias.clone(), e)).collect(),
            metadata,
        }
    }

    /// Canonical name for `name`, or `name` itself when it is not an alias.
    pub fn resolve_tool_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .get(name)
            .map(|e| e.canonical.as_str())
            .unwrap_or(name)
    }

    /// Rewrite `args` with the transform registered for the original `name`.
    pub fn map_parameters(&self, name: &str, args: Value) -> Value {
        match self.entries.get(name) {
            Some(entry) => entry.transform.apply(args),
            None => args,
        }
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All aliases sorted by short name.
    pub fn get_all_aliases(&self) -> Vec<&AliasEntry> {
        let mut entries: Vec<&AliasEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.alias.cmp(&b.alias));
        entries
    }

    /// Substring search over the curated metadata. Each entry reports the first
    /// of intent, tags, description that contains the query.
    pub fn search_by_intent(&self, query: &str) -> Vec<IntentMatch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<IntentMatch> = self
            .metadata
            .iter()
            .filter_map(|meta| {
                let field = if meta.intent.to_lowercase().contains(&needle) {
                    IntentField::Intent
                } else if meta.tags.iter().any(|t| t.to_lowercase().contains(&needle)) {
                    IntentField::Tags
                } else if meta.description.to_lowercase().contains(&needle) {
                    IntentField::Description
                } else {
                    return None;
                };

                Some(IntentMatch {
                    alias: meta.alias.clone(),
                    canonical: self.entries.get(&meta.alias).map(|e| e.canonical.clone()),
                    matched_field: field,
                    metadata: meta.clone(),
                })
            })
            .collect();

        matches.sort_by(|a, b| a.matched_field.cmp(&b.matched_field).then_with(|| a.alias.cmp(&b.alias)));
        matches
    }
}

fn validate_entries(entries: &[AliasEntry]) -> BrokerResult<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for entry in entries {
        if entry.alias.is_empty() || entry.canonical.is_empty() {
            return Err(BrokerError::InvalidAlias("alias and target must be non-empty".to_string()));
        }
        if let Some(previous) = seen.insert(entry.alias.as_str(), entry.canonical.as_str()) {
            return Err(BrokerError::InvalidAlias(format!(
                "'{}' is declared twice (targets '{}' and '{}')",
                entry.alias, previous, entry.canonical
            )));
        }
    }

    for entry in entries {
        if entry.alias != entry.canonical && seen.contains_key(entry.canonical.as_str()) {
            return Err(BrokerError::InvalidAlias(format!(
                "'{}' targets '{}', which is itself an alias",
                entry.alias, entry.canonical
            )));
        }
    }

    Ok(())
}

fn default_currency_usd(args: Value) -> Value {
    match args {
        Value::Object(mut map) => {
            map.entry("currency").or_insert_with(|| Value::String("usd".to_string()));
            Value::Object(map)
        }
        Value::Null => {
            let mut map = Map::new();
            map.insert("currency".to_string(), Value::String("usd".to_string()));
            Value::Object(map)
        }
        other => other,
    }
}

pub(crate) fn builtin_entries() -> Vec<AliasEntry> {
    vec![
        AliasEntry::new("list_repos", "github_list_repos"),
        AliasEntry::new("create_issue", "github_create_issue"),
        AliasEntry::new("list_org_repos", "github_list_org_repos")
            .with_transform(ParamTransform::rename("owner", "org")),
        AliasEntry::new("deploy", "vercel_create_deployment")
            .with_transform(ParamTransform::rename("project", "name")),
        AliasEntry::new("list_deployments", "vercel_list_deployments"),
        AliasEntry::new("create_customer", "stripe_create_customer"),
        AliasEntry::new("charge", "stripe_create_payment_intent").with_transform(ParamTransform::Chain(vec![
            ParamTransform::rename("amount_cents", "amount"),
            ParamTransform::Custom {
                label: "default_currency_usd",
                apply: default_currency_usd,
            },
        ])),
        AliasEntry::new("send_sms", "twilio_send_message")
            .with_transform(ParamTransform::rename("message", "body")),
        AliasEntry::new("purge_cache", "cloudflare_purge_cache"),
        AliasEntry::new("list_workers", "workers_list_scripts"),
        AliasEntry::new("post_message", "slack_post_message")
            .with_transform(ParamTransform::rename("text", "message")),
        AliasEntry::new("run_sql", "supabase_execute_sql")
            .with_transform(ParamTransform::rename("sql", "query")),
    ]
}

pub(crate) fn builtin_metadata() -> Vec<AliasMetadata> {
    vec![
        AliasMetadata::new("list_repos", "list repositories", &["github", "git", "code"], "List repositories for the authenticated user"),
        AliasMetadata::new("create_issue", "open an issue", &["github", "bug", "tracking"], "Create an issue in a GitHub repository"),
        AliasMetadata::new("list_org_repos", "list organization repositories", &["github", "org"], "List repositories owned by an organization"),
        AliasMetadata::new("deploy", "deploy a project", &["vercel", "release", "hosting"], "Create a new Vercel deployment"),
        AliasMetadata::new("list_deployments", "list deployments", &["vercel", "hosting"], "List recent Vercel deployments"),
        AliasMetadata::new("create_customer", "create a customer", &["stripe", "billing"], "Create a Stripe customer record"),
        AliasMetadata::new("charge", "take a payment", &["stripe", "billing", "payments"], "Create a payment intent, defaulting to USD"),
        AliasMetadata::new("send_sms", "send a text message", &["twilio", "sms", "messaging"], "Send an SMS through Twilio"),
        AliasMetadata::new("purge_cache", "purge the CDN cache", &["cloudflare", "cdn"], "Purge cached files for a Cloudflare zone"),
        AliasMetadata::new("list_workers", "list worker scripts", &["cloudflare", "serverless"], "List Cloudflare Workers scripts"),
        AliasMetadata::new("post_message", "post to a channel", &["slack", "chat", "messaging"], "Post a message to a Slack channel"),
        AliasMetadata::new("run_sql", "run a SQL query", &["supabase", "database", "postgres"], "Execute SQL against a Supabase project"),
    ]
}

//! Category metadata and name-prefix categorisation.
//!
//! Every tool name starts with `<category>_`. A handful of vendors ship
//! several product lines under their own leading words (`workers_`, `r2_`,
//! ...); those grouped prefixes map back to one parent category and become
//! that category's subcategories.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+$").expect("category pattern is valid"));

/// Human-facing metadata for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMetadata {
    pub display_name: String,
    pub description: String,
    /// Environment variables the vendor's executor reads credentials from
    pub credential_env: Vec<String>,
    pub supports_subcategories: bool,
}

impl CategoryMetadata {
    pub fn new(display_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: description.into(),
            credential_env: Vec::new(),
            supports_subcategories: false,
        }
    }

    pub fn with_credentials(mut self, vars: &[&str]) -> Self {
        self.credential_env = vars.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_subcategories(mut self) -> Self {
        self.supports_subcategories = true;
        self
    }
}

/// Where a category's metadata came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMetadataSource {
    Predefined(CategoryMetadata),
    Synthesized(CategoryMetadata),
}

impl CategoryMetadataSource {
    pub fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized(_))
    }

    pub fn into_metadata(self) -> CategoryMetadata {
        match self {
            Self::Predefined(meta) | Self::Synthesized(meta) => meta,
        }
    }
}

/// Why a tool name yielded no category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRejection {
    NoUnderscore,
    InvalidCharacters(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupedPrefix {
    /// Leading word including the trailing underscore, e.g. `workers_`
    prefix: String,
    parent: String,
}

/// Predefined category metadata plus the grouped-vendor prefix table.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    metadata: HashMap<String, CategoryMetadata>,
    grouped_prefixes: Vec<GroupedPrefix>,
}

impl CategoryCatalog {
    /// A catalog with no predefined categories; everything is synthesized.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The vendors this broker ships metadata for.
    pub fn builtin() -> Self {
        Self::empty()
            .with_category(
                "github",
                CategoryMetadata::new("GitHub", "Repositories, issues, pull requests and actions")
                    .with_credentials(&["GITHUB_TOKEN"]),
            )
            .with_category(
                "gitlab",
                CategoryMetadata::new("GitLab", "Projects, merge requests and pipelines")
                    .with_credentials(&["GITLAB_TOKEN"]),
            )
            .with_category(
                "vercel",
                CategoryMetadata::new("Vercel", "Deployments, projects, domains and env vars")
                    .with_credentials(&["VERCEL_TOKEN"]),
            )
            .with_category(
                "netlify",
                CategoryMetadata::new("Netlify", "Sites, deploys and build hooks")
                    .with_credentials(&["NETLIFY_AUTH_TOKEN"]),
            )
            .with_category(
                "stripe",
                CategoryMetadata::new("Stripe", "Payments, customers, subscriptions and invoices")
                    .with_credentials(&["STRIPE_SECRET_KEY"]),
            )
            .with_category(
                "cloudflare",
                CategoryMetadata::new("Cloudflare", "Zones, DNS, Workers, R2, KV, D1 and Pages")
                    .with_credentials(&["CLOUDFLARE_API_TOKEN", "CLOUDFLARE_ACCOUNT_ID"])
                    .with_subcategories(),
            )
            .with_grouped_prefix("workers_", "cloudflare")
            .with_grouped_prefix("r2_", "cloudflare")
            .with_grouped_prefix("kv_", "cloudflare")
            .with_grouped_prefix("d1_", "cloudflare")
            .with_grouped_prefix("pages_", "cloudflare")
            .with_category(
                "supabase",
                CategoryMetadata::new("Supabase", "Projects, databases, auth and storage")
                    .with_credentials(&["SUPABASE_ACCESS_TOKEN"]),
            )
            .with_category(
                "twilio",
                CategoryMetadata::new("Twilio", "SMS, voice and messaging services")
                    .with_credentials(&["TWILIO_ACCOUNT_SID", "TWILIO_AUTH_TOKEN"]),
            )
            .with_category(
                "slack",
                CategoryMetadata::new("Slack", "Channels, messages and users")
                    .with_credentials(&["SLACK_BOT_TOKEN"]),
            )
            .with_category(
                "linear",
                CategoryMetadata::new("Linear", "Issues, projects and cycles")
                    .with_credentials(&["LINEAR_API_KEY"]),
            )
            .with_category(
                "notion",
                CategoryMetadata::new("Notion", "Pages, databases and blocks")
                    .with_credentials(&["NOTION_API_KEY"]),
            )
            .with_category(
                "sendgrid",
                CategoryMetadata::new("SendGrid", "Transactional email and contacts")
                    .with_credentials(&["SENDGRID_API_KEY"]),
            )
            .with_category(
                "google",
                CategoryMetadata::new("Google Workspace", "Gmail, Drive, Calendar and Sheets")
                    .with_credentials(&["GOOGLE_OAUTH_TOKEN"])
                    .with_subcategories(),
            )
            .with_grouped_prefix("gmail_", "google")
            .with_grouped_prefix("gdrive_", "google")
            .with_grouped_prefix("gcal_", "google")
            .with_grouped_prefix("sheets_", "google")
    }

    pub fn with_category(mut self, name: &str, metadata: CategoryMetadata) -> Self {
        self.metadata.insert(name.to_string(), metadata);
        self
    }

    /// Map tools starting with `prefix` (e.g. `"workers_"`) to `parent`.
    pub fn with_grouped_prefix(mut self, prefix: &str, parent: &str) -> Self {
        let prefix = if prefix.ends_with('_') {
            prefix.to_string()
        } else {
            format!("{prefix}_")
        };
        self.grouped_prefixes.retain(|g| g.prefix != prefix);
        self.grouped_prefixes.push(GroupedPrefix {
            prefix,
            parent: parent.to_string(),
        });
        // Longest prefix wins when two overlap
        self.grouped_prefixes
            .sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()).then(a.prefix.cmp(&b.prefix)));
        self
    }

    /// Predefined metadata if known, otherwise a synthesized default.
    pub fn metadata_for(&self, name: &str) -> CategoryMetadataSource {
        match self.metadata.get(name) {
            Some(meta) => CategoryMetadataSource::Predefined(meta.clone()),
            None => CategoryMetadataSource::Synthesized(synthesize_metadata(name)),
        }
    }

    /// Whether `name` is predefined with grouped subcategories.
    pub fn supports_subcategories(&self, name: &str) -> bool {
        self.metadata
            .get(name)
            .is_some_and(|m| m.supports_subcategories)
    }

    pub fn credential_env(&self, name: &str) -> &[String] {
        self.metadata
            .get(name)
            .map(|m| m.credential_env.as_slice())
            .unwrap_or(&[])
    }

    fn grouped_prefix(&self, tool_name: &str) -> Option<&GroupedPrefix> {
        self.grouped_prefixes
            .iter()
            .find(|g| tool_name.starts_with(g.prefix.as_str()))
    }

    /// Derive the category of `tool_name`.
    pub fn derive_category(&self, tool_name: &str) -> Result<String, CategoryRejection> {
        if !tool_name.contains('_') {
            return Err(CategoryRejection::NoUnderscore);
        }

        if let Some(grouped) = self.grouped_prefix(tool_name) {
            return Ok(grouped.parent.clone());
        }

        let candidate = tool_name.split('_').next().unwrap_or_default();
        if CATEGORY_RE.is_match(candidate) {
            Ok(candidate.to_string())
        } else {
            Err(CategoryRejection::InvalidCharacters(candidate.to_string()))
        }
    }

    /// The grouped-vendor product line of `tool_name`, if any.
    pub fn derive_subcategory(&self, tool_name: &str) -> Option<String> {
        self.grouped_prefix(tool_name)
            .map(|g| g.prefix.trim_end_matches('_').to_string())
    }
}

/// Upper-case the first character.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Default metadata for a category nobody declared.
pub fn synthesize_metadata(name: &str) -> CategoryMetadata {
    let display_name = capitalize(name);
    let description = format!("{display_name} integration tools");
    CategoryMetadata::new(display_name, description)
}

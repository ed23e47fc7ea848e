//! Search Ranking Benchmarks
//!
//! Keyword search and bulk registration over a synthetic catalog of several
//! thousand tools spread across many vendor categories.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use toolbroker::{ToolRegistry, ToolSchema};

const VENDORS: &[&str] = &[
    "github", "gitlab", "vercel", "netlify", "stripe", "cloudflare", "supabase", "twilio", "slack",
    "linear", "notion", "sendgrid", "acme", "globex", "initech", "umbrella",
];

const VERBS: &[&str] = &["list", "get", "create", "update", "delete", "search", "sync", "export"];

const NOUNS: &[&str] = &[
    "repos", "issues", "deployments", "customers", "invoices", "messages", "channels", "domains",
    "records", "webhooks", "users", "projects", "buckets", "scripts", "tables", "secrets",
];

/// Every vendor × verb × noun combination, with a few schema properties each
fn synthetic_catalog() -> Vec<ToolSchema> {
    let mut tools = Vec::new();
    for vendor in VENDORS {
        for verb in VERBS {
            for noun in NOUNS {
                tools.push(ToolSchema::new(
                    format!("{vendor}_{verb}_{noun}"),
                    format!("{verb} {noun} in your {vendor} account"),
                    json!({
                        "type": "object",
                        "properties": {
                            "limit": {"type": "integer", "description": "Page size"},
                            "status": {"type": "string", "enum": ["active", "archived"]},
                            "owner": {"type": "string", "description": format!("{vendor} owner")}
                        }
                    }),
                ));
            }
        }
    }
    tools
}

fn benchmark_search(c: &mut Criterion) {
    let mut registry = ToolRegistry::new();
    registry.bulk_register_tools(synthetic_catalog());

    let mut group = c.benchmark_group("search_tools");

    let queries = [
        ("single_term", "invoices"),
        ("two_terms", "list repos"),
        ("schema_hit", "archived"),
        ("no_match", "kubernetes"),
        ("broad", "list get create account"),
    ];

    for (name, query) in &queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, query| {
            b.iter(|| black_box(registry.search_tools(black_box(query), 10)))
        });
    }

    group.finish();
}

fn benchmark_registration(c: &mut Criterion) {
    let catalog = synthetic_catalog();

    c.bench_function("bulk_register_tools", |b| {
        b.iter(|| {
            let mut registry = ToolRegistry::new();
            black_box(registry.bulk_register_tools(catalog.iter().cloned()))
        })
    });
}

criterion_group!(benches, benchmark_search, benchmark_registration);
criterion_main!(benches);

//! Project directory example: load files, compose, and print a JSON report.
//!
//! The directory must hold `catalog.{ron,toml,json}` and `unit.json`, and may
//! hold `compose.*` and `wiring.*`.
//!
//! Run with:
//! `cargo run -p gridforge-examples --example project_report -- <dir> [required/s]`

use std::path::PathBuf;

use gridforge_core::fixed::f64_to_fixed64;
use gridforge_data::load_project;
use gridforge_flow::analyze_flow;
use gridforge_spatial::Compositor;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next().map(PathBuf::from) else {
        eprintln!("usage: project_report <dir> [required/s]");
        std::process::exit(2);
    };
    let required: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0.0);

    let project = match load_project(&dir) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "failed to load project");
            std::process::exit(1);
        }
    };

    let layout = match Compositor::new(&project.catalog)
        .with_wiring(project.wiring)
        .compose(&project.unit, &project.params)
    {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "composition failed");
            std::process::exit(1);
        }
    };
    let report = analyze_flow(&layout.entities, &project.catalog, f64_to_fixed64(required));

    let summary = serde_json::json!({
        "entities": layout.entities.len(),
        "wires": layout.wire_tuples(),
        "layout_diagnostics": layout.diagnostics,
        "load_diagnostics": project.diagnostics,
        "flow": report,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize report"),
    }
}

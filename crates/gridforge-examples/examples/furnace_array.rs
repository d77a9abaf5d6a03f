//! Furnace array example: compose, repair, wire, and analyze.
//!
//! Builds a small furnace cell, tiles it into two mirrored rows sharing a
//! seam, prints the wiring and the belt flow report, and writes the layout
//! as raw entity records.
//!
//! Run with: `cargo run -p gridforge-examples --example furnace_array`
//! Set `RUST_LOG=debug` to see the pipeline summaries.

use std::collections::BTreeSet;

use gridforge_core::fixed::{f64_to_fixed64, fixed64_to_f64};
use gridforge_core::record::to_records;
use gridforge_core::{Entity, EntityCatalog, Orientation, Role};
use gridforge_flow::analyze_flow;
use gridforge_spatial::{ComposeParams, compose};

fn catalog() -> EntityCatalog {
    EntityCatalog::builder()
        .with_role("stone-furnace", (2, 2), Role::Producer, 10)
        .with_role("inserter", (1, 1), Role::Transfer, 5)
        .with_role("medium-electric-pole", (1, 1), Role::DistributionNode, 3)
        .transport("transport-belt", f64_to_fixed64(15.0), 1)
        .transport("fast-transport-belt", f64_to_fixed64(30.0), 1)
        .build()
}

/// ```text
///   B B B
///   I . P
///   F F .
///   F F .
/// ```
fn unit() -> Vec<Entity> {
    let mut unit: Vec<Entity> = (0..3)
        .map(|x| {
            Entity::new("fast-transport-belt", f64::from(x) + 0.5, 0.5)
                .with_orientation(Orientation::East)
        })
        .collect();
    unit.push(Entity::new("inserter", 0.5, 1.5));
    unit.push(Entity::new("medium-electric-pole", 2.5, 1.5));
    unit.push(Entity::new("stone-furnace", 1.0, 3.0));
    unit
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let catalog = catalog();

    // --- Compose ---

    println!("=== Composing 2 x 6 furnace array ===\n");
    let params = ComposeParams {
        spacing_x: 0.0,
        spacing_y: 0.0,
        per_row_flip: BTreeSet::from([1]),
        ..ComposeParams::grid(2, 6)
    };
    let layout = compose(&unit(), &params, &catalog).expect("compose furnace array");
    println!("Entities:    {}", layout.entities.len());
    println!("Directed:    {}", layout.is_fully_directed());
    println!("Diagnostics: {}", layout.diagnostics.len());

    // --- Wiring ---

    println!("\n=== Wires ===\n");
    for [a, pa, b, pb] in layout.wire_tuples() {
        println!("  {a:>3}:{pa} -- {b:>3}:{pb}");
    }

    // --- Flow ---

    println!("\n=== Flow ===\n");
    let report = analyze_flow(&layout.entities, &catalog, f64_to_fixed64(45.0));
    for (i, c) in report.components.iter().enumerate() {
        println!(
            "  component {i}: {} tiles, {:?}, {} lanes, {}/s at ({:.1}, {:.1})",
            c.size,
            c.axis,
            c.lanes.len(),
            fixed64_to_f64(c.capacity),
            c.centroid.x,
            c.centroid.y,
        );
    }
    println!("  supplies:   {:?}", report.supply_components);
    println!("  drain:      {:?}", report.drain_component);
    println!(
        "  supplied:   {}/s",
        fixed64_to_f64(report.supplied_capacity_per_second)
    );
    println!("  bottleneck: {}", report.bottleneck);

    // --- Records ---

    println!("\n=== First records ===\n");
    let records = to_records(&layout.entities[..4]);
    println!(
        "{}",
        serde_json::to_string_pretty(&records).expect("serialize records")
    );
}

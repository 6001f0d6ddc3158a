use clap::Parser;
use diagrammer::catalog::{AttributeKind, ComponentType};
use diagrammer::diagram::PlacementEngine;
use diagrammer::prelude::*;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::fs;

/// A CLI tool to generate random migration diagrams for the diagrammer CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_diagram.json")]
    output: String,

    /// Number of components on the Source canvas
    #[arg(long, default_value_t = 4)]
    source: usize,

    /// Number of components on the Target canvas
    #[arg(long, default_value_t = 3)]
    target: usize,

    /// Probability that a component gets a complete checklist
    #[arg(long, default_value_t = 1.0)]
    detailed: f64,

    /// Seed for reproducible diagrams
    #[arg(long)]
    seed: Option<u64>,
}

const SOURCE_TYPES: &[ComponentType] = &[
    ComponentType::OnPremServer,
    ComponentType::OnPremDatabase,
    ComponentType::LoadBalancer,
    ComponentType::NetworkGateway,
];

const TARGET_TYPES: &[ComponentType] = &[
    ComponentType::CloudCompute,
    ComponentType::ManagedDatabase,
    ComponentType::LoadBalancerTarget,
    ComponentType::VirtualNetwork,
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.detailed) {
        eprintln!(
            "Error: --detailed ({}) must lie between 0 and 1",
            cli.detailed
        );
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(
        "Generating new diagram ({} source, {} target component(s))...",
        cli.source, cli.target
    );

    let mut document = ArchitectureDocument::new();
    let source_ids = populate(&mut document, &mut rng, Phase::Source, cli.source, cli.detailed)?;
    println!("-> Generated Source canvas.");
    let target_ids = populate(&mut document, &mut rng, Phase::Target, cli.target, cli.detailed)?;
    println!("-> Generated Target canvas.");

    let wired = chain(&mut document, &source_ids)? + chain(&mut document, &target_ids)?;
    println!("-> Generated {} connection(s).", wired);

    let json_output = serde_json::to_string_pretty(&document)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved diagram to '{}'",
        cli.output
    );

    Ok(())
}

/// Places `count` random components on `phase` and returns their ids.
fn populate(
    document: &mut ArchitectureDocument,
    rng: &mut StdRng,
    phase: Phase,
    count: usize,
    detailed: f64,
) -> Result<Vec<String>> {
    // Auto-migrate keeps the Target canvas unlocked while generating.
    let engine = PlacementEngine::new(PhasePolicy::AutoMigrate, true, 96.0);
    let canvas = CanvasRect {
        left: 0.0,
        top: 0.0,
        width: 1000.0,
        height: 700.0,
    };
    let types = match phase {
        Phase::Source => SOURCE_TYPES,
        Phase::Target => TARGET_TYPES,
    };

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let component_type = *types.choose(rng).ok_or("empty component list")?;
        let point = DropPoint {
            x: rng.random_range(0.0..canvas.width),
            y: rng.random_range(0.0..canvas.height),
        };
        let placed = engine.place_node(document, component_type, phase, &canvas, point)?;
        if rng.random_bool(detailed) {
            document.save_details(&placed.node.id, generate_details(rng, component_type))?;
        }
        ids.push(placed.node.id);
    }
    Ok(ids)
}

/// Connects the nodes in a line so no node is left isolated.
fn chain(document: &mut ArchitectureDocument, ids: &[String]) -> Result<usize> {
    let mut wired = 0;
    for pair in ids.windows(2) {
        document.connect(&pair[0], &pair[1])?;
        wired += 1;
    }
    Ok(wired)
}

/// Fills every checklist attribute of `component_type` with a plausible value.
fn generate_details(rng: &mut StdRng, component_type: ComponentType) -> Details {
    component_type
        .required_attributes()
        .iter()
        .map(|attr| {
            let value = match attr.kind {
                AttributeKind::Text => Value::from(sample_text(rng, attr.name)),
                AttributeKind::Number => Value::from(sample_number(rng, attr.name)),
                AttributeKind::Boolean => Value::from(rng.random_bool(0.5)),
            };
            (attr.name.to_string(), value)
        })
        .collect()
}

fn sample_text(rng: &mut StdRng, attribute: &str) -> String {
    let options: &[&str] = match attribute {
        "hostname" => &["app01.corp.local", "web02.corp.local", "batch03.corp.local"],
        "operatingSystem" => &["Ubuntu 22.04", "RHEL 8", "Windows Server 2019"],
        "engine" => &["PostgreSQL", "MySQL", "SQL Server"],
        "engineVersion" => &["13.4", "8.0", "2019"],
        "protocol" => &["HTTP", "HTTPS", "TCP"],
        "instanceType" => &["m5.large", "c6i.xlarge", "t3.medium"],
        "imageId" => &["ami-0a1b2c3d", "ami-4e5f6a7b"],
        "instanceClass" => &["db.r6g.large", "db.m5.xlarge"],
        "targetGroupName" => &["web-tg", "api-tg"],
        "healthCheckPath" => &["/health", "/status"],
        "cidrBlock" => &["10.0.0.0/16", "172.16.0.0/16"],
        _ => &["value"],
    };
    options.choose(rng).copied().unwrap_or("value").to_string()
}

fn sample_number(rng: &mut StdRng, attribute: &str) -> u64 {
    match attribute {
        "cpuCores" | "vcpus" => rng.random_range(1..=32),
        "memoryGb" => rng.random_range(2..=256),
        "storageGb" | "allocatedStorageGb" => rng.random_range(20..=2000),
        "port" => *[5432u64, 3306, 1433].choose(rng).unwrap_or(&5432),
        "listenerPort" | "targetPort" => *[80u64, 443, 8080].choose(rng).unwrap_or(&80),
        "subnetCount" => rng.random_range(1..=6),
        _ => rng.random_range(1..=100),
    }
}

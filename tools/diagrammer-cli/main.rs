use chrono::Local;
use clap::{Parser, ValueEnum};
use diagrammer::migration::AdvancementLoop;
use diagrammer::prelude::*;
use diagrammer::validation;
use fern::Dispatch;
use itertools::Itertools;
use log::LevelFilter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Phase policy as accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyCli {
    /// Moving a node onto the Target canvas starts its migration
    Auto,
    /// Confirm the Source canvas first, then kick off explicitly
    Staged,
}

/// Validates a migration diagram and optionally simulates its migration
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the diagram JSON file
    diagram_path: String,

    /// Optional path to an editor config JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides the phase policy from the config
    #[arg(short, long, value_enum)]
    policy: Option<PolicyCli>,

    /// Confirm the source, kick off the migration and tick it to completion
    #[arg(short, long)]
    simulate: bool,

    /// Seed for the cutover draw, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the tick interval from the config, in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EditorConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config.phase_policy = match policy {
            PolicyCli::Auto => PhasePolicy::AutoMigrate,
            PolicyCli::Staged => PhasePolicy::ConfirmThenKickoff,
        };
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_interval_ms = tick_ms;
    }

    let diagram_json = fs::read_to_string(&cli.diagram_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read diagram file '{}': {}",
            &cli.diagram_path, e
        ))
    });
    let document: ArchitectureDocument = serde_json::from_str(&diagram_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse diagram JSON: {}", e)));

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let orchestrator = Orchestrator::with_rng(&config, rng);
    let mut editor = Editor::with_orchestrator(config.clone(), orchestrator);
    editor.replace_document(document);
    editor.mark_ready();

    print_validation(&editor);

    if cli.simulate {
        run_simulation(editor, config.tick_interval());
    }
}

fn print_validation(editor: &Editor) {
    let document = editor.document();
    println!(
        "\nDiagram: {} node(s), {} connection(s), source confirmed: {}",
        document.nodes.len(),
        document.connections.len(),
        document.source_confirmed
    );

    for phase in [Phase::Source, Phase::Target] {
        let report = editor.validate(phase);
        println!("\n--- {} Canvas ---", phase);
        for node in document.nodes_in(phase) {
            let missing = validation::missing_attributes(node);
            if missing.is_empty() {
                println!("  [ok] {} ({})", node.name, node.component_type);
            } else {
                println!(
                    "  [..] {} ({}) missing: {}",
                    node.name,
                    node.component_type,
                    missing.iter().map(|a| a.name).join(", ")
                );
            }
        }
        if !report.isolated_node_ids.is_empty() {
            println!("  Isolated: {}", report.isolated_node_ids.join(", "));
        }
        println!(
            "  Warnings: {}  Errors: {}  Complete: {}",
            report.warnings, report.errors, report.is_complete
        );
    }
}

fn run_simulation(mut editor: Editor, tick: Duration) {
    if !editor.document().source_confirmed {
        editor.confirm_source().unwrap_or_else(|e| {
            exit_with_error(&format!("Source architecture not ready: {}", e))
        });
    }
    let jobs = editor
        .kickoff()
        .unwrap_or_else(|e| exit_with_error(&format!("Kickoff rejected: {}", e)));

    println!("\nStarting migration of {} component(s)...", jobs.len());
    for job in &jobs {
        println!(
            "  {} -> {} [{}]",
            job.source_component_name, job.target_component_name, job.external_job_id
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));

    let start = Instant::now();
    let (jobs, notices) = runtime.block_on(async move {
        let editor = Arc::new(Mutex::new(editor));
        let ticker = AdvancementLoop::spawn(Arc::clone(&editor), tick);
        while ticker.is_running() {
            tokio::time::sleep(tick).await;
            print_jobs(editor.lock().await.jobs(), start.elapsed());
        }
        let mut editor = editor.lock().await;
        (editor.jobs().to_vec(), editor.take_notices())
    });

    for notice in &notices {
        println!("{}", notice);
    }

    let (completed, failed): (Vec<_>, Vec<_>) = jobs
        .iter()
        .partition(|j| j.status == JobStatus::Completed);

    println!("\n--- Migration Summary ---");
    println!("Completed: {}", completed.len());
    println!("Failed:    {}", failed.len());
    println!("Duration:  {:?}", start.elapsed());
}

fn print_jobs(jobs: &[MigrationJob], elapsed: Duration) {
    println!("\n[{:>6.1}s]", elapsed.as_secs_f64());
    for job in jobs {
        println!("  {:<20} {}", job.source_component_name, job.status.label());
    }
}

/// Console logger; `RUST_LOG` wins over `--verbose`.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let level_filter = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    let colors = fern::colors::ColoredLevelConfig::new()
        .error(fern::colors::Color::Red)
        .warn(fern::colors::Color::Yellow)
        .info(fern::colors::Color::Green)
        .debug(fern::colors::Color::Blue)
        .trace(fern::colors::Color::BrightBlack);

    Dispatch::new()
        .level(level_filter)
        .level_for("tokio", LevelFilter::Warn)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr())
        .apply()
        .unwrap_or_else(|e| {
            eprintln!("Failed to apply logger configuration: {}", e);
        });
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use patron_registry::{ImportReport, PatronImporter, PatronRegistry, RegistryConfig, Session};

/// Library patron registry
#[derive(Parser, Debug)]
#[command(name = "patron-registry")]
#[command(about = "Manage library patrons: bulk import, manual entry, removal, listing")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PATRON_REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive numbered menu (default)
    Menu,

    /// Import files into a fresh registry and print the diagnostics
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the import reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import files, then browse the registry in a terminal UI
    Browse {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        RegistryConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Logs go to stderr; stdout is for diagnostics and listings
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str())),
        )
        .with_writer(io::stderr)
        .init();

    info!(version = patron_registry::VERSION, "patron-registry starting");

    let importer = PatronImporter::from_config(&config);

    match args.command.unwrap_or(Command::Menu) {
        Command::Menu => run_menu(importer),
        Command::Import { files, json } => run_import(importer, &files, json),
        Command::Browse { files } => run_browse(importer, &files),
    }
}

fn run_menu(importer: PatronImporter) -> Result<()> {
    let stdin = io::stdin();
    let mut session = Session::new(importer, stdin.lock(), io::stdout());
    session.run().context("Interactive session failed")?;
    Ok(())
}

fn import_all(
    importer: &PatronImporter,
    files: &[PathBuf],
    registry: &mut PatronRegistry,
) -> Vec<ImportReport> {
    files
        .iter()
        .map(|file| importer.import_file(file, registry))
        .collect()
}

fn run_import(importer: PatronImporter, files: &[PathBuf], json: bool) -> Result<()> {
    let mut registry = PatronRegistry::new();
    let reports = import_all(&importer, files, &mut registry);

    if json {
        let out = serde_json::to_string_pretty(&reports).context("Failed to encode reports")?;
        println!("{}", out);
        return Ok(());
    }

    for report in &reports {
        println!("\n📂 {}", report.source);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for message in report.messages() {
            println!("{}", message);
        }
        println!("✓ {}", report.summary());
        if let Some(hash) = &report.source_sha256 {
            println!("  sha256: {}", hash);
        }
    }

    println!("\n📋 Registry ({} patrons)", registry.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if registry.is_empty() {
        println!("No patrons in the system.");
    }
    let mut patrons: Vec<_> = registry.all().collect();
    patrons.sort_by(|a, b| a.id().cmp(b.id()));
    for patron in patrons {
        println!("{}", patron);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_browse(importer: PatronImporter, files: &[PathBuf]) -> Result<()> {
    let mut registry = PatronRegistry::new();
    let reports = import_all(&importer, files, &mut registry);

    let mut app = patron_registry::ui::App::new(&registry, reports);
    patron_registry::ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_browse(_importer: PatronImporter, _files: &[PathBuf]) -> Result<()> {
    anyhow::bail!("TUI mode not available. Rebuild with: cargo build --features tui")
}

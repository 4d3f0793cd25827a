//! discovery-router command line.
//!
//! ```text
//! discovery-router routes --config router.toml        print synthesized directives
//! discovery-router lookup --config router.toml <path> match one request path
//! discovery-router watch  --config router.toml        rebuild on catalog change
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use discovery_router::config::{load_config, RouterConfig};
use discovery_router::discovery::{load_catalog, CatalogWatcher};
use discovery_router::lifecycle::{signals, Reloader, Shutdown};
use discovery_router::observability::logging;
use discovery_router::routing::{builtin_registry, RoutingTable, SharedTable};
use discovery_router::synthesis::Synthesizer;

#[derive(Parser)]
#[command(name = "discovery-router")]
#[command(about = "Route synthesis and matching from a service-discovery catalog", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one route directive per routable catalog record
    Routes,
    /// Match a request path against the compiled routing table
    Lookup {
        /// Request path, e.g. /prod/users/42
        path: String,
    },
    /// Keep the routing table in sync with the catalog file
    Watch,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    tracing::debug!(
        config = ?cli.config,
        env = %config.discovery.env,
        matcher = %config.discovery.matcher,
        "Configuration loaded"
    );

    let synthesizer = Synthesizer::new(config.discovery.synthesizer_config());
    let catalog_path = Path::new(&config.catalog.path);

    match cli.command {
        Commands::Routes => {
            let records = load_catalog(catalog_path)?;
            for record in &records {
                for directive in synthesizer.synthesize(record) {
                    println!("{directive}");
                }
            }
        }
        Commands::Lookup { path } => {
            let records = load_catalog(catalog_path)?;
            let table = RoutingTable::from_catalog(&records, &synthesizer, builtin_registry())?;
            let Some(route) = table.lookup(&path) else {
                eprintln!("no route matches {path}");
                return Ok(ExitCode::FAILURE);
            };
            println!("route   {} ({})", route.pattern, route.matcher);
            for target in &route.targets {
                println!("target  {} -> {}", target.service, target.forward_url(&path)?);
            }
        }
        Commands::Watch => watch(&config, synthesizer).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn watch(config: &RouterConfig, synthesizer: Synthesizer) -> Result<(), Box<dyn std::error::Error>> {
    let catalog_path = Path::new(&config.catalog.path);
    let shared = Arc::new(SharedTable::default());
    let reloader = Reloader::new(shared.clone(), synthesizer, builtin_registry().clone());

    let table = reloader.apply(&load_catalog(catalog_path)?)?;
    tracing::info!(routes = table.len(), catalog = ?catalog_path, "Initial routing table ready");

    let (watcher, updates) = CatalogWatcher::new(catalog_path);
    let _watcher = watcher.run()?;

    let shutdown = Shutdown::new();
    let reload_task = tokio::spawn(reloader.run(updates, shutdown.subscribe()));

    signals::shutdown_signal().await?;
    shutdown.trigger();
    reload_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

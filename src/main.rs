//! tilestack - a vector tile server for MBTiles files.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tilestack::{
    config::{unknown_stack_members, CheckConfig, Cli, Command, ServeConfig},
    server::{create_router, RouterConfig},
    source::{MbtilesCatalog, SourceCatalog, SourceRegistry, TileSource},
    tile::TileService,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("tilestack v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    for path in &config.paths {
        info!("  Path: {}", path.display());
    }
    info!(
        "  Cache: {} open sources, {} connections/source",
        config.cache_sources, config.max_connections
    );

    let catalog = match MbtilesCatalog::discover(&config.paths, config.max_connections).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Tileset discovery failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if catalog.is_empty() {
        warn!("No MBTiles tilesets found; every tile request will miss");
    }
    for (name, path) in catalog.entries() {
        info!("  Source: {} ({})", name, path.display());
    }

    let mut registry = SourceRegistry::with_capacity(catalog, config.cache_sources);
    if let Some(order) = config.stack_order.clone() {
        let known = registry
            .catalog()
            .entries()
            .iter()
            .map(|(n, _)| n.clone())
            .collect::<Vec<_>>();
        let unknown = unknown_stack_members(&order, &known);
        if !unknown.is_empty() {
            warn!(
                "Stack order names unknown sources ({}); stacked requests will fail",
                unknown.join(", ")
            );
        }
        info!("  Stack: {}", order.join(" > "));
        registry = registry.with_stack_order(order);
    }

    let tile_service = TileService::new(registry);
    let router = create_router(tile_service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/sources", addr);
    info!("    curl http://{}/stack", addr);
    info!("");
    info!("  Fetch a tile directly:");
    info!("    curl http://{}/tiles-stack/0/0/0.mvt", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tilestack=debug,tower_http=debug"
    } else {
        "tilestack=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("tilestack Configuration Check");
    println!("═════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let catalog = match MbtilesCatalog::discover(&config.paths, config.max_connections).await {
        Ok(catalog) => catalog,
        Err(e) => {
            println!("✗ Discovery: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Tilesets:");
    println!("─────────");
    if catalog.is_empty() {
        println!("  (no tilesets found)");
    }

    let mut failed = false;
    for (name, path) in catalog.entries() {
        println!("  {} ({})", name, path.display());

        let metadata = match catalog.open_source(name).await {
            Ok(source) => source.metadata().await,
            Err(e) => Err(e),
        };
        match metadata {
            Ok(metadata) => {
                let (min_zoom, max_zoom) = metadata.zoom_range();
                println!("    zoom: {}-{}", min_zoom, max_zoom);
                if let Some(attribution) = metadata.attribution() {
                    println!("    attribution: {}", attribution);
                }
                if let Some(center) = metadata.center() {
                    println!(
                        "    center: {}, {} @ z{}",
                        center.point.longitude, center.point.latitude, center.zoom
                    );
                }
            }
            Err(e) => {
                println!("    ✗ {}", e);
                failed = true;
            }
        }
    }

    println!();
    let known: Vec<String> = catalog.entries().iter().map(|(n, _)| n.clone()).collect();
    let order = config.stack_order.clone().unwrap_or_else(|| known.clone());
    println!("Stack (highest priority first):");
    println!("───────────────────────────────");
    for (i, name) in order.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }

    let unknown = unknown_stack_members(&order, &known);
    if !unknown.is_empty() {
        println!();
        println!("✗ Stack order names unknown sources: {}", unknown.join(", "));
        return ExitCode::FAILURE;
    }

    if failed {
        println!();
        println!("✗ Some tilesets could not be read");
        return ExitCode::FAILURE;
    }

    println!();
    println!("═════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}

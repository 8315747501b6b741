// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Estate Escrow Node
//!
//! Entry point for the `estate-node` binary. Parses CLI arguments, initializes
//! logging and metrics, builds the escrow ledger, and serves the HTTP/WS API.
//!
//! The binary supports three subcommands:
//!
//! - `run`      — start the node
//! - `simulate` — replay the reference deployment and a sale in memory
//! - `version`  — print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use cli::{Commands, EstateNodeCli};
use metrics::EscrowMetrics;

/// Broadcast channel capacity for live event streaming.
/// 256 is large enough to absorb short bursts without dropping events
/// for connected WebSocket clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Wallet balance given to the buyer and lender in `simulate`.
const SIMULATION_FUNDING: u64 = 1_000;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = EstateNodeCli::parse();

    match cli.command {
        Commands::Run(args) => {
            logging::init_logging(cli.log_format);
            run_node(args).await
        }
        Commands::Simulate(args) => {
            logging::init_logging(cli.log_format);
            simulate(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: API server and metrics endpoint over one ledger.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        hardened = args.roles.hardened,
        "starting estate-node"
    );

    // --- Ledger ---
    let mut ledger = scenario::deploy(&args.roles);
    for (address, amount) in &args.allocations {
        ledger
            .transfers_mut()
            .credit(*address, *amount)
            .with_context(|| format!("failed to fund {} with {}", address, amount))?;
        tracing::info!(address = %address, amount, "genesis allocation");
    }
    if args.seed {
        scenario::seed_listings(&mut ledger, args.seed_buyer)
            .context("failed to seed reference listings")?;
    }

    // --- Metrics ---
    let escrow_metrics = Arc::new(EscrowMetrics::new());
    escrow_metrics.observe_ledger(&ledger);
    for event in ledger.events() {
        escrow_metrics.record_event(&event.kind);
    }

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        ledger: Arc::new(Mutex::new(ledger)),
        event_tx,
        metrics: Arc::clone(&escrow_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&escrow_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("estate-node stopped");
    Ok(())
}

/// Replays the reference deployment and walks property 1 through a sale,
/// then prints the event log to stdout as JSON.
fn simulate(args: cli::SimulateArgs) -> Result<()> {
    let mut ledger = scenario::deploy(&args.roles);
    let lender = ledger.lender();

    ledger
        .transfers_mut()
        .credit(args.buyer, SIMULATION_FUNDING)
        .context("failed to fund buyer")?;
    ledger
        .transfers_mut()
        .credit(lender, SIMULATION_FUNDING)
        .context("failed to fund lender")?;

    let ids = scenario::seed_listings(&mut ledger, args.buyer)
        .context("failed to seed reference listings")?;
    let property = ids.first().copied().context("no property was listed")?;

    scenario::run_sale(&mut ledger, property, args.cancel)
        .with_context(|| format!("sale of property {} failed", property))?;

    tracing::info!(
        property,
        status = %ledger.status(property),
        escrow_balance = ledger.balance(),
        "simulation complete"
    );

    let log = serde_json::to_string_pretty(ledger.events()).context("failed to encode events")?;
    println!("{}", log);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("estate-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

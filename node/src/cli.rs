//! # CLI Interface
//!
//! Defines the command-line argument structure for `estate-node` using
//! `clap` derive. Supports three subcommands: `run`, `simulate`, and
//! `version`.

use clap::{Parser, Subcommand};

use estate_contracts::Address;

use crate::logging::LogFormat;

/// Property escrow devnet node.
///
/// Hosts one escrow ledger (with its property registry and wallet book),
/// serves the JSON-RPC and REST API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "estate-node",
    about = "Property escrow devnet node",
    version,
    propagate_version = true
)]
pub struct EstateNodeCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "ESTATE_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node and serve the API.
    Run(RunArgs),
    /// Run the reference deployment and a full sale in memory, then print
    /// the escrow event log as JSON.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// The three fixed escrow roles.
#[derive(clap::Args, Debug, Clone)]
pub struct RoleArgs {
    /// Seller address.
    #[arg(long, env = "ESTATE_SELLER", default_value = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8")]
    pub seller: Address,

    /// Inspector address.
    #[arg(long, env = "ESTATE_INSPECTOR", default_value = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")]
    pub inspector: Address,

    /// Lender address.
    #[arg(long, env = "ESTATE_LENDER", default_value = "0x90F79bf6EB2c4f870365E785982E1f101E93b906")]
    pub lender: Address,

    /// Address the property registry is deployed under.
    #[arg(long, env = "ESTATE_REGISTRY", default_value = "0x5FbDB2315678afecb367f032d93F642f64180aa3")]
    pub registry: Address,

    /// Enforce every escrow policy check (exact earnest, escrow within
    /// price, no relisting, parties-only approval and settlement).
    #[arg(long, env = "ESTATE_HARDENED")]
    pub hardened: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub roles: RoleArgs,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "ESTATE_RPC_PORT", default_value_t = 8545)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ESTATE_METRICS_PORT", default_value_t = 9464)]
    pub metrics_port: u16,

    /// Genesis wallet allocation, `ADDRESS=AMOUNT`. Repeatable.
    #[arg(long = "fund", value_parser = parse_allocation)]
    pub allocations: Vec<(Address, u64)>,

    /// Mint, approve and list the three reference properties at startup.
    #[arg(long)]
    pub seed: bool,

    /// Buyer used for seeded listings.
    #[arg(long, default_value = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")]
    pub seed_buyer: Address,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub roles: RoleArgs,

    /// Buyer of the simulated sale.
    #[arg(long, default_value = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")]
    pub buyer: Address,

    /// Cancel the sale before inspection instead of settling it.
    #[arg(long)]
    pub cancel: bool,
}

/// Parses an `ADDRESS=AMOUNT` allocation.
pub fn parse_allocation(s: &str) -> Result<(Address, u64), String> {
    let (address, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=AMOUNT, got '{s}'"))?;
    let address: Address = address.parse().map_err(|e| format!("{e}"))?;
    let amount: u64 = amount
        .trim()
        .parse()
        .map_err(|e| format!("bad amount '{amount}': {e}"))?;
    Ok((address, amount))
}

//! Swarm formation simulator
//!
//! Starts a swarm of in-process nodes and drives it until every node is
//! connected or has to join.
//!
//! # Example
//!
//! ```bash
//! swarm-sim --nodes 6 --rounds 10
//! swarm-sim --config sim.toml --log-level debug
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use swarm_node::{LocalSwarm, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "swarm-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML simulation config
    #[arg(short, long, env = "SWARM_SIM_CONFIG")]
    config: Option<PathBuf>,

    /// Number of nodes, overrides the config file
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Maximum number of rounds, overrides the config file
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Swarm id, overrides the config file
    #[arg(long)]
    chain_id: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_toml(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(nodes) = args.nodes {
        config.nodes = nodes;
        config.swarm.swarm_size = nodes;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(chain_id) = args.chain_id {
        config.chain_id = chain_id;
    }
    config.validate()?;

    info!(
        nodes = config.nodes,
        rounds = config.rounds,
        chain_id = %config.chain_id,
        "Starting simulation"
    );

    let mut swarm = LocalSwarm::from_config(&config);
    let report = swarm.run(config.rounds).await?;

    println!("\n=== Simulation Complete ===");
    println!("Rounds:     {}", report.rounds);
    println!("Delivered:  {}", report.delivered);
    println!("Connected:  {}", report.count("Connected"));
    println!("Join:       {}", report.count("Join"));
    println!("Forming:    {}", report.count("LearningInformed"));
    println!("Agreement:  {}", if report.agreed() { "yes" } else { "no" });
    for node in &report.nodes {
        println!("  {:<20} {:<18} {}", node.host, node.state, node.blocks.join(" -> "));
    }

    Ok(())
}

//! CLI entry point for managing the Memora graph schema.

use clap::{Parser, Subcommand};

use memora_core::MemoraConfig;
use memora_graph::{GraphClient, GraphConfig};

use memora_cli::{commands, logging};

#[derive(Parser)]
#[command(name = "memora")]
#[command(about = "Initialize and check the Memora graph schema")]
struct Cli {
    /// Config file prefix (default: memora, i.e. memora.toml).
    #[arg(short, long, default_value = "memora")]
    config: String,

    /// Emit JSON log lines regardless of the configured format.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Create the node-key constraints if they do not exist.
    Setup,
    /// Report which constraints exist; exits non-zero if any are missing or mismatched.
    Verify,
    /// Print the constraint statements without connecting.
    Constraints,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = MemoraConfig::load(&cli.config)?;
    logging::init(&config.log, cli.json_logs);
    tracing::info!(command = ?cli.command, config = %cli.config, "Starting memora");

    if let Command::Constraints = cli.command {
        commands::write_constraints(&mut std::io::stdout().lock())?;
        return Ok(());
    }

    let graph = GraphClient::connect(&GraphConfig::from(config.neo4j)).await?;

    let result = match cli.command {
        Command::Setup => commands::setup(&graph).await.map(|()| true),
        Command::Verify => commands::verify(&graph, &mut std::io::stdout().lock()).await,
        Command::Constraints => Ok(true),
    };
    graph.close().await;

    match result {
        Ok(true) => {
            tracing::info!(command = ?cli.command, "Command finished");
            Ok(())
        }
        Ok(false) => {
            tracing::warn!(command = ?cli.command, "Schema incomplete");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(command = ?cli.command, error = %e, "Command failed");
            Err(e)
        }
    }
}

//! `rds-bootstrap` CLI entry-point.
//!
//! Available sub-commands:
//! - `check` — resolve the connection config and print the non-secret fields.
//! - `ping`  — initialize the shared pool and run a `SELECT 1` smoke query.

use clap::{Parser, Subcommand};
use tracing::info;

use config::ConfigMode;
use db::{DB, QueryOutput};

#[derive(Parser)]
#[command(
    name = "rds-bootstrap",
    about = "Configuration and connection bootstrap for the demo RDS stack",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the connection configuration and print it as JSON.
    Check,
    /// Initialize the shared pool and run a `SELECT 1` smoke query.
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mode = ConfigMode::from_env();
    info!("Configuration mode: {mode}");

    match cli.command {
        Command::Check => {
            let resolved = config::resolve(mode).await?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Command::Ping => {
            let resolved = config::resolve(mode).await?;
            let handle = DB.get(mode, &resolved).await?;
            match handle.query("SELECT 1", &[]).await? {
                QueryOutput::Rows(rows) => {
                    println!("ok: SELECT 1 returned {} row(s)", rows.len());
                }
                QueryOutput::Ack { rows_affected } => {
                    println!("ok: {rows_affected} row(s) affected");
                }
            }
        }
    }

    Ok(())
}

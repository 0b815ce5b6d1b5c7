//! Kiln - Entry Point
//!
//! Demo binary serving a heartbeat service behind a readiness-gated actor
//! until Ctrl-C.
//!
//! | Flag | Description |
//! |------|-------------|
//! | `--config <path>` | TOML configuration file (default: discovered `kiln.toml`) |
//! | `--heartbeat-ms <n>` | Interval between heartbeats |

use clap::Parser;
use kiln::run;
use std::time::Duration;

/// Command line interface for Kiln
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(about = "Kiln - dependency injection and lifecycle demo")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Interval between heartbeats, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub heartbeat_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(cli.config.as_deref(), Duration::from_millis(cli.heartbeat_ms)).await?;
    Ok(())
}

//! Interactive administration console.
//!
//! Drives the allocation engine directly against the configured stores, so it
//! works without the HTTP service running.
//!
//! ```bash
//! parkade --backend memory
//! RUN_MODE=production parkade
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use parkade_api::{auth, bootstrap};
use parkade_cli::Console;
use parkade_store::app_config::{Config, StorageBackend};
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Parkade administration console
#[derive(Parser, Debug)]
#[command(name = "parkade")]
#[command(about = "Park, unpark and manage slots from the terminal", long_about = None)]
struct Cli {
    /// Storage backend, overriding `storage.backend` from the config files
    #[arg(long, value_enum, env = "PARKADE_CLI_BACKEND")]
    backend: Option<Backend>,

    /// Log filter for diagnostics written to stderr
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Postgres,
    Memory,
}

impl From<Backend> for StorageBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Postgres => StorageBackend::Postgres,
            Backend::Memory => StorageBackend::Memory,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(backend) = cli.backend {
        config.storage.backend = backend.into();
    }

    let (slots, tickets, admins) = bootstrap::repositories(&config).await?;
    if let Some(creds) = &config.auth.bootstrap_admin {
        auth::ensure_admin(admins.as_ref(), creds).await?;
    }
    let engine = bootstrap::engine(&config, slots, tickets);

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), engine);
    console.say("Welcome to the Parkade administration console").await?;

    if console.login(admins.as_ref()).await? {
        console.run().await?;
    }

    Ok(())
}

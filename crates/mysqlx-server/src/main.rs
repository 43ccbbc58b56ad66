mod admin;
mod auth;
mod capability;
mod config;
mod connection;
mod dispatcher;
mod registry;
mod server;
mod session;

#[cfg(test)]
mod tests;

use clap::Parser;
use config::Config;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "mysqlx-server", about = "MySQL X Protocol server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.example.toml")]
    config: String,
    /// Overrides `server.listen_addr`.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let mut config = Config::from_path(&args.config)?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    server::run(config).await?;
    Ok(())
}

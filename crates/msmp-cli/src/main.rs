//! msmp
//!
//! Command-line client for a Minecraft server's management endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use msmp_core::storage::ConfigStorage;
use msmp_core::ClientConfig;
use std::path::PathBuf;

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "msmp")]
#[command(about = "Manage a Minecraft server over its management protocol", long_about = None)]
struct Args {
    /// Management endpoint, e.g. ws://localhost:25585
    #[arg(short, long, env = "MSMP_URL")]
    url: Option<String>,

    /// Management secret
    #[arg(short, long, env = "MSMP_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Seconds to wait for the server
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// File configuration with command-line overrides applied
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigStorage::load_from(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => ConfigStorage::default_location()?.load()?,
        };

        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(secret) = &self.secret {
            config.secret = Some(secret.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(&args.log_level)
        .init();

    let timeout = std::time::Duration::from_secs(args.timeout);
    if let Command::Lookup { names } = &args.command {
        return commands::lookup(names).await;
    }

    let config = args.client_config()?;
    tracing::debug!(url = %config.url, "Connecting");
    commands::run(args.command, config, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_override_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"url": "ws://file:25585", "batch_delay": 0}"#).unwrap();

        let args = Args::try_parse_from([
            "msmp",
            "--config",
            path.to_str().unwrap(),
            "--secret",
            "s3cret",
            "players",
        ])
        .unwrap();
        let config = args.client_config().unwrap();
        assert_eq!(config.url, "ws://file:25585");
        assert_eq!(config.secret.as_deref(), Some("s3cret"));
        assert!(config.batch_delay.is_zero());

        let args = Args::try_parse_from([
            "msmp",
            "--config",
            path.to_str().unwrap(),
            "--url",
            "ws://flag:25585",
            "status",
        ])
        .unwrap();
        assert_eq!(args.client_config().unwrap().url, "ws://flag:25585");
    }
}

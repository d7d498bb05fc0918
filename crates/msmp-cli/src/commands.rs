//! Subcommands

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use futures::StreamExt;
use msmp_client::MsmpClient;
use msmp_core::models::{Message, Player, SystemMessage};
use msmp_core::{ClientConfig, Params};
use msmp_mojang::MojangClient;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show server status
    Status,
    /// List online players
    Players,
    /// Manage the allowlist
    Allowlist {
        #[command(subcommand)]
        action: AllowlistAction,
    },
    /// Kick players
    Kick {
        #[arg(required = true)]
        players: Vec<String>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Save the world
    Save {
        /// Wait until everything is written to disk
        #[arg(long)]
        flush: bool,
    },
    /// Stop the server
    Stop,
    /// Broadcast a system message
    Say {
        message: String,
        /// Show above the hotbar instead of in chat
        #[arg(long)]
        overlay: bool,
    },
    /// Call any method; params is the single argument as JSON
    Call { method: String, params: Option<String> },
    /// Print events until the connection closes
    Watch,
    /// Look up Mojang profiles by name
    Lookup {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AllowlistAction {
    List,
    Add {
        #[arg(required = true)]
        players: Vec<String>,
    },
    Remove {
        #[arg(required = true)]
        players: Vec<String>,
    },
}

fn players(names: &[String]) -> Vec<Player> {
    names.iter().map(Player::named).collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(command: Command, config: ClientConfig, timeout: Duration) -> Result<()> {
    let watching = matches!(command, Command::Watch);
    let config = if watching {
        config
    } else {
        config.with_auto_reconnect(false)
    };

    let client = MsmpClient::connect(config).await?;
    match tokio::time::timeout(timeout, client.wait_connected()).await {
        Ok(result) => result.context("Could not connect to the server")?,
        Err(_) => bail!("Timed out connecting to the server"),
    }

    let result = execute(&client, command).await;
    client.close().await;
    result
}

async fn execute(client: &MsmpClient, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            let state = client.server_status().await?;
            let version = state
                .version
                .as_ref()
                .map(|version| version.name.as_str())
                .unwrap_or("unknown");
            println!(
                "{} (version {}), {} players online",
                if state.started { "running" } else { "starting" },
                version,
                state.players.len()
            );
        }
        Command::Players => {
            for player in client.players().await? {
                println!("{}", player.display_name());
            }
        }
        Command::Allowlist { action } => {
            let list = match action {
                AllowlistAction::List => client.allowlist().await?,
                AllowlistAction::Add { players: names } => {
                    client.add_to_allowlist(&players(&names)).await?
                }
                AllowlistAction::Remove { players: names } => {
                    client.remove_from_allowlist(&players(&names)).await?
                }
            };
            for player in list {
                println!("{}", player.display_name());
            }
        }
        Command::Kick {
            players: names,
            message,
        } => {
            let kicked = client
                .kick(&players(&names), message.map(Message::literal))
                .await?;
            println!("Kicked {} player(s)", kicked.len());
        }
        Command::Save { flush } => {
            client.save(flush).await?;
            println!("Saving");
        }
        Command::Stop => {
            client.stop().await?;
            println!("Stopping");
        }
        Command::Say { message, overlay } => {
            let mut message = SystemMessage::broadcast(Message::literal(message));
            message.overlay = overlay;
            client.system_message(&message).await?;
        }
        Command::Call { method, params } => {
            let params = match params {
                Some(raw) => {
                    let value: Value =
                        serde_json::from_str(&raw).context("params must be valid JSON")?;
                    Params::Single(value)
                }
                None => Params::None,
            };
            print_json(&client.call(&method, params).await?)?;
        }
        Command::Watch => watch(client).await?,
        Command::Lookup { names } => lookup(&names).await?,
    }
    Ok(())
}

async fn watch(client: &MsmpClient) -> Result<()> {
    let mut events = client.events();
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => println!("{event:?}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

pub async fn lookup(names: &[String]) -> Result<()> {
    let mojang = MojangClient::new()?;
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let profiles = if let [name] = names.as_slice() {
        mojang.profile_by_name(name).await?.into_iter().collect()
    } else {
        let mut profiles = Vec::new();
        for chunk in names.chunks(msmp_mojang::client::MAX_BULK_NAMES) {
            profiles.extend(mojang.profiles_by_names(chunk).await?);
        }
        profiles
    };

    if profiles.is_empty() {
        bail!("No profile found");
    }
    for profile in profiles {
        println!("{}  {}", profile.hyphenated_id(), profile.name);
    }
    Ok(())
}

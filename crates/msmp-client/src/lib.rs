//! Async client for the Minecraft Server Management Protocol
//!
//! [`MsmpClient`] keeps a websocket connection to a server's management endpoint
//! alive, correlates JSON-RPC calls with their responses, batches outgoing calls and
//! turns server notifications into a stream of [`Event`]s that survives reconnects.
//!
//! ```no_run
//! use futures::StreamExt;
//! use msmp_client::{ClientConfig, MsmpClient};
//!
//! # async fn run() -> msmp_client::Result<()> {
//! let config = ClientConfig::new("ws://localhost:25585").with_secret("s3cret");
//! let client = MsmpClient::connect(config).await?;
//! let players = client.players().await?;
//! println!("{} players online", players.len());
//!
//! let mut events = client.events();
//! while let Some(event) = events.next().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod pending;
pub mod sender;
pub mod transport;

pub use client::MsmpClient;
pub use connection::{CloseInfo, Connection, ConnectionOptions};
pub use error::{ClientError, Result, TransportError};
pub use lifecycle::{ClientState, LifecycleManager, StateKind};
pub use msmp_core::{ClientConfig, Event, Params};
pub use transport::{Connector, Endpoint, WebSocketConnector};

//! MSMP core types
//!
//! Wire envelopes, the JSON-RPC error taxonomy, the domain models exchanged with a
//! Minecraft server's management endpoint, the event catalog and its registry, and
//! client configuration.

pub mod error;
pub mod events;
pub mod models;
pub mod registry;
pub mod storage;
pub mod wire;

pub use error::{Error, Result};
pub use events::Event;
pub use models::ClientConfig;
pub use registry::{EventProvider, EventRegistry, RegistryRef};
pub use wire::{ErrorKind, Notification, Params, Request, Response, RpcError};

//! Mojang profile lookup
//!
//! Resolves player names to UUIDs and UUIDs to full profiles, including the skin and
//! cape carried in the signed `textures` property.

pub mod client;
pub mod error;
pub mod textures;
pub mod types;

pub use client::MojangClient;
pub use error::{Error, Result};
pub use types::*;

//! Events decoded from server notifications

use crate::models::{IpBan, Operator, Player, ServerState, TypedGameRule, UserBan};
use serde_json::Value;

/// Notification method names of the built-in catalog
pub mod methods {
    pub const SERVER_STARTED: &str = "minecraft:notification/server/started";
    pub const SERVER_STOPPING: &str = "minecraft:notification/server/stopping";
    pub const SERVER_SAVING: &str = "minecraft:notification/server/saving";
    pub const SERVER_SAVED: &str = "minecraft:notification/server/saved";
    pub const SERVER_STATUS: &str = "minecraft:notification/server/status";
    pub const SERVER_ACTIVITY: &str = "minecraft:notification/server/activity";
    pub const PLAYERS_JOINED: &str = "minecraft:notification/players/joined";
    pub const PLAYERS_LEFT: &str = "minecraft:notification/players/left";
    pub const OPERATORS_ADDED: &str = "minecraft:notification/operators/added";
    pub const OPERATORS_REMOVED: &str = "minecraft:notification/operators/removed";
    pub const ALLOWLIST_ADDED: &str = "minecraft:notification/allowlist/added";
    pub const ALLOWLIST_REMOVED: &str = "minecraft:notification/allowlist/removed";
    pub const IP_BANS_ADDED: &str = "minecraft:notification/ip_bans/added";
    pub const IP_BANS_REMOVED: &str = "minecraft:notification/ip_bans/removed";
    pub const BANS_ADDED: &str = "minecraft:notification/bans/added";
    pub const BANS_REMOVED: &str = "minecraft:notification/bans/removed";
    pub const GAMERULES_UPDATED: &str = "minecraft:notification/gamerules/updated";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Synthetic: a connection was opened
    ConnectionEstablished,
    /// Synthetic: a connection ended. `retry` tells whether the owner will reconnect.
    ConnectionClosed { reason: String, retry: bool },

    ServerStarted,
    ServerStopping,
    ServerSaving,
    ServerSaved,
    ServerStatus(ServerState),
    ServerActivity,

    PlayerJoined(Player),
    PlayerLeft(Player),
    OperatorAdded(Operator),
    OperatorRemoved(Operator),
    AllowlistAdded(Player),
    AllowlistRemoved(Player),
    IpBanAdded(IpBan),
    IpBanRemoved(String),
    BanAdded(UserBan),
    BanRemoved(Player),
    GameRuleUpdated(TypedGameRule),

    /// A notification no provider is registered for, or whose payload did not decode
    Unknown { method: String, params: Value },
}

impl Event {
    pub fn is_connection_event(&self) -> bool {
        matches!(
            self,
            Self::ConnectionEstablished | Self::ConnectionClosed { .. }
        )
    }
}

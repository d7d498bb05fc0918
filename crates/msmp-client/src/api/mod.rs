//! Typed wrappers over the management endpoints
//!
//! Each wrapper is one call through [`MsmpClient::request`](crate::MsmpClient::request)
//! and a typed decode of the result. List mutations answer with the resulting list.

mod allowlist;
mod bans;
mod gamerules;
mod operators;
mod players;
mod server;
mod settings;

pub use settings::ServerSetting;

/// Method names of the management endpoints
pub mod methods {
    pub const ALLOWLIST: &str = "minecraft:allowlist";
    pub const ALLOWLIST_SET: &str = "minecraft:allowlist/set";
    pub const ALLOWLIST_ADD: &str = "minecraft:allowlist/add";
    pub const ALLOWLIST_REMOVE: &str = "minecraft:allowlist/remove";
    pub const ALLOWLIST_CLEAR: &str = "minecraft:allowlist/clear";

    pub const BANS: &str = "minecraft:bans";
    pub const BANS_SET: &str = "minecraft:bans/set";
    pub const BANS_ADD: &str = "minecraft:bans/add";
    pub const BANS_REMOVE: &str = "minecraft:bans/remove";
    pub const BANS_CLEAR: &str = "minecraft:bans/clear";

    pub const IP_BANS: &str = "minecraft:ip_bans";
    pub const IP_BANS_SET: &str = "minecraft:ip_bans/set";
    pub const IP_BANS_ADD: &str = "minecraft:ip_bans/add";
    pub const IP_BANS_REMOVE: &str = "minecraft:ip_bans/remove";
    pub const IP_BANS_CLEAR: &str = "minecraft:ip_bans/clear";

    pub const PLAYERS: &str = "minecraft:players";
    pub const PLAYERS_KICK: &str = "minecraft:players/kick";

    pub const OPERATORS: &str = "minecraft:operators";
    pub const OPERATORS_SET: &str = "minecraft:operators/set";
    pub const OPERATORS_ADD: &str = "minecraft:operators/add";
    pub const OPERATORS_REMOVE: &str = "minecraft:operators/remove";
    pub const OPERATORS_CLEAR: &str = "minecraft:operators/clear";

    pub const SERVER_STATUS: &str = "minecraft:server/status";
    pub const SERVER_SAVE: &str = "minecraft:server/save";
    pub const SERVER_STOP: &str = "minecraft:server/stop";
    pub const SERVER_SYSTEM_MESSAGE: &str = "minecraft:server/system_message";

    pub const GAMERULES: &str = "minecraft:gamerules";
    pub const GAMERULES_UPDATE: &str = "minecraft:gamerules/update";

    pub const SERVER_SETTINGS_PREFIX: &str = "minecraft:serversettings/";

    pub const DISCOVER: &str = "rpc.discover";
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    use crate::transport::memory::{MemoryConnector, MemoryServer};
    use crate::MsmpClient;
    use msmp_core::ClientConfig;

    /// Client connected to an in-memory server
    pub async fn connected_client() -> (MsmpClient, MemoryServer) {
        let (connector, mut servers) = MemoryConnector::new();
        let config = ClientConfig::default().with_batch_delay(std::time::Duration::ZERO);
        let client = MsmpClient::with_connector(config, connector).await.unwrap();
        let server = servers.recv().await.unwrap();
        client.wait_connected().await.unwrap();
        (client, server)
    }

    /// Answer the next request with `result` and return it as `(method, params)`
    pub async fn answer(server: &mut MemoryServer, result: Value) -> (String, Value) {
        let frame = server.next_json().await.unwrap();
        let request = &frame[0];
        server.push(json!({"jsonrpc": "2.0", "id": request["id"], "result": result}).to_string());
        (
            request["method"].as_str().unwrap_or_default().to_string(),
            request["params"].clone(),
        )
    }
}

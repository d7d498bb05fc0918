//! Server settings (`minecraft:serversettings/<name>`)

use msmp_core::models::{Difficulty, GameMode};
use msmp_core::Params;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::methods;
use crate::{MsmpClient, Result};

/// A named server setting and the type of its value
pub trait ServerSetting {
    const NAME: &'static str;
    type Value: Serialize + DeserializeOwned + Send;
}

macro_rules! settings {
    ($($(#[$meta:meta])* $ty:ident => $name:literal : $value:ty;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $ty;

            impl ServerSetting for $ty {
                const NAME: &'static str = $name;
                type Value = $value;
            }
        )*
    };
}

settings! {
    Autosave => "autosave": bool;
    DifficultySetting => "difficulty": Difficulty;
    EnforceAllowlist => "enforce_allowlist": bool;
    UseAllowlist => "use_allowlist": bool;
    MaxPlayers => "max_players": u32;
    PauseWhenEmptySeconds => "pause_when_empty_seconds": u32;
    /// Minutes before idle players are kicked; 0 disables
    PlayerIdleTimeout => "player_idle_timeout": u32;
    AllowFlight => "allow_flight": bool;
    Motd => "motd": String;
    SpawnProtectionRadius => "spawn_protection_radius": u32;
    ForceGameMode => "force_game_mode": bool;
    GameModeSetting => "game_mode": GameMode;
    ViewDistance => "view_distance": u32;
    SimulationDistance => "simulation_distance": u32;
    AcceptTransfers => "accept_transfers": bool;
    StatusHeartbeatInterval => "status_heartbeat_interval": u32;
    OperatorUserPermissionLevel => "operator_user_permission_level": u8;
    HideOnlinePlayers => "hide_online_players": bool;
    StatusReplies => "status_replies": bool;
    EntityBroadcastRange => "entity_broadcast_range": u32;
}

fn get_method(name: &str) -> String {
    format!("{}{name}", methods::SERVER_SETTINGS_PREFIX)
}

fn set_method(name: &str) -> String {
    format!("{}{name}/set", methods::SERVER_SETTINGS_PREFIX)
}

impl MsmpClient {
    pub async fn setting<S: ServerSetting>(&self) -> Result<S::Value> {
        self.request(&get_method(S::NAME), Params::None).await
    }

    /// Change a setting; the server answers with the value now in effect
    pub async fn set_setting<S: ServerSetting>(&self, value: &S::Value) -> Result<S::Value> {
        self.request(&set_method(S::NAME), Params::single(value)?)
            .await
    }

    pub async fn autosave(&self) -> Result<bool> {
        self.setting::<Autosave>().await
    }

    pub async fn set_autosave(&self, enabled: bool) -> Result<bool> {
        self.set_setting::<Autosave>(&enabled).await
    }

    pub async fn difficulty(&self) -> Result<Difficulty> {
        self.setting::<DifficultySetting>().await
    }

    pub async fn set_difficulty(&self, difficulty: Difficulty) -> Result<Difficulty> {
        self.set_setting::<DifficultySetting>(&difficulty).await
    }

    pub async fn motd(&self) -> Result<String> {
        self.setting::<Motd>().await
    }

    pub async fn set_motd(&self, motd: &str) -> Result<String> {
        self.set_setting::<Motd>(&motd.to_string()).await
    }

    pub async fn max_players(&self) -> Result<u32> {
        self.setting::<MaxPlayers>().await
    }

    pub async fn set_max_players(&self, max: u32) -> Result<u32> {
        self.set_setting::<MaxPlayers>(&max).await
    }

    pub async fn enforce_allowlist(&self) -> Result<bool> {
        self.setting::<EnforceAllowlist>().await
    }

    pub async fn set_enforce_allowlist(&self, enforce: bool) -> Result<bool> {
        self.set_setting::<EnforceAllowlist>(&enforce).await
    }

    pub async fn view_distance(&self) -> Result<u32> {
        self.setting::<ViewDistance>().await
    }

    pub async fn set_view_distance(&self, chunks: u32) -> Result<u32> {
        self.set_setting::<ViewDistance>(&chunks).await
    }

    pub async fn simulation_distance(&self) -> Result<u32> {
        self.setting::<SimulationDistance>().await
    }

    pub async fn set_simulation_distance(&self, chunks: u32) -> Result<u32> {
        self.set_setting::<SimulationDistance>(&chunks).await
    }

    pub async fn game_mode(&self) -> Result<GameMode> {
        self.setting::<GameModeSetting>().await
    }

    pub async fn set_game_mode(&self, mode: GameMode) -> Result<GameMode> {
        self.set_setting::<GameModeSetting>(&mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{answer, connected_client};
    use serde_json::json;

    #[test]
    fn test_setting_method_names() {
        assert_eq!(get_method(Motd::NAME), "minecraft:serversettings/motd");
        assert_eq!(
            set_method(ViewDistance::NAME),
            "minecraft:serversettings/view_distance/set"
        );
    }

    #[tokio::test]
    async fn test_set_difficulty() {
        let (client, mut server) = connected_client().await;

        let call = tokio::spawn({
            let client = client.clone();
            async move { client.set_difficulty(Difficulty::Hard).await }
        });
        let (method, params) = answer(&mut server, json!("hard")).await;

        assert_eq!(method, "minecraft:serversettings/difficulty/set");
        assert_eq!(params, json!(["hard"]));
        assert_eq!(call.await.unwrap().unwrap(), Difficulty::Hard);
        client.close().await;
    }
}

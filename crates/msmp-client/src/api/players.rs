use msmp_core::models::{KickPlayer, Message, Player};
use msmp_core::Params;

use super::methods;
use crate::{MsmpClient, Result};

impl MsmpClient {
    /// Players currently online
    pub async fn players(&self) -> Result<Vec<Player>> {
        self.request(methods::PLAYERS, Params::None).await
    }

    /// Kick players, optionally with a message. Returns the players that were kicked.
    pub async fn kick(&self, players: &[Player], message: Option<Message>) -> Result<Vec<Player>> {
        let kicks: Vec<KickPlayer> = players
            .iter()
            .cloned()
            .map(|player| KickPlayer {
                player,
                message: message.clone(),
            })
            .collect();
        self.request(methods::PLAYERS_KICK, Params::many(kicks)?)
            .await
    }
}

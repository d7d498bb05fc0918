use msmp_core::models::Player;
use msmp_core::Params;

use super::methods;
use crate::{MsmpClient, Result};

impl MsmpClient {
    pub async fn allowlist(&self) -> Result<Vec<Player>> {
        self.request(methods::ALLOWLIST, Params::None).await
    }

    /// Replace the allowlist
    pub async fn set_allowlist(&self, players: &[Player]) -> Result<Vec<Player>> {
        self.request(methods::ALLOWLIST_SET, Params::many(players)?)
            .await
    }

    pub async fn add_to_allowlist(&self, players: &[Player]) -> Result<Vec<Player>> {
        self.request(methods::ALLOWLIST_ADD, Params::many(players)?)
            .await
    }

    pub async fn remove_from_allowlist(&self, players: &[Player]) -> Result<Vec<Player>> {
        self.request(methods::ALLOWLIST_REMOVE, Params::many(players)?)
            .await
    }

    pub async fn clear_allowlist(&self) -> Result<Vec<Player>> {
        self.request(methods::ALLOWLIST_CLEAR, Params::None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{answer, connected_client};
    use serde_json::json;

    #[tokio::test]
    async fn test_add_to_allowlist_wraps_players() {
        let (client, mut server) = connected_client().await;

        let call = tokio::spawn({
            let client = client.clone();
            async move {
                client
                    .add_to_allowlist(&[Player::named("Alice"), Player::named("Bob")])
                    .await
            }
        });
        let (method, params) = answer(
            &mut server,
            json!([{"name": "Alice"}, {"name": "Bob"}, {"name": "Carol"}]),
        )
        .await;

        assert_eq!(method, "minecraft:allowlist/add");
        assert_eq!(params, json!([[{"name": "Alice"}, {"name": "Bob"}]]));
        assert_eq!(call.await.unwrap().unwrap().len(), 3);
        client.close().await;
    }
}

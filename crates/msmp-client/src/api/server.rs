use msmp_core::models::{ServerState, SystemMessage};
use msmp_core::Params;
use serde_json::Value;

use super::methods;
use crate::{MsmpClient, Result};

impl MsmpClient {
    pub async fn server_status(&self) -> Result<ServerState> {
        self.request(methods::SERVER_STATUS, Params::None).await
    }

    /// Save the world; `flush` waits for chunks to be written to disk
    pub async fn save(&self, flush: bool) -> Result<bool> {
        self.request(methods::SERVER_SAVE, Params::single(&flush)?)
            .await
    }

    /// Ask the server to stop. The client closes once the server announces it.
    pub async fn stop(&self) -> Result<bool> {
        self.request(methods::SERVER_STOP, Params::None).await
    }

    pub async fn system_message(&self, message: &SystemMessage) -> Result<bool> {
        self.request(methods::SERVER_SYSTEM_MESSAGE, Params::single(message)?)
            .await
    }

    /// The server's OpenRPC description of every method and notification
    pub async fn discover(&self) -> Result<Value> {
        self.call(methods::DISCOVER, Params::None).await
    }
}

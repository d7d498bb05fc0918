//! Client facade

use futures::stream::{self, BoxStream, StreamExt};
use msmp_core::{ClientConfig, Event, Params, RegistryRef};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::connection::ConnectionOptions;
use crate::error::{ClientError, Result};
use crate::lifecycle::{ClientState, LifecycleManager};
use crate::transport::{Connector, WebSocketConnector};

/// Handle to a managed server. Cheap to clone; the connection closes when the last
/// clone is dropped or [`MsmpClient::close`] is called.
#[derive(Debug, Clone)]
pub struct MsmpClient {
    manager: Arc<LifecycleManager>,
    request_timeout: Duration,
}

impl MsmpClient {
    /// Start connecting over websocket. Returns without waiting for the handshake.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::with_connector(config, WebSocketConnector::new()).await
    }

    pub async fn with_connector<C: Connector>(config: ClientConfig, connector: C) -> Result<Self> {
        Self::with_registry(config, connector, RegistryRef::Global).await
    }

    /// Use a private event registry instead of the process-wide one
    pub async fn with_registry<C: Connector>(
        config: ClientConfig,
        connector: C,
        registry: RegistryRef,
    ) -> Result<Self> {
        config.validate()?;
        let request_timeout = config.request_timeout;
        let options = ConnectionOptions::from_config(&config).with_registry(registry);
        let manager = LifecycleManager::new(config, Arc::new(connector), options)?;
        manager.start().await;

        Ok(Self {
            manager: Arc::new(manager),
            request_timeout,
        })
    }

    /// Call `method` under the configured request timeout
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.call_with_timeout(method, params, self.request_timeout)
            .await
    }

    /// Call `method`, waiting for a connection if needed.
    ///
    /// `timeout` covers both waiting for the connection and waiting for the reply.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Params,
        timeout: Duration,
    ) -> Result<Value> {
        if self.manager.current_state().is_closed() {
            return Err(ClientError::Closed);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let call = async {
            let connection = self.manager.connected().await?;
            connection.call(method, params).await
        };

        match tokio::time::timeout_at(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(timeout)),
        }
    }

    /// Call and decode the result
    pub async fn request<R: DeserializeOwned>(&self, method: &str, params: Params) -> Result<R> {
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn state(&self) -> watch::Receiver<ClientState> {
        self.manager.state()
    }

    pub fn current_state(&self) -> ClientState {
        self.manager.current_state()
    }

    /// Every state transition from now on
    pub fn state_changes(&self) -> broadcast::Receiver<ClientState> {
        self.manager.transitions()
    }

    /// Events across reconnects. Ends once the client is closed and buffered events
    /// have been delivered.
    pub fn events(&self) -> BoxStream<'static, Event> {
        let events = self.manager.subscribe_events();
        let state = self.manager.state();

        stream::unfold(
            (events, state, false),
            |(mut events, mut state, mut draining)| async move {
                loop {
                    if draining {
                        return match events.try_recv() {
                            Ok(event) => Some((event, (events, state, true))),
                            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                            Err(_) => None,
                        };
                    }

                    tokio::select! {
                        biased;
                        event = events.recv() => match event {
                            Ok(event) => return Some((event, (events, state, false))),
                            Err(RecvError::Lagged(skipped)) => {
                                warn!(skipped, "Event stream fell behind");
                            }
                            Err(RecvError::Closed) => return None,
                        },
                        _ = wait_closed(&mut state) => draining = true,
                    }
                }
            },
        )
        .boxed()
    }

    /// Wait until a connection is up
    pub async fn wait_connected(&self) -> Result<()> {
        self.manager.connected().await.map(|_| ())
    }

    pub fn is_closed(&self) -> bool {
        self.manager.current_state().is_closed()
    }

    /// Close the client. Pending calls fail with a connection error.
    pub async fn close(&self) {
        self.manager.close().await;
    }
}

async fn wait_closed(state: &mut watch::Receiver<ClientState>) {
    loop {
        if state.borrow_and_update().is_closed() {
            return;
        }
        if state.changed().await.is_err() {
            return;
        }
    }
}

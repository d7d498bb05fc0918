//! Connection lifecycle
//!
//! A single driver task owns the state machine:
//!
//! ```text
//! Connecting -> Connected -> Disconnected -> Reconnecting -> Connecting ...
//!          \            \              \
//!           +------------+--------------+--> Closed
//! ```
//!
//! `Closed` is terminal. It is reached on an explicit close, when the server announces
//! it is stopping, or when reconnecting is disabled or exhausted.

use msmp_core::{ClientConfig, Event};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::{CloseInfo, Connection, ConnectionOptions};
use crate::error::{ClientError, Result, TransportError};
use crate::transport::{Connector, Endpoint};

/// Upper bound of the random delay added to each backoff
pub const MAX_JITTER_MS: u64 = 500;

const TRANSITION_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub enum ClientState {
    Connecting,
    Connected(Arc<Connection>),
    Disconnected { reason: String },
    Reconnecting { attempt: u32, delay: Duration },
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
    Closed,
}

impl ClientState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Connecting => StateKind::Connecting,
            Self::Connected(_) => StateKind::Connected,
            Self::Disconnected { .. } => StateKind::Disconnected,
            Self::Reconnecting { .. } => StateKind::Reconnecting,
            Self::Closed => StateKind::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn connection(&self) -> Option<&Arc<Connection>> {
        match self {
            Self::Connected(connection) => Some(connection),
            _ => None,
        }
    }
}

struct Shared {
    config: ClientConfig,
    endpoint: Endpoint,
    options: ConnectionOptions,
    connector: Arc<dyn Connector>,
    state: watch::Sender<ClientState>,
    transitions: broadcast::Sender<ClientState>,
    events: broadcast::Sender<Event>,
}

impl Shared {
    /// Publish a transition; nothing follows `Closed`
    fn set_state(&self, next: ClientState) {
        let changed = self.state.send_if_modified(|current| {
            if current.is_closed() {
                return false;
            }
            *current = next.clone();
            true
        });

        if changed {
            debug!(state = ?next.kind(), "State transition");
            let _ = self.transitions.send(next);
        }
    }
}

pub struct LifecycleManager {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleManager {
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        options: ConnectionOptions,
    ) -> Result<Self> {
        let endpoint = Endpoint::from_config(&config)?;
        let (state, _) = watch::channel(ClientState::Connecting);
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        let (events, _) = broadcast::channel(config.event_buffer_size.max(1));

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                endpoint,
                options,
                connector,
                state,
                transitions,
                events,
            }),
            shutdown: CancellationToken::new(),
            driver: Mutex::new(None),
        })
    }

    /// Spawn the driver task. Calling it again, or after close, does nothing.
    pub async fn start(&self) {
        let mut driver = self.driver.lock().await;
        if driver.is_some() || self.shutdown.is_cancelled() {
            return;
        }
        let task = tokio::spawn(run(self.shared.clone(), self.shutdown.clone()));
        *driver = Some(task);
    }

    /// Stop the driver, close any live connection and settle in `Closed`
    pub async fn close(&self) {
        let mut driver = self.driver.lock().await;
        self.shutdown.cancel();
        if let Some(task) = driver.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Lifecycle driver ended abnormally");
            }
        }
        self.shared.set_state(ClientState::Closed);
    }

    pub fn state(&self) -> watch::Receiver<ClientState> {
        self.shared.state.subscribe()
    }

    pub fn current_state(&self) -> ClientState {
        self.shared.state.borrow().clone()
    }

    /// Every transition in order, from the moment of subscribing
    pub fn transitions(&self) -> broadcast::Receiver<ClientState> {
        self.shared.transitions.subscribe()
    }

    /// Events of whichever connection is current
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    /// Wait for a live connection; fails once the client is closed
    pub async fn connected(&self) -> Result<Arc<Connection>> {
        let mut state = self.state();
        loop {
            {
                let current = state.borrow_and_update();
                match &*current {
                    ClientState::Connected(connection) if !connection.is_closed() => {
                        return Ok(connection.clone());
                    }
                    ClientState::Closed => return Err(ClientError::Closed),
                    _ => {}
                }
            }
            if state.changed().await.is_err() {
                return Err(ClientError::Closed);
            }
        }
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("url", &self.shared.endpoint.url.as_str())
            .field("state", &self.shared.state.borrow().kind())
            .finish()
    }
}

/// Backoff for the next reconnect. Never shorter than the previous one.
fn next_delay(config: &ClientConfig, attempt: u32, previous: Duration) -> Duration {
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS));
    let delay = config
        .base_delay_for_attempt(attempt)
        .saturating_add(jitter)
        .min(config.max_retry_delay);
    delay.max(previous).min(config.max_retry_delay)
}

async fn run(shared: Arc<Shared>, shutdown: CancellationToken) {
    let config = &shared.config;
    let mut attempt: u32 = 0;
    let mut ever_connected = false;
    let mut last_delay = Duration::ZERO;

    loop {
        shared.set_state(ClientState::Connecting);

        let connect = tokio::time::timeout(
            config.connect_timeout,
            shared.connector.connect(&shared.endpoint),
        );
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = connect => match result {
                Ok(result) => result,
                Err(_) => Err(TransportError::ConnectTimeout(config.connect_timeout)),
            },
        };

        let reason = match outcome {
            Ok((sink, stream)) => {
                info!(url = %shared.endpoint.url, "Connected");
                attempt = 0;
                last_delay = Duration::ZERO;
                ever_connected = true;

                let connection = Connection::new(sink, stream, shared.options.clone());
                match drive(&shared, connection, &shutdown).await {
                    Drive::Stopped => break,
                    Drive::Lost(info) if !info.retry => {
                        info!(reason = %info.reason, "Connection ended without retry");
                        break;
                    }
                    Drive::Lost(info) => info.reason,
                }
            }
            Err(e) => {
                warn!(error = %e, attempt, "Connection attempt failed");
                e.to_string()
            }
        };

        shared.set_state(ClientState::Disconnected { reason });

        if !config.auto_reconnect {
            info!("Auto-reconnect disabled, closing");
            break;
        }
        if config.fail_fast && !ever_connected {
            info!("Initial connection failed, closing");
            break;
        }
        if !config.allows_attempt(attempt) {
            warn!(attempt, "Reconnect attempts exhausted, closing");
            break;
        }

        let delay = next_delay(config, attempt, last_delay);
        last_delay = delay;
        attempt += 1;
        info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
        shared.set_state(ClientState::Reconnecting { attempt, delay });

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    shared.set_state(ClientState::Closed);
}

enum Drive {
    /// Shut down locally
    Stopped,
    Lost(CloseInfo),
}

/// Run one connection until it ends, relaying its events
async fn drive(
    shared: &Shared,
    connection: Arc<Connection>,
    shutdown: &CancellationToken,
) -> Drive {
    let mut events = connection.subscribe();
    shared.set_state(ClientState::Connected(connection.clone()));
    connection.start();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                connection.set_retry_on_disconnected(false);
                connection.close().await;
                while let Ok(event) = events.try_recv() {
                    let _ = shared.events.send(event);
                }
                return Drive::Stopped;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let stopping = event == Event::ServerStopping;
                    let ended = matches!(event, Event::ConnectionClosed { .. });
                    let _ = shared.events.send(event);

                    if stopping {
                        info!("Server is stopping, closing connection");
                        connection.set_retry_on_disconnected(false);
                        connection.close().await;
                    }
                    if ended {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event relay fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    Drive::Lost(connection.closed().await)
}

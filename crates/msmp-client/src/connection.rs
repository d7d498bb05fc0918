//! One live connection: a send loop, a read loop and the calls in flight between them

use msmp_core::{ClientConfig, Event, Params, RegistryRef, Request};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::dispatcher::Dispatcher;
use crate::error::{ClientError, Result};
use crate::pending::PendingCalls;
use crate::sender::RequestSender;
use crate::transport::{BoxedSink, BoxedStream, Incoming};

const LOCAL_CLOSE_REASON: &str = "connection closed locally";

/// Per-connection settings taken from [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub batch_delay: Duration,
    pub ping_interval: Option<Duration>,
    pub event_buffer_size: usize,
    pub registry: RegistryRef,
}

impl ConnectionOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            batch_delay: config.batch_delay,
            ping_interval: config.ping_interval,
            event_buffer_size: config.event_buffer_size,
            registry: RegistryRef::Global,
        }
    }

    pub fn with_registry(mut self, registry: RegistryRef) -> Self {
        self.registry = registry;
        self
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// How a connection ended
#[derive(Debug, Clone, PartialEq)]
pub struct CloseInfo {
    pub reason: String,
    /// Whether the owner should reconnect
    pub retry: bool,
}

pub struct Connection {
    next_id: AtomicU64,
    pending: Arc<PendingCalls>,
    sender: RequestSender,
    dispatcher: Dispatcher,
    events: broadcast::Sender<Event>,
    retry_on_disconnected: AtomicBool,
    cancel: CancellationToken,
    closed: watch::Sender<Option<CloseInfo>>,
    stream: Mutex<Option<BoxedStream>>,
}

impl Connection {
    /// Wire a freshly opened transport. Nothing is read until [`Connection::start`].
    pub fn new(sink: BoxedSink, stream: BoxedStream, options: ConnectionOptions) -> Arc<Self> {
        let pending = Arc::new(PendingCalls::new());
        let (events, _) = broadcast::channel(options.event_buffer_size.max(1));
        let sender = RequestSender::spawn(
            sink,
            pending.clone(),
            options.batch_delay,
            options.ping_interval,
        );
        let dispatcher = Dispatcher::new(pending.clone(), options.registry, events.clone());
        let (closed, _) = watch::channel(None);

        Arc::new(Self {
            next_id: AtomicU64::new(0),
            pending,
            sender,
            dispatcher,
            events,
            retry_on_disconnected: AtomicBool::new(true),
            cancel: CancellationToken::new(),
            closed,
            stream: Mutex::new(Some(stream)),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Announce the connection and spawn the read loop. Later calls do nothing.
    pub fn start(self: &Arc<Self>) {
        let Some(stream) = self.stream.lock().take() else {
            return;
        };
        self.dispatcher.emit(Event::ConnectionEstablished);
        tokio::spawn(read_loop(Arc::downgrade(self), self.cancel.clone(), stream));
    }

    /// Issue a call and wait for its response.
    ///
    /// The pending entry is removed on every exit path, including the caller dropping
    /// this future.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rx = self.pending.register(id);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        debug!(id, method, "Call");
        self.sender.enqueue(Request::new(id, method, params))?;

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::ConnectionLost(
                "call abandoned by the connection".to_string(),
            )),
        }
    }

    /// Clear to tell the owner not to reconnect once this connection ends
    pub fn set_retry_on_disconnected(&self, retry: bool) {
        self.retry_on_disconnected.store(retry, Ordering::SeqCst);
    }

    pub fn retry_on_disconnected(&self) -> bool {
        self.retry_on_disconnected.load(Ordering::SeqCst)
    }

    /// Close the connection and wait for teardown to finish
    pub async fn close(&self) {
        self.cancel.cancel();
        let unstarted = self.stream.lock().take();
        if unstarted.is_some() {
            self.teardown(LOCAL_CLOSE_REASON.to_string()).await;
        }
        self.closed().await;
    }

    /// Resolves once teardown has completed
    pub async fn closed(&self) -> CloseInfo {
        let mut rx = self.closed.subscribe();
        let info = rx.wait_for(Option::is_some).await.ok().and_then(|info| (*info).clone());
        info.unwrap_or_else(|| CloseInfo {
            reason: "connection dropped".to_string(),
            retry: false,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.borrow().is_some()
    }

    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    async fn teardown(&self, reason: String) {
        let retry = self.retry_on_disconnected();
        info!(%reason, retry, "Connection closed");

        self.dispatcher.emit(Event::ConnectionClosed {
            reason: reason.clone(),
            retry,
        });

        let failed = self.pending.drain_all(&reason);
        if failed > 0 {
            debug!(failed, "Failed pending calls");
        }
        self.sender.close().await;

        self.closed.send_replace(Some(CloseInfo { reason, retry }));
    }
}

/// Holds the connection weakly so dropping the last handle ends the loop
async fn read_loop(
    connection: Weak<Connection>,
    cancel: CancellationToken,
    mut stream: BoxedStream,
) {
    let reason = loop {
        let incoming = tokio::select! {
            _ = cancel.cancelled() => break LOCAL_CLOSE_REASON.to_string(),
            incoming = stream.receive() => incoming,
        };
        let Some(connection) = connection.upgrade() else {
            return;
        };

        match incoming {
            Ok(Incoming::Text(frame)) => {
                if let Err(e) = connection.dispatcher.dispatch_frame(&frame) {
                    error!(error = %e, "Received a frame that is not JSON");
                    break format!("invalid frame: {e}");
                }
            }
            Ok(Incoming::Closed(reason)) => break reason.to_string(),
            Err(e) => break e.to_string(),
        }
    };

    match connection.upgrade() {
        Some(connection) => connection.teardown(reason).await,
        None => debug!(%reason, "Connection dropped before teardown"),
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("pending", &self.pending.len())
            .field("retry_on_disconnected", &self.retry_on_disconnected())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PendingGuard<'a> {
    pending: &'a PendingCalls,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.id);
    }
}

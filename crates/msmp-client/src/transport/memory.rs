//! In-process transport for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{
    BoxedSink, BoxedStream, CloseReason, Connector, Endpoint, FrameSink, FrameStream, Incoming,
};
use crate::error::TransportError;

/// Server side of one accepted in-memory connection
pub(crate) struct MemoryServer {
    frames: mpsc::UnboundedReceiver<String>,
    incoming: mpsc::UnboundedSender<Incoming>,
    pings: Arc<AtomicU32>,
}

impl MemoryServer {
    /// Push a text frame to the client
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.incoming.send(Incoming::Text(frame.into()));
    }

    pub fn close(&self, reason: &str) {
        let _ = self
            .incoming
            .send(Incoming::Closed(CloseReason::new(Some(1000), reason)));
    }

    /// Pings the client has sent so far
    pub fn pings(&self) -> u32 {
        self.pings.load(Ordering::SeqCst)
    }

    /// Whether the client stopped reading
    pub fn stream_closed(&self) -> bool {
        self.incoming.is_closed()
    }

    /// Next frame written by the client, `None` once the client closed its sink
    pub async fn next_frame(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    /// Next frame decoded as JSON
    pub async fn next_json(&mut self) -> Option<serde_json::Value> {
        let frame = self.next_frame().await?;
        serde_json::from_str(&frame).ok()
    }
}

#[derive(Clone)]
pub(crate) struct MemoryConnector {
    attempts: Arc<AtomicU32>,
    refusing: Arc<AtomicBool>,
    accepted: mpsc::UnboundedSender<MemoryServer>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryServer>) {
        let (accepted, servers) = mpsc::unbounded_channel();
        let connector = Self {
            attempts: Arc::new(AtomicU32::new(0)),
            refusing: Arc::new(AtomicBool::new(false)),
            accepted,
        };
        (connector, servers)
    }

    /// Connector whose every attempt is refused
    pub fn refusing() -> Self {
        let (connector, _) = Self::new();
        connector.set_refusing(true);
        connector
    }

    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        _endpoint: &Endpoint,
    ) -> Result<(BoxedSink, BoxedStream), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refusing.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let pings = Arc::new(AtomicU32::new(0));

        self.accepted
            .send(MemoryServer {
                frames: frames_rx,
                incoming: incoming_tx.clone(),
                pings: pings.clone(),
            })
            .map_err(|_| TransportError::ConnectionFailed("no server listening".to_string()))?;

        let sink = MemorySink {
            frames: Some(frames_tx),
            incoming: incoming_tx,
            pings,
        };
        let stream = MemoryStream {
            incoming: incoming_rx,
        };
        Ok((Box::new(sink), Box::new(stream)))
    }
}

struct MemorySink {
    frames: Option<mpsc::UnboundedSender<String>>,
    incoming: mpsc::UnboundedSender<Incoming>,
    pings: Arc<AtomicU32>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        let frames = self.frames.as_ref().ok_or(TransportError::Closed)?;
        frames.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.frames.as_ref().ok_or(TransportError::Closed)?;
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.frames.take().is_some() {
            let _ = self
                .incoming
                .send(Incoming::Closed(CloseReason::new(Some(1000), "closed by client")));
        }
        Ok(())
    }
}

struct MemoryStream {
    incoming: mpsc::UnboundedReceiver<Incoming>,
}

#[async_trait]
impl FrameStream for MemoryStream {
    async fn receive(&mut self) -> Result<Incoming, TransportError> {
        Ok(self
            .incoming
            .recv()
            .await
            .unwrap_or_else(|| Incoming::Closed(CloseReason::new(None, "stream ended"))))
    }
}

//! Transport boundary
//!
//! The client runtime only needs a duplex channel of text frames. A [`Connector`]
//! produces one half for writing and one half for reading; each half is driven by a
//! single task of the connection.

use async_trait::async_trait;
use msmp_core::ClientConfig;
use url::Url;

use crate::error::TransportError;

#[cfg(test)]
pub(crate) mod memory;
pub mod websocket;

pub use websocket::WebSocketConnector;

/// Where and how to connect
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url).map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self {
                url,
                headers: Vec::new(),
            }),
            scheme => Err(TransportError::InvalidEndpoint(format!(
                "unsupported scheme '{scheme}', expected ws or wss"
            ))),
        }
    }

    /// Endpoint with the configured headers; the secret becomes a bearer token
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut endpoint = Self::parse(&config.url)?;
        endpoint.headers = config
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if let Some(secret) = &config.secret {
            endpoint
                .headers
                .push(("Authorization".to_string(), format!("Bearer {secret}")));
        }
        Ok(endpoint)
    }
}

/// Why the remote side ended the stream
#[derive(Debug, Clone, PartialEq)]
pub struct CloseReason {
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.reason.is_empty()) {
            (Some(code), true) => write!(f, "closed with code {code}"),
            (Some(code), false) => write!(f, "closed with code {code}: {}", self.reason),
            (None, true) => write!(f, "closed"),
            (None, false) => write!(f, "{}", self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Text(String),
    Closed(CloseReason),
}

/// Writing half of a transport
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Keep-alive ping
    async fn ping(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Reading half of a transport
#[async_trait]
pub trait FrameStream: Send {
    /// Next text frame, or the close reason once the stream has ended
    async fn receive(&mut self) -> Result<Incoming, TransportError>;
}

pub type BoxedSink = Box<dyn FrameSink>;
pub type BoxedStream = Box<dyn FrameStream>;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> Result<(BoxedSink, BoxedStream), TransportError>;
}

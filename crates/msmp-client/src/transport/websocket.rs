//! WebSocket transport (tokio-tungstenite)

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::{
    BoxedSink, BoxedStream, CloseReason, Connector, Endpoint, FrameSink, FrameStream, Incoming,
};
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to `ws://` and `wss://` management endpoints
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> Result<(BoxedSink, BoxedStream), TransportError> {
        let mut request = endpoint
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;

        for (name, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidEndpoint(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidEndpoint(format!("header {name}: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        debug!(url = %endpoint.url, "Opening websocket");
        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        debug!(status = %response.status(), "Websocket handshake complete");

        let (sink, stream) = stream.split();
        Ok((Box::new(WsSink { sink }), Box::new(WsFrames { stream })))
    }
}

struct WsSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.sink
            .send(Message::Ping(Default::default()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }
}

struct WsFrames {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameStream for WsFrames {
    async fn receive(&mut self) -> Result<Incoming, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Incoming::Text(text.as_str().to_string()))
                }
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Ok(Incoming::Text(text)),
                    Err(_) => {
                        warn!(len = data.len(), "Ignoring non-UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = match frame {
                        Some(frame) => {
                            CloseReason::new(Some(u16::from(frame.code)), frame.reason.as_str())
                        }
                        None => CloseReason::new(None, "closed by server"),
                    };
                    return Ok(Incoming::Closed(reason));
                }
                // Pongs to server pings are queued by tungstenite and flushed on the next write
                Some(Ok(message)) => {
                    trace!(?message, "Control frame");
                    continue;
                }
                Some(Err(e)) => return Err(TransportError::WebSocket(e.to_string())),
                None => return Ok(Incoming::Closed(CloseReason::new(None, "stream ended"))),
            }
        }
    }
}

//! Routes inbound packets to waiting calls and to the event stream

use msmp_core::wire::Packet;
use msmp_core::{Event, RegistryRef};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::error::ClientError;
use crate::pending::PendingCalls;

pub struct Dispatcher {
    pending: Arc<PendingCalls>,
    registry: RegistryRef,
    events: broadcast::Sender<Event>,
}

impl Dispatcher {
    pub fn new(
        pending: Arc<PendingCalls>,
        registry: RegistryRef,
        events: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            pending,
            registry,
            events,
        }
    }

    /// Dispatch one text frame. Only a frame that is not JSON at all is an error.
    pub fn dispatch_frame(&self, frame: &str) -> serde_json::Result<()> {
        trace!(%frame, "Incoming frame");
        let value: Value = serde_json::from_str(frame)?;
        self.dispatch_value(value);
        Ok(())
    }

    pub fn dispatch_value(&self, value: Value) {
        match value {
            Value::Array(packets) => {
                for packet in packets {
                    self.dispatch_value(packet);
                }
            }
            packet => self.dispatch_packet(packet),
        }
    }

    fn dispatch_packet(&self, packet: Value) {
        match Packet::from_value(packet) {
            Ok(Packet::Response(response)) => {
                let id = response.id;
                let result = response.into_result().map_err(ClientError::Rpc);
                if !self.pending.complete(id, result) {
                    debug!(id, "Response for a call that is no longer pending");
                }
            }
            Ok(Packet::Notification(notification)) => {
                let event = self.registry.get().resolve(&notification);
                debug!(method = %notification.method, "Notification");
                self.emit(event);
            }
            Err(e) => warn!(error = %e, "Skipping malformed packet"),
        }
    }

    /// Broadcast an event; lagging listeners lose the oldest buffered events
    pub fn emit(&self, event: Event) {
        // No listeners is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msmp_core::models::Player;
    use msmp_core::{ErrorKind, EventRegistry};
    use serde_json::json;

    fn dispatcher(buffer: usize) -> (Dispatcher, Arc<PendingCalls>, broadcast::Receiver<Event>) {
        let pending = Arc::new(PendingCalls::new());
        let (events, rx) = broadcast::channel(buffer);
        let dispatcher = Dispatcher::new(
            pending.clone(),
            RegistryRef::Owned(Arc::new(EventRegistry::with_builtin())),
            events,
        );
        (dispatcher, pending, rx)
    }

    #[tokio::test]
    async fn test_response_completes_matching_call() {
        let (dispatcher, pending, _events) = dispatcher(8);
        let first = pending.register(0);
        let second = pending.register(1);

        dispatcher
            .dispatch_frame(r#"{"jsonrpc":"2.0","id":1,"result":[{"name":"Bob"}]}"#)
            .unwrap();
        dispatcher
            .dispatch_frame(r#"{"jsonrpc":"2.0","id":0,"result":[{"name":"Alice"}]}"#)
            .unwrap();

        assert_eq!(first.await.unwrap().unwrap(), json!([{"name": "Alice"}]));
        assert_eq!(second.await.unwrap().unwrap(), json!([{"name": "Bob"}]));
    }

    #[tokio::test]
    async fn test_error_response_is_typed() {
        let (dispatcher, pending, _events) = dispatcher(8);
        let rx = pending.register(4);

        dispatcher
            .dispatch_frame(
                r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32602,"message":"Invalid params","data":"expected a player"}}"#,
            )
            .unwrap();

        let err = rx.await.unwrap().unwrap_err();
        let rpc = err.rpc().unwrap();
        assert_eq!(rpc.kind, ErrorKind::InvalidParams);
        assert_eq!(rpc.data.as_deref(), Some("expected a player"));
    }

    #[tokio::test]
    async fn test_batch_frame_mixes_responses_and_notifications() {
        let (dispatcher, pending, mut events) = dispatcher(8);
        let rx = pending.register(2);

        dispatcher
            .dispatch_frame(
                r#"[
                    {"jsonrpc":"2.0","id":2,"result":true},
                    {"method":"minecraft:notification/players/joined","params":[{"name":"Alice"}]}
                ]"#,
            )
            .unwrap();

        assert_eq!(rx.await.unwrap().unwrap(), json!(true));
        assert_eq!(
            events.recv().await.unwrap(),
            Event::PlayerJoined(Player::named("Alice"))
        );
    }

    #[tokio::test]
    async fn test_unmapped_notification_is_unknown_event() {
        let (dispatcher, _pending, mut events) = dispatcher(8);

        dispatcher
            .dispatch_frame(r#"{"method":"foo:bar","params":[{"x":1}]}"#)
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            Event::Unknown {
                method: "foo:bar".to_string(),
                params: json!([{"x": 1}]),
            }
        );
    }

    #[tokio::test]
    async fn test_late_and_malformed_packets_are_ignored() {
        let (dispatcher, _pending, _events) = dispatcher(8);

        assert!(dispatcher
            .dispatch_frame(r#"{"jsonrpc":"2.0","id":99,"result":null}"#)
            .is_ok());
        assert!(dispatcher.dispatch_frame(r#"{"id":"abc"}"#).is_ok());
        assert!(dispatcher.dispatch_frame(r#"[1, 2, 3]"#).is_ok());
        assert!(dispatcher.dispatch_frame("not json").is_err());
    }

    #[tokio::test]
    async fn test_slow_listener_loses_oldest_events() {
        let (dispatcher, _pending, mut events) = dispatcher(2);

        for _ in 0..3 {
            dispatcher
                .dispatch_frame(r#"{"method":"minecraft:notification/server/saving"}"#)
                .unwrap();
        }
        dispatcher
            .dispatch_frame(r#"{"method":"minecraft:notification/server/saved"}"#)
            .unwrap();

        assert!(matches!(
            events.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(events.recv().await.unwrap(), Event::ServerSaving);
        assert_eq!(events.recv().await.unwrap(), Event::ServerSaved);
    }
}

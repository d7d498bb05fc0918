//! End-to-end tests against a real websocket server

use futures::{SinkExt, StreamExt};
use msmp_client::{ClientConfig, ClientError, ClientState, Event, MsmpClient, Params};
use msmp_core::models::Player;
use msmp_core::ErrorKind;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

const STOPPING: &str = r#"{"method":"minecraft:notification/server/stopping"}"#;

fn reply(request: &Value) -> Value {
    let id = request["id"].clone();
    match request["method"].as_str().unwrap_or_default() {
        "minecraft:players" => json!({"jsonrpc": "2.0", "id": id, "result": [{"name": "Alice"}]}),
        "minecraft:server/stop" => json!({"jsonrpc": "2.0", "id": id, "result": true}),
        "test:echo" => json!({"jsonrpc": "2.0", "id": id, "result": request["params"]}),
        _ => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "Method not found"}
        }),
    }
}

/// Serve one connection; reports the Authorization header it was opened with
async fn spawn_server() -> (String, oneshot::Receiver<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let (auth_tx, auth_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut auth = None;
        let capture = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            auth = req
                .headers()
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(String::from);
            Ok(resp)
        };
        let ws = tokio_tungstenite::accept_hdr_async(stream, capture)
            .await
            .unwrap();
        let _ = auth_tx.send(auth);

        let (mut write, mut read) = ws.split();
        let joined = json!({
            "method": "minecraft:notification/players/joined",
            "params": [{"name": "Alice"}]
        });
        write
            .send(Message::Text(joined.to_string().into()))
            .await
            .unwrap();

        while let Some(Ok(message)) = read.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let batch: Vec<Value> = serde_json::from_str(text.as_str()).unwrap();
            let stopping = batch
                .iter()
                .any(|request| request["method"] == "minecraft:server/stop");
            let replies: Vec<Value> = batch.iter().map(reply).collect();

            write
                .send(Message::Text(Value::Array(replies).to_string().into()))
                .await
                .unwrap();
            if stopping {
                write.send(Message::Text(STOPPING.into())).await.unwrap();
            }
        }
    });

    (url, auth_rx)
}

#[tokio::test]
async fn test_calls_and_events_over_websocket() {
    let (url, auth) = spawn_server().await;
    let client = MsmpClient::connect(ClientConfig::new(url).with_secret("s3cret"))
        .await
        .unwrap();
    let mut events = client.events();

    assert_eq!(auth.await.unwrap().as_deref(), Some("Bearer s3cret"));
    assert_eq!(events.next().await, Some(Event::ConnectionEstablished));
    assert_eq!(
        events.next().await,
        Some(Event::PlayerJoined(Player::named("Alice")))
    );

    let (players, missing, echo) = tokio::join!(
        client.players(),
        client.call("minecraft:nope", Params::None),
        client.call("test:echo", Params::single(&json!({"n": 1})).unwrap()),
    );
    assert_eq!(players.unwrap(), vec![Player::named("Alice")]);
    assert_eq!(
        missing.unwrap_err().rpc().map(|e| e.kind.clone()),
        Some(ErrorKind::MethodNotFound)
    );
    assert_eq!(echo.unwrap(), json!([{"n": 1}]));

    client.close().await;
    assert!(matches!(
        events.next().await,
        Some(Event::ConnectionClosed { retry: false, .. })
    ));
    assert_eq!(events.next().await, None);
    assert!(matches!(
        client.call("minecraft:players", Params::None).await,
        Err(ClientError::Closed)
    ));
}

#[tokio::test]
async fn test_server_stop_closes_client() {
    let (url, _auth) = spawn_server().await;
    let client = MsmpClient::connect(ClientConfig::new(url)).await.unwrap();

    assert!(client.stop().await.unwrap());

    let mut state = client.state();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(ClientState::is_closed))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_refused_connection_fails_fast() {
    let url = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("ws://{}", listener.local_addr().unwrap())
    };

    let client = MsmpClient::connect(ClientConfig::new(url)).await.unwrap();
    let err = client.call("minecraft:players", Params::None).await.unwrap_err();

    assert!(matches!(err, ClientError::Closed));
    assert!(client.is_closed());
}

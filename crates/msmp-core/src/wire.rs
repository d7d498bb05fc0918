//! JSON-RPC wire envelopes as spoken by the management server
//!
//! MSMP borrows the JSON-RPC 2.0 envelope but always passes positional parameters:
//! `[]` for calls without an argument and `[value]` for calls with one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// Outgoing call request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    pub params: Value,
    #[serde(default = "default_version")]
    pub jsonrpc: String,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Params) -> Self {
        Self {
            id,
            method: method.into(),
            params: params.into_value(),
            jsonrpc: default_version(),
        }
    }
}

/// Positional call parameters.
///
/// `Single` carries the one logical argument of a call. A list argument (for example a
/// set of players) is still one argument and is wrapped as `[[...]]` on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Single(Value),
}

impl Params {
    pub fn single<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(Self::Single(serde_json::to_value(value)?))
    }

    /// Encode a collection as the single argument of a call.
    pub fn many<I, T>(values: I) -> serde_json::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let values = values
            .into_iter()
            .map(|value| serde_json::to_value(&value))
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self::Single(Value::Array(values)))
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::None => Value::Array(Vec::new()),
            Self::Single(value) => Value::Array(vec![value]),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, InvalidParams> {
        match value {
            Value::Null => Ok(Self::None),
            Value::Array(mut items) => match items.len() {
                0 => Ok(Self::None),
                1 => Ok(Self::Single(items.remove(0))),
                n => Err(InvalidParams(format!("expected at most one argument, got {n}"))),
            },
            other => Err(InvalidParams(format!(
                "params must be a positional array, got {other}"
            ))),
        }
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid params: {0}")]
pub struct InvalidParams(pub String);

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Incoming call response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: ErrorObject) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Collapse into the call outcome. A response without `result` or `error` is a null result.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(error) => Err(RpcError::from(error)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Server-pushed notification (no id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: impl Into<String>, context: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params: context.map(|value| Value::Array(vec![value])),
        }
    }

    /// The event context: first element of `params`, or null.
    ///
    /// A non-array `params` is taken as the context itself.
    pub fn context(&self) -> Value {
        match &self.params {
            None | Some(Value::Null) => Value::Null,
            Some(Value::Array(items)) => items.first().cloned().unwrap_or(Value::Null),
            Some(other) => other.clone(),
        }
    }

    pub fn raw_params(&self) -> Value {
        self.params.clone().unwrap_or(Value::Null)
    }
}

/// A single decoded inbound packet
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Response(Response),
    Notification(Notification),
}

impl Packet {
    /// Classify by the presence of a non-null `id`.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let has_id = value.get("id").is_some_and(|id| !id.is_null());
        if has_id {
            Ok(Self::Response(serde_json::from_value(value)?))
        } else {
            Ok(Self::Notification(serde_json::from_value(value)?))
        }
    }
}

/// JSON-RPC error classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Unknown { code: i64, message: String },
}

impl ErrorKind {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            Self::PARSE_ERROR => Self::ParseError,
            Self::INVALID_REQUEST => Self::InvalidRequest,
            Self::METHOD_NOT_FOUND => Self::MethodNotFound,
            Self::INVALID_PARAMS => Self::InvalidParams,
            Self::INTERNAL_ERROR => Self::InternalError,
            code => Self::Unknown {
                code,
                message: message.into(),
            },
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::ParseError => Self::PARSE_ERROR,
            Self::InvalidRequest => Self::INVALID_REQUEST,
            Self::MethodNotFound => Self::METHOD_NOT_FOUND,
            Self::InvalidParams => Self::INVALID_PARAMS,
            Self::InternalError => Self::INTERNAL_ERROR,
            Self::Unknown { code, .. } => *code,
        }
    }
}

/// A server-reported call failure
#[derive(Debug, Clone, PartialEq, Error)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<String>,
}

impl From<ErrorObject> for RpcError {
    fn from(error: ErrorObject) -> Self {
        let data = error.data.map(|data| match data {
            Value::String(text) => text,
            other => other.to_string(),
        });
        Self {
            code: error.code,
            kind: ErrorKind::from_code(error.code, error.message.clone()),
            message: error.message,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn test_request_wire_format() {
        let params = Params::many(["Alice", "Bob"]).unwrap();
        let req = Request::new(0, "minecraft:allowlist/add", params);

        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"id":0,"method":"minecraft:allowlist/add","params":[["Alice","Bob"]],"jsonrpc":"2.0"}"#
        );
    }

    #[test]
    fn test_params_shapes_decode_back() {
        let none = Params::None;
        assert_eq!(Params::from_value(none.clone().into_value()).unwrap(), none);

        let single = Params::single(&json!({"name": "Alice"})).unwrap();
        assert_eq!(
            Params::from_value(single.clone().into_value()).unwrap(),
            single
        );

        let names: BTreeSet<&str> = ["Bob", "Alice"].into_iter().collect();
        let set = Params::many(&names).unwrap();
        assert_eq!(set.clone().into_value(), json!([["Alice", "Bob"]]));
        assert_eq!(Params::from_value(set.clone().into_value()).unwrap(), set);
    }

    #[test]
    fn test_params_rejects_multiple_arguments() {
        assert!(Params::from_value(json!([1, 2])).is_err());
        assert!(Params::from_value(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_response_without_result_is_null() {
        let resp: Response = serde_json::from_value(json!({"jsonrpc": "2.0", "id": 3})).unwrap();
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn test_response_error_maps_kind_and_data() {
        let resp: Response = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found", "data": "minecraft:nope"}
        }))
        .unwrap();

        let err = resp.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MethodNotFound);
        assert_eq!(err.data.as_deref(), Some("minecraft:nope"));
        assert_eq!(err.to_string(), "RPC error -32601: Method not found");
    }

    #[test]
    fn test_error_kind_mapping_is_total() {
        for code in [-32700, -32600, -32601, -32602, -32603] {
            assert_eq!(ErrorKind::from_code(code, "x").code(), code);
        }
        assert_eq!(
            ErrorKind::from_code(-32000, "custom"),
            ErrorKind::Unknown {
                code: -32000,
                message: "custom".to_string()
            }
        );
    }

    #[test]
    fn test_packet_classification() {
        let packet = Packet::from_value(json!({"jsonrpc": "2.0", "id": 7, "result": []})).unwrap();
        assert!(matches!(packet, Packet::Response(Response { id: 7, .. })));

        let packet = Packet::from_value(json!({
            "method": "minecraft:notification/players/joined",
            "params": [{"name": "Alice"}],
            "id": null
        }))
        .unwrap();
        match packet {
            Packet::Notification(n) => assert_eq!(n.context(), json!({"name": "Alice"})),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn test_notification_context_defaults_to_null() {
        let n = Notification::new("minecraft:notification/server/started", None);
        assert_eq!(n.context(), Value::Null);
        assert_eq!(n.raw_params(), Value::Null);

        let n: Notification =
            serde_json::from_value(json!({"method": "x", "params": []})).unwrap();
        assert_eq!(n.context(), Value::Null);
    }
}

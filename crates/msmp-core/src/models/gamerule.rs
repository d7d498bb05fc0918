//! Game rule models

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameRuleType {
    Boolean,
    Integer,
}

/// A game rule as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedGameRule {
    #[serde(rename = "type")]
    pub kind: GameRuleType,
    pub key: String,
    pub value: Value,
}

impl TypedGameRule {
    /// Boolean value; the server may encode it as a string
    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            Value::Bool(value) => Some(*value),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }
}

/// A game rule update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntypedGameRule {
    pub key: String,
    pub value: Value,
}

impl UntypedGameRule {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

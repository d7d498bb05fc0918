//! Server state, messages and settings enums

use super::Player;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerState {
    #[serde(default)]
    pub players: Vec<Player>,
    pub started: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

/// A chat component: either a literal or a translation key with parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translatable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translatable_params: Option<Vec<String>>,
}

impl Message {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            literal: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn translatable(key: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            literal: None,
            translatable: Some(key.into()),
            translatable_params: Some(params),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub message: Message,
    /// Show above the hotbar instead of in chat
    pub overlay: bool,
    /// `None` broadcasts to everyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiving_players: Option<Vec<Player>>,
}

impl SystemMessage {
    pub fn broadcast(message: Message) -> Self {
        Self {
            message,
            overlay: false,
            receiving_players: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickPlayer {
    pub player: Player,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Peaceful,
    Easy,
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

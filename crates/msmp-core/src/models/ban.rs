//! Ban list models

use super::Player;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBan {
    pub player: Player,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Expiry timestamp as reported by the server; `None` is permanent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl UserBan {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            reason: None,
            source: None,
            expires: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpBan {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl IpBan {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            reason: None,
            source: None,
            expires: None,
        }
    }
}

/// An IP ban request; the server resolves `player` to its current address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingIpBan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl IncomingIpBan {
    pub fn ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Self::default()
        }
    }

    pub fn player(player: Player) -> Self {
        Self {
            player: Some(player),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.ip, &self.player) {
            (None, None) => Err(Error::Validation(
                "IP ban needs an address or a player".to_string(),
            )),
            (_, Some(player)) => player.validate(),
            _ => Ok(()),
        }
    }
}

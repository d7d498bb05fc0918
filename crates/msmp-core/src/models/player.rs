//! Player and operator models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A player reference. The server accepts either field; it fills in both when replying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Player {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Player {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    /// Validate the player reference
    pub fn validate(&self) -> Result<()> {
        let blank = |field: &Option<String>| field.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank(&self.id) && blank(&self.name) {
            return Err(Error::Validation(
                "Player needs an id or a name".to_string(),
            ));
        }
        Ok(())
    }

    /// Name if known, otherwise the id
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub player: Player,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypasses_player_limit: Option<bool>,
}

impl Operator {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            permission_level: None,
            bypasses_player_limit: None,
        }
    }

    /// Validate the operator entry. Permission levels run from 0 to 4.
    pub fn validate(&self) -> Result<()> {
        self.player.validate()?;
        if let Some(level) = self.permission_level {
            if level > 4 {
                return Err(Error::Validation(format!(
                    "Invalid permission level {}. Must be between 0 and 4",
                    level
                )));
            }
        }
        Ok(())
    }
}

//! Mojang API types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::textures::{self, Textures};
use crate::Result;

/// A player profile. Name lookups only fill `id` and `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ProfileProperty>,
    /// Present when the account has a legacy or demo flag
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub legacy: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub demo: bool,
}

impl GameProfile {
    /// Dashed UUID form, as used by the management protocol
    pub fn hyphenated_id(&self) -> String {
        self.id.hyphenated().to_string()
    }

    pub fn property(&self, name: &str) -> Option<&ProfileProperty> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Decode the `textures` property, if the profile carries one
    pub fn textures(&self) -> Result<Option<Textures>> {
        self.property(textures::PROPERTY_NAME)
            .map(|property| textures::decode(&property.value))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    /// Base64-encoded JSON
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Error body returned by the Mojang endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ApiError {
    pub fn describe(self, status: reqwest::StatusCode) -> String {
        self.error_message
            .or(self.error)
            .unwrap_or_else(|| status.to_string())
    }
}

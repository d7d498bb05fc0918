//! The `textures` profile property

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::Result;

pub const PROPERTY_NAME: &str = "textures";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Textures {
    pub timestamp: i64,
    pub profile_id: String,
    pub profile_name: String,
    #[serde(default)]
    pub signature_required: bool,
    #[serde(default)]
    pub textures: TextureSet,
}

impl Textures {
    pub fn skin_url(&self) -> Option<&str> {
        self.textures.skin.as_ref().map(|skin| skin.url.as_str())
    }

    pub fn cape_url(&self) -> Option<&str> {
        self.textures.cape.as_ref().map(|cape| cape.url.as_str())
    }

    pub fn skin_model(&self) -> SkinModel {
        self.textures
            .skin
            .as_ref()
            .and_then(|skin| skin.metadata.as_ref())
            .and_then(|metadata| metadata.model)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureSet {
    #[serde(rename = "SKIN", default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<Texture>,
    #[serde(rename = "CAPE", default, skip_serializing_if = "Option::is_none")]
    pub cape: Option<Texture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TextureMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<SkinModel>,
}

/// Arm width of the skin. Skins without metadata use the classic model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinModel {
    #[default]
    Classic,
    Slim,
}

/// Decode a base64 `textures` property value
pub fn decode(value: &str) -> Result<Textures> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

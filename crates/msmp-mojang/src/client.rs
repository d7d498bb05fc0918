//! HTTP client for the Mojang profile endpoints

use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ApiError, GameProfile};

pub const API_URL: &str = "https://api.mojang.com";
pub const SESSION_URL: &str = "https://sessionserver.mojang.com";
pub const SERVICES_URL: &str = "https://api.minecraftservices.com";

/// Bulk lookups accept at most this many names
pub const MAX_BULK_NAMES: usize = 10;

const USER_AGENT: &str = concat!("msmp-rs/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct MojangClient {
    client: Client,
    api_url: String,
    session_url: String,
    services_url: String,
}

impl MojangClient {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(API_URL, SESSION_URL, SERVICES_URL)
    }

    /// Point the client at other hosts, e.g. a mirror or a local test server
    pub fn with_base_urls(
        api_url: impl Into<String>,
        session_url: impl Into<String>,
        services_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: trim(api_url.into()),
            session_url: trim(session_url.into()),
            services_url: trim(services_url.into()),
        })
    }

    /// Resolve a player name. `None` when no account has that name.
    pub async fn profile_by_name(&self, name: &str) -> Result<Option<GameProfile>> {
        let url = endpoint(&self.api_url, &["users", "profiles", "minecraft", name])?;
        debug!(%url, "Looking up profile by name");

        let response = self.client.get(url).send().await?;
        parse_optional(response).await
    }

    /// Fetch a full profile, including its signed properties.
    ///
    /// Accepts the UUID with or without dashes.
    pub async fn profile_by_uuid(&self, uuid: &str) -> Result<Option<GameProfile>> {
        let uuid = parse_uuid(uuid)?;
        let url = format!(
            "{}/session/minecraft/profile/{}?unsigned=false",
            self.session_url,
            uuid.simple()
        );
        debug!(%url, "Looking up profile by UUID");

        let response = self.client.get(&url).send().await?;
        parse_optional(response).await
    }

    /// Resolve up to [`MAX_BULK_NAMES`] names in one request. Unknown names are omitted.
    pub async fn profiles_by_names(&self, names: &[&str]) -> Result<Vec<GameProfile>> {
        if names.len() > MAX_BULK_NAMES {
            return Err(Error::TooManyNames(names.len()));
        }
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/minecraft/profile/lookup/bulk/byname",
            self.services_url
        );
        debug!(%url, count = names.len(), "Bulk profile lookup");

        let response = self.client.post(&url).json(names).send().await?;
        match parse_optional(response).await? {
            Some(profiles) => Ok(profiles),
            None => Ok(Vec::new()),
        }
    }
}

/// `base` with `segments` appended, each percent-encoded as a single path segment
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn trim(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

pub fn parse_uuid(uuid: &str) -> Result<Uuid> {
    Uuid::try_parse(uuid.trim()).map_err(|_| Error::InvalidUuid(uuid.to_string()))
}

/// Decode a body, mapping "no content" and "not found" to `None`
async fn parse_optional<T: serde::de::DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|error| error.describe(status))
            .unwrap_or_else(|_| status.to_string());
        return Err(Error::Api(message));
    }

    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&body)?))
}

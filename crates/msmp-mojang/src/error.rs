//! Error types for Mojang lookups

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid UUID '{0}'")]
    InvalidUuid(String),

    #[error("Invalid textures payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Mojang API error: {0}")]
    Api(String),

    #[error("Too many names: {0} (at most {max} per request)", max = crate::client::MAX_BULK_NAMES)]
    TooManyNames(usize),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

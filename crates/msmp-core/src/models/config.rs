//! Client configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default management endpoint of a dedicated server
pub const DEFAULT_URL: &str = "ws://localhost:25585";

/// Exponent cap for reconnect backoff
pub const MAX_BACKOFF_EXPONENT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    /// Bearer token sent in the `Authorization` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Extra handshake headers
    pub headers: BTreeMap<String, String>,
    pub auto_reconnect: bool,
    #[serde(with = "duration_ms")]
    pub connect_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
    pub event_buffer_size: usize,
    /// Give up immediately when the very first connection attempt fails
    pub fail_fast: bool,
    /// `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
    #[serde(with = "duration_ms")]
    pub initial_retry_delay: Duration,
    #[serde(with = "duration_ms")]
    pub max_retry_delay: Duration,
    /// Window over which outgoing calls are coalesced; zero disables waiting
    #[serde(with = "duration_ms")]
    pub batch_delay: Duration,
    #[serde(with = "option_duration_ms", skip_serializing_if = "Option::is_none")]
    pub ping_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            secret: None,
            headers: BTreeMap::new(),
            auto_reconnect: true,
            connect_timeout: Duration::from_millis(3_000),
            request_timeout: Duration::from_millis(10_000),
            event_buffer_size: 64,
            fail_fast: true,
            max_reconnect_attempts: None,
            initial_retry_delay: Duration::from_millis(1_000),
            max_retry_delay: Duration::from_millis(30_000),
            batch_delay: Duration::from_millis(30),
            ping_interval: None,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_retry_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_retry_delay = initial;
        self.max_retry_delay = max;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_ping_interval(mut self, interval: Option<Duration>) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(Error::Validation("URL cannot be empty".to_string()));
        }

        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(Error::Validation(format!(
                "URL '{}' must use the ws:// or wss:// scheme",
                url
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Validation(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(Error::Validation(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_retry_delay.is_zero() {
            return Err(Error::Validation(
                "Max retry delay must be greater than 0".to_string(),
            ));
        }

        if self.initial_retry_delay > self.max_retry_delay {
            return Err(Error::Validation(
                "Initial retry delay cannot exceed max retry delay".to_string(),
            ));
        }

        if matches!(self.ping_interval, Some(interval) if interval.is_zero()) {
            return Err(Error::Validation(
                "Ping interval must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Backoff before jitter: `min(initial * 2^min(attempt, 10), max)`
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_EXPONENT);
        self.initial_retry_delay
            .saturating_mul(factor)
            .min(self.max_retry_delay)
    }

    /// Whether another reconnect may follow `attempts` already made
    pub fn allows_attempt(&self, attempts: u32) -> bool {
        self.max_reconnect_attempts.map_or(true, |max| attempts < max)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

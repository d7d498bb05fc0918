//! Process-wide notification → event registry
//!
//! Readers load an immutable snapshot; writers publish a modified copy. A lookup never
//! waits on a registration and never fails: anything it cannot decode becomes
//! [`Event::Unknown`].

use arc_swap::ArcSwap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::events::{methods, Event};
use crate::wire::Notification;

/// How a notification's context payload becomes an [`Event`]
#[derive(Debug, Clone)]
pub enum EventProvider {
    /// Deserialize the payload into a concrete event
    Data(fn(Value) -> serde_json::Result<Event>),
    /// Ignore the payload and return a fixed event
    Singleton(Event),
    /// Caller-supplied decoder; receives `None` when the payload is null
    Custom(fn(Option<Value>) -> Event),
}

impl EventProvider {
    fn decode(&self, notification: &Notification) -> Event {
        match self {
            Self::Singleton(event) => event.clone(),
            Self::Custom(decode) => {
                let context = Some(notification.context()).filter(|value| !value.is_null());
                decode(context)
            }
            Self::Data(decode) => match decode(notification.context()) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(
                        method = %notification.method,
                        error = %e,
                        "Notification payload did not decode"
                    );
                    unknown(notification)
                }
            },
        }
    }
}

fn unknown(notification: &Notification) -> Event {
    Event::Unknown {
        method: notification.method.clone(),
        params: notification.raw_params(),
    }
}

type ProviderMap = HashMap<String, EventProvider>;

pub struct EventRegistry {
    providers: ArcSwap<ProviderMap>,
}

impl EventRegistry {
    /// Registry without any providers
    pub fn empty() -> Self {
        Self {
            providers: ArcSwap::from_pointee(ProviderMap::new()),
        }
    }

    /// Registry pre-populated with the built-in catalog
    pub fn with_builtin() -> Self {
        let registry = Self::empty();
        registry.register_all(builtin_catalog());
        registry
    }

    /// The shared registry used by every connection in the process
    pub fn global() -> &'static EventRegistry {
        static GLOBAL: OnceLock<EventRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::with_builtin)
    }

    /// Register a provider; a later registration for the same method replaces it
    pub fn register(&self, method: impl Into<String>, provider: EventProvider) {
        self.register_all([(method.into(), provider)]);
    }

    pub fn register_all<I>(&self, providers: I)
    where
        I: IntoIterator<Item = (String, EventProvider)>,
    {
        let providers: Vec<_> = providers.into_iter().collect();
        self.providers.rcu(|current| {
            let mut next = ProviderMap::clone(current);
            next.extend(providers.iter().cloned());
            next
        });
    }

    pub fn contains(&self, method: &str) -> bool {
        self.providers.load().contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.providers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.load().is_empty()
    }

    pub fn resolve(&self, notification: &Notification) -> Event {
        let providers = self.providers.load();
        match providers.get(&notification.method) {
            Some(provider) => provider.decode(notification),
            None => unknown(notification),
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("providers", &self.len())
            .finish()
    }
}

fn builtin_catalog() -> Vec<(String, EventProvider)> {
    use EventProvider::{Data, Singleton};

    vec![
        (methods::SERVER_STARTED, Singleton(Event::ServerStarted)),
        (methods::SERVER_STOPPING, Singleton(Event::ServerStopping)),
        (methods::SERVER_SAVING, Singleton(Event::ServerSaving)),
        (methods::SERVER_SAVED, Singleton(Event::ServerSaved)),
        (methods::SERVER_ACTIVITY, Singleton(Event::ServerActivity)),
        (
            methods::SERVER_STATUS,
            Data(|v| serde_json::from_value(v).map(Event::ServerStatus)),
        ),
        (
            methods::PLAYERS_JOINED,
            Data(|v| serde_json::from_value(v).map(Event::PlayerJoined)),
        ),
        (
            methods::PLAYERS_LEFT,
            Data(|v| serde_json::from_value(v).map(Event::PlayerLeft)),
        ),
        (
            methods::OPERATORS_ADDED,
            Data(|v| serde_json::from_value(v).map(Event::OperatorAdded)),
        ),
        (
            methods::OPERATORS_REMOVED,
            Data(|v| serde_json::from_value(v).map(Event::OperatorRemoved)),
        ),
        (
            methods::ALLOWLIST_ADDED,
            Data(|v| serde_json::from_value(v).map(Event::AllowlistAdded)),
        ),
        (
            methods::ALLOWLIST_REMOVED,
            Data(|v| serde_json::from_value(v).map(Event::AllowlistRemoved)),
        ),
        (
            methods::IP_BANS_ADDED,
            Data(|v| serde_json::from_value(v).map(Event::IpBanAdded)),
        ),
        (
            methods::IP_BANS_REMOVED,
            Data(|v| serde_json::from_value(v).map(Event::IpBanRemoved)),
        ),
        (
            methods::BANS_ADDED,
            Data(|v| serde_json::from_value(v).map(Event::BanAdded)),
        ),
        (
            methods::BANS_REMOVED,
            Data(|v| serde_json::from_value(v).map(Event::BanRemoved)),
        ),
        (
            methods::GAMERULES_UPDATED,
            Data(|v| serde_json::from_value(v).map(Event::GameRuleUpdated)),
        ),
    ]
    .into_iter()
    .map(|(method, provider)| (method.to_string(), provider))
    .collect()
}

/// Handle to a registry, either the process-wide one or a private instance
#[derive(Debug, Clone)]
pub enum RegistryRef {
    Global,
    Owned(Arc<EventRegistry>),
}

impl RegistryRef {
    pub fn get(&self) -> &EventRegistry {
        match self {
            Self::Global => EventRegistry::global(),
            Self::Owned(registry) => registry,
        }
    }
}

impl Default for RegistryRef {
    fn default() -> Self {
        Self::Global
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Player;
    use serde_json::json;

    fn notification(method: &str, params: Value) -> Notification {
        serde_json::from_value(json!({"method": method, "params": params})).unwrap()
    }

    #[test]
    fn test_builtin_data_provider() {
        let registry = EventRegistry::with_builtin();
        let event = registry.resolve(&notification(
            methods::PLAYERS_JOINED,
            json!([{"name": "Alice"}]),
        ));
        assert_eq!(event, Event::PlayerJoined(Player::named("Alice")));
    }

    #[test]
    fn test_singleton_ignores_payload() {
        let registry = EventRegistry::with_builtin();
        let event = registry.resolve(&notification(methods::SERVER_STOPPING, json!([42])));
        assert_eq!(event, Event::ServerStopping);

        let event = registry.resolve(&Notification::new(methods::SERVER_SAVED, None));
        assert_eq!(event, Event::ServerSaved);
    }

    #[test]
    fn test_unmapped_method_is_unknown() {
        let registry = EventRegistry::with_builtin();
        let event = registry.resolve(&notification("foo:bar", json!([{"x": 1}])));
        assert_eq!(
            event,
            Event::Unknown {
                method: "foo:bar".to_string(),
                params: json!([{"x": 1}]),
            }
        );
    }

    #[test]
    fn test_undecodable_payload_is_unknown() {
        let registry = EventRegistry::with_builtin();
        let event = registry.resolve(&notification(methods::PLAYERS_LEFT, json!(["nope"])));
        assert!(matches!(
            event,
            Event::Unknown { ref method, .. } if method == methods::PLAYERS_LEFT
        ));
    }

    #[test]
    fn test_custom_provider_and_last_registration_wins() {
        let registry = EventRegistry::empty();
        assert!(registry.is_empty());

        registry.register("my:event", EventProvider::Singleton(Event::ServerSaved));
        registry.register(
            "my:event",
            EventProvider::Custom(|context| match context {
                Some(value) => Event::Unknown {
                    method: "my:event/decoded".to_string(),
                    params: value,
                },
                None => Event::ServerActivity,
            }),
        );
        assert_eq!(registry.len(), 1);

        let event = registry.resolve(&notification("my:event", json!([7])));
        assert_eq!(
            event,
            Event::Unknown {
                method: "my:event/decoded".to_string(),
                params: json!(7),
            }
        );
        let event = registry.resolve(&Notification::new("my:event", None));
        assert_eq!(event, Event::ServerActivity);
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = Arc::new(EventRegistry::with_builtin());
        let builtin = registry.len();

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        registry.register(
                            format!("test:{t}/{i}"),
                            EventProvider::Singleton(Event::ServerActivity),
                        );
                    }
                })
            })
            .collect();

        let reader = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let event = registry.resolve(&Notification::new(methods::SERVER_STARTED, None));
                    assert_eq!(event, Event::ServerStarted);
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(registry.len(), builtin + 200);
    }
}

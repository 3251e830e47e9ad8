//! Configuration of a catalog service process.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Defaults that differ per entity kind (port, topic, consumer group, data
//! file) are derived from the [`EntityKind`] the process serves.

use catalog_core::record::EntityKind;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Catalog service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The entity kind served by this process.
    pub kind: EntityKind,
    /// RPC server configuration
    pub server: ServerConfig,
    /// Entity store configuration
    pub store: StoreConfig,
    /// RedPanda/Kafka configuration
    pub redpanda: RedpandaConfig,
}

/// RPC server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Entity store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the store document
    pub data_dir: PathBuf,
    /// Seed demo records into an empty store on startup
    pub seed_demo_data: bool,
}

/// RedPanda/Kafka configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedpandaConfig {
    /// Broker addresses (comma-separated)
    pub brokers: String,
    /// Topic carrying this kind's commands and notifications
    pub topic: String,
    /// Consumer group of the command intake
    pub consumer_group: String,
    /// First delay before resubscribing after the stream fails
    pub consumer_retry_delay: Duration,
    /// Bound on a single notification publish
    pub publish_timeout: Duration,
}

impl Config {
    /// Load configuration for `kind` from environment variables.
    #[must_use]
    pub fn from_env(kind: EntityKind) -> Self {
        Self::from_lookup(kind, |key| env::var(key).ok())
    }

    /// Load configuration for `kind` from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(kind: EntityKind, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            kind,
            server: ServerConfig {
                host: lookup("CATALOG_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("CATALOG_PORT")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or_else(|| kind.default_port()),
            },
            store: StoreConfig {
                data_dir: lookup("DATA_DIR").map_or_else(|| PathBuf::from("./data"), PathBuf::from),
                seed_demo_data: lookup("SEED_DEMO_DATA").is_none_or(|s| enabled(&s)),
            },
            redpanda: RedpandaConfig {
                brokers: lookup("REDPANDA_BROKERS")
                    .unwrap_or_else(|| "localhost:9092".to_string()),
                topic: lookup("CATALOG_TOPIC").unwrap_or_else(|| kind.topic().to_string()),
                consumer_group: lookup("CONSUMER_GROUP")
                    .unwrap_or_else(|| kind.consumer_group().to_string()),
                consumer_retry_delay: Duration::from_millis(
                    parsed("CONSUMER_RETRY_DELAY_MS").unwrap_or(500),
                ),
                publish_timeout: Duration::from_millis(
                    parsed("PUBLISH_TIMEOUT_MS").unwrap_or(5000),
                ),
            },
        }
    }

    /// Address the RPC server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Path of the store document (`<data_dir>/movies.json`).
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.store
            .data_dir
            .join(format!("{}.json", self.kind.collection()))
    }
}

fn enabled(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(kind: EntityKind, vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(kind, |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_follow_the_kind() {
        let movie = config(EntityKind::Movie, &[]);
        assert_eq!(movie.bind_address(), "0.0.0.0:50051");
        assert_eq!(movie.redpanda.topic, "movies_topic");
        assert_eq!(movie.redpanda.consumer_group, "movie-service-group");
        assert_eq!(movie.store_path(), PathBuf::from("./data/movies.json"));
        assert!(movie.store.seed_demo_data);

        let tvshow = config(EntityKind::TvShow, &[]);
        assert_eq!(tvshow.server.port, 50052);
        assert_eq!(tvshow.redpanda.topic, "tvshows_topic");
        assert_eq!(tvshow.redpanda.consumer_group, "tvshow-service-group");
        assert_eq!(tvshow.store_path(), PathBuf::from("./data/tvshows.json"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config(
            EntityKind::Movie,
            &[
                ("CATALOG_PORT", "6000"),
                ("DATA_DIR", "/var/lib/catalog"),
                ("SEED_DEMO_DATA", "false"),
                ("REDPANDA_BROKERS", "kafka:9092"),
                ("CONSUMER_RETRY_DELAY_MS", "250"),
                ("PUBLISH_TIMEOUT_MS", "1000"),
            ],
        );
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.store_path(), PathBuf::from("/var/lib/catalog/movies.json"));
        assert!(!config.store.seed_demo_data);
        assert_eq!(config.redpanda.brokers, "kafka:9092");
        assert_eq!(config.redpanda.consumer_retry_delay, Duration::from_millis(250));
        assert_eq!(config.redpanda.publish_timeout, Duration::from_secs(1));
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = config(
            EntityKind::Movie,
            &[("CATALOG_PORT", "http"), ("PUBLISH_TIMEOUT_MS", "soon")],
        );
        assert_eq!(config.server.port, 50051);
        assert_eq!(config.redpanda.publish_timeout, Duration::from_secs(5));
    }
}

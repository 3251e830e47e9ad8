//! Gateway configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use catalog_core::record::EntityKind;
use catalog_rpc::ClientOptions;
use std::env;
use std::time::Duration;

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Catalog service endpoints
    pub services: ServicesConfig,
    /// RedPanda/Kafka configuration
    pub redpanda: RedpandaConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Catalog service endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicesConfig {
    /// Movie service address (`host:port`)
    pub movie_addr: String,
    /// TV show service address (`host:port`)
    pub tvshow_addr: String,
    /// Bound on one RPC call
    pub rpc_timeout: Duration,
}

/// RedPanda/Kafka configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedpandaConfig {
    /// Broker addresses (comma-separated)
    pub brokers: String,
    /// Topic for movie notifications
    pub movie_topic: String,
    /// Topic for TV show notifications
    pub tvshow_topic: String,
    /// Bound on a single notification publish
    pub publish_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            Duration::from_millis(
                lookup(key)
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(default),
            )
        };
        let service = |key: &str, kind: EntityKind| {
            lookup(key).unwrap_or_else(|| format!("127.0.0.1:{}", kind.default_port()))
        };

        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PORT")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(3000),
            },
            services: ServicesConfig {
                movie_addr: service("MOVIE_SERVICE_ADDR", EntityKind::Movie),
                tvshow_addr: service("TVSHOW_SERVICE_ADDR", EntityKind::TvShow),
                rpc_timeout: millis("RPC_TIMEOUT_MS", 5000),
            },
            redpanda: RedpandaConfig {
                brokers: lookup("REDPANDA_BROKERS")
                    .unwrap_or_else(|| "localhost:9092".to_string()),
                movie_topic: lookup("MOVIE_TOPIC")
                    .unwrap_or_else(|| EntityKind::Movie.topic().to_string()),
                tvshow_topic: lookup("TVSHOW_TOPIC")
                    .unwrap_or_else(|| EntityKind::TvShow.topic().to_string()),
                publish_timeout: millis("PUBLISH_TIMEOUT_MS", 5000),
            },
        }
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Address of `kind`'s catalog service.
    #[must_use]
    pub fn service_address(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Movie => &self.services.movie_addr,
            EntityKind::TvShow => &self.services.tvshow_addr,
        }
    }

    /// Topic `kind`'s creations are announced on.
    #[must_use]
    pub fn topic(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Movie => &self.redpanda.movie_topic,
            EntityKind::TvShow => &self.redpanda.tvshow_topic,
        }
    }

    /// RPC client options.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.services.rpc_timeout,
            ..ClientOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.service_address(EntityKind::Movie), "127.0.0.1:50051");
        assert_eq!(config.service_address(EntityKind::TvShow), "127.0.0.1:50052");
        assert_eq!(config.topic(EntityKind::Movie), "movies_topic");
        assert_eq!(config.topic(EntityKind::TvShow), "tvshows_topic");
        assert_eq!(config.redpanda.brokers, "localhost:9092");
        assert_eq!(config.client_options(), ClientOptions::default());
        assert_eq!(config.redpanda.publish_timeout, Duration::from_secs(5));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config(&[
            ("PORT", "8080"),
            ("MOVIE_SERVICE_ADDR", "movies:50051"),
            ("TVSHOW_TOPIC", "shows"),
            ("RPC_TIMEOUT_MS", "750"),
            ("PUBLISH_TIMEOUT_MS", "x"),
        ]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.service_address(EntityKind::Movie), "movies:50051");
        assert_eq!(config.topic(EntityKind::TvShow), "shows");
        assert_eq!(config.client_options().timeout, Duration::from_millis(750));
        assert_eq!(config.client_options().connect_timeout, Duration::from_secs(2));
        assert_eq!(config.redpanda.publish_timeout, Duration::from_secs(5));
    }
}

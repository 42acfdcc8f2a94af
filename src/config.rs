use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Pagination defaults for the post and project feeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_count: u32,
    pub max_count: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_count: 20,
            max_count: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let feed_defaults = FeedConfig::default();
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/projectboard.db?mode=rwc".to_string()),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("SERVER_PORT", 8080),
            },
            feed: FeedConfig {
                default_count: parse_or("FEED_DEFAULT_COUNT", feed_defaults.default_count),
                max_count: parse_or("FEED_MAX_COUNT", feed_defaults.max_count),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or("PROJECTBOARD_TEST_UNSET_VARIABLE", 42u32), 42);
    }

    #[test]
    fn test_server_address() {
        let config = Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 9000,
            },
            feed: FeedConfig::default(),
        };
        assert_eq!(config.server_address(), "127.0.0.1:9000");
    }
}

//! Configuration management for Memora services.
//!
//! Configuration is loaded from (in priority order):
//! 1. `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`, `NEO4J_DATABASE`
//! 2. Environment variables (`MEMORA__` prefix, `__` separated)
//! 3. Config file (`memora.toml`)
//! 4. Defaults

use std::fmt;

use serde::Deserialize;

use crate::error::MemoraError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemoraConfig {
    pub neo4j: Neo4jSettings,
    pub log: LogSettings,
}

/// Connection settings for the Neo4j database.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jSettings {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 256,
        }
    }
}

impl fmt::Debug for Neo4jSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jSettings")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("fetch_size", &self.fetch_size)
            .finish()
    }
}

/// Logging settings, applied by binaries when installing a subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Plain environment variables that override the `[neo4j]` section.
const NEO4J_ENV_OVERRIDES: [(&str, &str); 4] = [
    ("NEO4J_URI", "neo4j.uri"),
    ("NEO4J_USERNAME", "neo4j.username"),
    ("NEO4J_PASSWORD", "neo4j.password"),
    ("NEO4J_DATABASE", "neo4j.database"),
];

impl MemoraConfig {
    /// Load from `<file_prefix>.toml` (optional) and the process environment.
    pub fn load(file_prefix: &str) -> Result<Self, MemoraError> {
        Self::load_with(file_prefix, |key| std::env::var(key).ok())
    }

    /// Load with a custom lookup for the `NEO4J_*` variables.
    pub fn load_with<F>(file_prefix: &str, env: F) -> Result<Self, MemoraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("MEMORA")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in NEO4J_ENV_OVERRIDES {
            builder = builder.set_override_option(key, env(var).filter(|v| !v.is_empty()))?;
        }

        let config: MemoraConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(neo4j = ?config.neo4j, "Loaded configuration");
        Ok(config)
    }
}

//! Service configuration
//!
//! Layered sources, later ones win:
//! 1. built-in defaults
//! 2. `config/pagewise.toml` (optional) or the file passed with `--config`
//! 3. `PAGEWISE__SECTION__KEY` environment variables (a `.env` file is loaded first)

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use pagewise_query::CountStrategy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
    #[default]
    Test,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for one list request, including its database transaction.
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite:...` or `mysql://...`
    #[serde(default)]
    pub url: String,
    pub max_connections: u32,
    /// Create the SQLite tables on startup when they are missing.
    pub create_schema: bool,
    /// Overrides the backend's default way of reading the total count.
    #[serde(default)]
    pub count_strategy: Option<CountStrategy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// Which store a database URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    MySql,
}

impl Config {
    /// Load from `path`, which must then exist, or from the default file
    /// location when it is `None`. The environment is layered on top.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config/pagewise").required(false),
        };

        config::Config::builder()
            .set_default("environment", "test")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.request_timeout_seconds", 30)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 5)?
            .set_default("database.create_schema", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("PAGEWISE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("database.url must be set".to_string());
        }
        let backend = self.database.backend()?;
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        if self.server.request_timeout_seconds == 0 {
            return Err("server.request_timeout_seconds must be at least 1".to_string());
        }
        if backend == Backend::Sqlite && self.database.count_strategy == Some(CountStrategy::FoundRows)
        {
            return Err("database.count_strategy = found_rows is not available on SQLite".to_string());
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl DatabaseConfig {
    pub fn backend(&self) -> Result<Backend, String> {
        let url = self.url.trim();
        if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if url.starts_with("mysql:") || url.starts_with("mariadb:") {
            Ok(Backend::MySql)
        } else {
            Err(format!(
                "database.url must start with sqlite: or mysql:, got '{}'",
                url
            ))
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

//! Configuration loading for the data factory.
//!
//! Connection parameters come from a YAML setup file whose string values may
//! reference environment variables with a leading `$`. Environment lookups
//! see layered `.env` files overlaid by the process environment. Tool
//! settings (logging, pool sizing, setup file location) are read from
//! `DATA_FACTORY_*` variables in the same layered environment.

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use url::Url;

/// Prefix for tool settings in the environment.
pub const ENV_PREFIX: &str = "DATA_FACTORY_";

/// Marks a YAML string as an environment variable reference.
pub const ENV_SENTINEL: char = '$';

/// Application configuration, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_db_setup_path")]
    pub db_setup_path: PathBuf,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    pub database: DatabaseSettings,
}

/// Connection descriptor read from the setup file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    /// Database name
    pub name: String,
    /// Schema holding the `customers` and `tickets` tables
    pub schema: String,
    pub username: String,
    pub password: String,
}

impl DatabaseSettings {
    /// Builds a `postgres://` URL, percent-encoding the credentials.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse("postgres://localhost").map_err(ConfigError::InvalidUrl)?;
        url.set_host(Some(&self.host)).map_err(ConfigError::InvalidUrl)?;
        url.set_port(Some(self.port))
            .map_err(|_| ConfigError::InvalidValue {
                key: "database.port",
                reason: format!("{} cannot be used as a port", self.port),
            })?;
        url.set_username(&self.username)
            .map_err(|_| ConfigError::InvalidValue {
                key: "database.users.rw_username",
                reason: "username cannot be set on the URL".to_string(),
            })?;
        url.set_password(Some(&self.password))
            .map_err(|_| ConfigError::InvalidValue {
                key: "database.users.rw_password",
                reason: "password cannot be set on the URL".to_string(),
            })?;
        url.set_path(&format!("/{}", self.name));
        Ok(url.into())
    }
}

impl AppConfig {
    /// Returns a JSON rendering with the password redacted.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if !config.database.password.is_empty() {
            config.database.password = "[REDACTED]".to_string();
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidValue {
                key: "DATA_FACTORY_LOG_FORMAT",
                reason: format!("expected 'json' or 'pretty', got '{}'", self.log_format),
            });
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATA_FACTORY_DB_MAX_CONNECTIONS",
                reason: "must be at least 1".to_string(),
            });
        }

        let db = &self.database;
        for (key, value) in [
            ("database.host", &db.host),
            ("database.name", &db.name),
            ("database.schema.name", &db.schema),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if db.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "database.port",
                reason: "must not be 0".to_string(),
            });
        }

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_db_setup_path() -> PathBuf {
    PathBuf::from("database/db_setup.yaml")
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("failed to read database setup file {path}: {source}")]
    SetupFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse database setup file {path}: {source}")]
    SetupParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("environment variable '{name}' referenced by the setup file is not set")]
    MissingEnvVar { name: String },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("invalid database url: {0}")]
    InvalidUrl(#[source] url::ParseError),
}

/// Shape of the YAML setup file.
#[derive(Debug, Deserialize)]
struct SetupFile {
    database: SetupDatabase,
}

#[derive(Debug, Deserialize)]
struct SetupDatabase {
    #[serde(default = "default_db_host")]
    host: String,
    #[serde(deserialize_with = "deserialize_port")]
    port: u16,
    name: String,
    schema: SetupSchema,
    users: SetupUsers,
}

#[derive(Debug, Deserialize)]
struct SetupSchema {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SetupUsers {
    rw_username: String,
    rw_password: String,
}

impl From<SetupDatabase> for DatabaseSettings {
    fn from(db: SetupDatabase) -> Self {
        Self {
            host: db.host,
            port: db.port,
            name: db.name,
            schema: db.schema.name,
            username: db.users.rw_username,
            password: db.users.rw_password,
        }
    }
}

/// Substituted environment values are strings, so the port accepts either form.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{text}'"))),
    }
}

/// Replaces every `$NAME` string leaf with the value of `NAME` from `vars`.
///
/// Mapping keys are left untouched. A lone `$` is kept as a literal.
pub fn substitute_env(
    value: &mut Value,
    vars: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    match value {
        Value::String(text) => {
            if let Some(name) = text.strip_prefix(ENV_SENTINEL)
                && !name.is_empty()
            {
                let resolved = vars.get(name).ok_or_else(|| ConfigError::MissingEnvVar {
                    name: name.to_string(),
                })?;
                *text = resolved.clone();
            }
            Ok(())
        }
        Value::Sequence(items) => items.iter_mut().try_for_each(|item| substitute_env(item, vars)),
        Value::Mapping(map) => map
            .iter_mut()
            .try_for_each(|(_, item)| substitute_env(item, vars)),
        Value::Tagged(tagged) => substitute_env(&mut tagged.value, vars),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
    }
}

/// Loads configuration from layered `.env` files, the process environment and
/// the YAML setup file.
pub struct ConfigLoader {
    base_dir: PathBuf,
    setup_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            setup_path: None,
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            setup_path: None,
        }
    }

    /// Overrides the setup file location, taking precedence over
    /// `DATA_FACTORY_DB_SETUP_PATH`.
    pub fn setup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.setup_path = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let vars = self.collect_env()?;
        let setting = |key: &str| {
            vars.get(&format!("{ENV_PREFIX}{key}"))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let profile = setting("PROFILE").unwrap_or_else(default_profile);
        let log_level = setting("LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = setting("LOG_FORMAT").unwrap_or_else(default_log_format);
        let db_max_connections = setting("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = setting("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let db_setup_path = self
            .setup_path
            .clone()
            .or_else(|| setting("DB_SETUP_PATH").map(PathBuf::from))
            .unwrap_or_else(default_db_setup_path);
        let resolved_setup_path = self.resolve(&db_setup_path);
        let database = load_database_settings(&resolved_setup_path, &vars)?;

        let config = AppConfig {
            profile,
            log_level,
            log_format,
            db_setup_path: resolved_setup_path,
            db_max_connections,
            db_acquire_timeout_ms,
            database,
        };

        config.validate()?;
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Layered `.env` values with the process environment on top.
    fn collect_env(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get(&format!("{ENV_PREFIX}PROFILE")).cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        // Process environment wins over files.
        values.extend(env::vars());

        Ok(values)
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    values.insert(key, value);
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the setup file at `path` and resolves `$NAME` references against `vars`.
pub fn load_database_settings(
    path: &Path,
    vars: &BTreeMap<String, String>,
) -> Result<DatabaseSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::SetupFile {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |source| ConfigError::SetupParse {
        path: path.to_path_buf(),
        source,
    };

    let mut tree: Value = serde_yaml::from_str(&contents).map_err(parse_err)?;
    substitute_env(&mut tree, vars)?;
    let setup: SetupFile = serde_yaml::from_value(tree).map_err(parse_err)?;

    Ok(setup.database.into())
}

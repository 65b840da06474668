//! Server configuration.
//!
//! Values are resolved with priority: environment variables > config file >
//! defaults. The config file is YAML:
//!
//! ```yaml
//! port: 8080
//! store: sqlite          # memory | sqlite | redis
//! data_dir: /var/lib/repbook
//! redis_url: redis://127.0.0.1:6379
//! session_ttl_days: 7
//! secure_cookies: true
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_SESSION_TTL_DAYS: u64 = 7;
const MAX_SESSION_TTL_DAYS: u64 = 36_500;

/// Which [`KvStore`](super::store::KvStore) backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!(
                "unknown store '{}' (expected memory, sqlite or redis)",
                other
            )),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Redis => write!(f, "redis"),
        }
    }
}

/// Config file structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    port: Option<u16>,
    store: Option<StoreBackend>,
    data_dir: Option<PathBuf>,
    redis_url: Option<String>,
    session_ttl_days: Option<u64>,
    secure_cookies: Option<bool>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Store backend
    pub store: StoreBackend,
    /// Directory holding the SQLite database
    pub data_dir: PathBuf,
    /// Redis connection URL, used when `store` is `redis`
    pub redis_url: String,
    /// Lifetime of a login session
    pub session_ttl: Duration,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookies: bool,
    /// Config file that was read, if any
    pub config_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreBackend::Sqlite,
            data_dir: Self::default_data_dir(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_DAYS * SECS_PER_DAY),
            secure_cookies: false,
            config_file: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `REPBOOK_CONFIG` (or the default path) and
    /// the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("REPBOOK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_config_path());
        Self::load(&path, |name| std::env::var(name).ok())
    }

    /// Loads configuration from `path` (if it exists), then applies
    /// overrides looked up through `env`.
    pub fn load<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
            let file: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;

            config.config_file = Some(path.to_path_buf());
            if let Some(port) = file.port {
                config.port = port;
            }
            if let Some(store) = file.store {
                config.store = store;
            }
            if let Some(dir) = file.data_dir {
                config.data_dir = resolve_relative(path, dir);
            }
            if let Some(url) = file.redis_url {
                config.redis_url = url;
            }
            if let Some(ttl) = file.session_ttl_days {
                config.session_ttl = session_ttl("session_ttl_days", ttl)?;
            }
            if let Some(secure) = file.secure_cookies {
                config.secure_cookies = secure;
            }
        }

        if let Some(port) = env("REPBOOK_PORT") {
            config.port = parse_env("REPBOOK_PORT", &port)?;
        }
        if let Some(store) = env("REPBOOK_STORE") {
            config.store = store
                .parse()
                .map_err(|e| ConfigError::InvalidValue("REPBOOK_STORE".to_string(), e))?;
        }
        if let Some(dir) = env("REPBOOK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = env("REPBOOK_REDIS_URL") {
            config.redis_url = url;
        }
        if let Some(ttl) = env("REPBOOK_SESSION_TTL_DAYS") {
            let ttl = parse_env("REPBOOK_SESSION_TTL_DAYS", &ttl)?;
            config.session_ttl = session_ttl("REPBOOK_SESSION_TTL_DAYS", ttl)?;
        }
        if let Some(secure) = env("REPBOOK_SECURE_COOKIES") {
            config.secure_cookies = parse_flag(&secure);
        }

        Ok(config)
    }

    /// Config that keeps everything in memory. Used by tests.
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            ..Self::default()
        }
    }

    /// Default data directory: `<platform data dir>/repbook-server`
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repbook-server")
    }

    /// Default config file: `<platform config dir>/repbook-server/config.yaml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repbook-server")
            .join("config.yaml")
    }
}

const SECS_PER_DAY: u64 = 24 * 60 * 60;

fn session_ttl(name: &str, days: u64) -> Result<Duration, ConfigError> {
    if days == 0 || days > MAX_SESSION_TTL_DAYS {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} (expected 1 to {} days)", days, MAX_SESSION_TTL_DAYS),
        ));
    }
    days
        .checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue(name.to_string(), days.to_string()))
}

fn resolve_relative(config_path: &Path, dir: PathBuf) -> PathBuf {
    if dir.is_relative() {
        config_path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
    } else {
        dir
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, e) => {
                write!(f, "Invalid value for {}: {}", name, e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = ServerConfig::load(&temp_dir.path().join("missing.yaml"), env_of(&[])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.session_ttl, Duration::from_secs(7 * 24 * 3600));
        assert!(!config.secure_cookies);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "port: 9000").unwrap();
        writeln!(file, "store: redis").unwrap();
        writeln!(file, "data_dir: data").unwrap();
        writeln!(file, "session_ttl_days: 1").unwrap();

        let config = ServerConfig::load(&config_path, env_of(&[])).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.store, StoreBackend::Redis);
        assert_eq!(config.data_dir, temp_dir.path().join("data"));
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "port: 9000\nstore: redis\n").unwrap();

        let config = ServerConfig::load(
            &config_path,
            env_of(&[
                ("REPBOOK_PORT", "9100"),
                ("REPBOOK_STORE", "Memory"),
                ("REPBOOK_SECURE_COOKIES", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_invalid_env_value() {
        let temp_dir = tempdir().unwrap();
        let err = ServerConfig::load(
            &temp_dir.path().join("missing.yaml"),
            env_of(&[("REPBOOK_STORE", "postgres")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("REPBOOK_STORE"));

        let err = ServerConfig::load(
            &temp_dir.path().join("missing.yaml"),
            env_of(&[("REPBOOK_PORT", "eighty")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("REPBOOK_PORT"));
    }

    #[test]
    fn test_session_ttl_out_of_range() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing.yaml");

        for days in ["0", "36501", "18446744073709551615"] {
            let err = ServerConfig::load(&missing, env_of(&[("REPBOOK_SESSION_TTL_DAYS", days)]))
                .unwrap_err();
            assert!(err.to_string().contains("REPBOOK_SESSION_TTL_DAYS"), "{}", days);
        }

        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "session_ttl_days: 99999999999999\n").unwrap();
        let err = ServerConfig::load(&config_path, env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("session_ttl_days"));

        let config =
            ServerConfig::load(&missing, env_of(&[("REPBOOK_SESSION_TTL_DAYS", "36500")])).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(36_500 * 24 * 3600));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "invalid: yaml: content: [").unwrap();

        let err = ServerConfig::load(&config_path, env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}

//! Database connection parameters (`database.ini`).
//!
//! The connection file is sectioned `key = value` text; one named section
//! (default `postgresql`) is read into a flat map:
//!
//! ```ini
//! [postgresql]
//! host = localhost
//! database = olist
//! user = postgres
//! password = ${PGPASSWORD}
//! ```
//!
//! Keys are case-insensitive. `dbname` is accepted as an alias for
//! `database`, as libpq does.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;

use super::settings::expand_env_vars;
use super::{ConfigError, ConfigResult};

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// Flat connection parameters from one section of the connection file.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    section: String,
    values: IndexMap<String, String>,
}

impl ConnectionParams {
    /// Read `section` from the file at `path`.
    pub fn from_file(path: impl AsRef<Path>, section: &str) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, section, path)
    }

    /// Parse `section` out of INI text. `origin` is only used in errors.
    pub fn parse(content: &str, section: &str, origin: &Path) -> ConfigResult<Self> {
        let mut current: Option<&str> = None;
        let mut found = false;
        let mut values = IndexMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim();
                current = Some(name);
                found |= name == section;
                continue;
            }

            let malformed = || ConfigError::MalformedIni {
                path: origin.to_path_buf(),
                line: idx + 1,
                content: raw.to_string(),
            };
            let (key, value) = line.split_once(['=', ':']).ok_or_else(malformed)?;
            // Entries need an enclosing section header.
            let current = current.ok_or_else(malformed)?;
            if current == section {
                values.insert(key.trim().to_lowercase(), expand_env_vars(value.trim())?);
            }
        }

        if !found {
            return Err(ConfigError::SectionNotFound {
                section: section.to_string(),
                path: origin.to_path_buf(),
            });
        }

        Ok(Self {
            section: section.to_string(),
            values,
        })
    }

    /// Build from explicit key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            section: "postgresql".to_string(),
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn host(&self) -> &str {
        self.get("host").unwrap_or("localhost")
    }

    pub fn port(&self) -> ConfigResult<u16> {
        self.parse_value("port", DEFAULT_PORT)
    }

    pub fn database(&self) -> Option<&str> {
        self.get("database").or_else(|| self.get("dbname"))
    }

    pub fn user(&self) -> Option<&str> {
        self.get("user")
    }

    pub fn password(&self) -> Option<&str> {
        self.get("password")
    }

    pub fn connect_timeout(&self) -> ConfigResult<Duration> {
        self.parse_value("connect_timeout", DEFAULT_CONNECT_TIMEOUT_SECS)
            .map(Duration::from_secs)
    }

    pub fn statement_timeout(&self) -> ConfigResult<Duration> {
        self.parse_value("statement_timeout", DEFAULT_STATEMENT_TIMEOUT_SECS)
            .map(Duration::from_secs)
    }

    /// Build a `tokio_postgres` config.
    pub fn to_pg_config(&self) -> ConfigResult<tokio_postgres::Config> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(self.host())
            .port(self.port()?)
            .connect_timeout(self.connect_timeout()?)
            .application_name("datamart");
        if let Some(db) = self.database() {
            config.dbname(db);
        }
        if let Some(user) = self.user() {
            config.user(user);
        }
        if let Some(password) = self.password() {
            config.password(password);
        }
        Ok(config)
    }

    fn parse_value<T: std::str::FromStr>(&self, key: &str, default: T) -> ConfigResult<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if key == "password" {
                map.entry(key, &"***");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

//! Runtime configuration (`program.json`).
//!
//! Example configuration:
//! ```json
//! {
//!   "datasource": "postgres",
//!   "db": { "create": "y", "insert": "y", "drop": "n", "delete": "n" },
//!   "table_order": "dependency",
//!   "connection_section": "postgresql"
//! }
//! ```
//!
//! The same structure is accepted as TOML when the file ends in `.toml`.

use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};
use crate::schema::TableOrder;

/// Where tables are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Delimited files named by each table's `source`.
    Csv,
    /// A PostgreSQL database.
    Postgres,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Csv => "csv",
            DataSource::Postgres => "postgres",
        }
    }
}

impl std::str::FromStr for DataSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(DataSource::Csv),
            "postgres" => Ok(DataSource::Postgres),
            other => Err(ConfigError::UnsupportedDataSource(other.to_string())),
        }
    }
}

/// Root runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// `"csv"` or `"postgres"`. Kept as text so an unsupported value only
    /// fails the calls that need a data source.
    #[serde(default = "default_datasource")]
    pub datasource: String,

    /// Lifecycle phase switches.
    #[serde(default)]
    pub db: LifecycleFlags,

    /// Table order for whole-schema statement batches.
    #[serde(default)]
    pub table_order: TableOrder,

    /// Section of the connection file to read.
    #[serde(default = "default_connection_section")]
    pub connection_section: String,

    /// Directory that relative table `source` paths resolve against.
    /// Defaults to the configuration root.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_datasource() -> String {
    DataSource::Csv.as_str().to_string()
}

fn default_connection_section() -> String {
    "postgresql".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            datasource: default_datasource(),
            db: LifecycleFlags::default(),
            table_order: TableOrder::default(),
            connection_section: default_connection_section(),
            data_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Load from a JSON file, or TOML when the extension is `.toml`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The configured data source.
    pub fn data_source(&self) -> ConfigResult<DataSource> {
        self.datasource.parse()
    }
}

/// Lifecycle phase switches. A phase is enabled only by the literal `"y"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LifecycleFlags {
    #[serde(default, deserialize_with = "yes_flag", serialize_with = "emit_flag")]
    pub create: bool,
    #[serde(default, deserialize_with = "yes_flag", serialize_with = "emit_flag")]
    pub insert: bool,
    #[serde(default, deserialize_with = "yes_flag", serialize_with = "emit_flag")]
    pub drop: bool,
    #[serde(default, deserialize_with = "yes_flag", serialize_with = "emit_flag")]
    pub delete: bool,
}

impl LifecycleFlags {
    /// Every phase enabled.
    pub fn all() -> Self {
        Self {
            create: true,
            insert: true,
            drop: true,
            delete: true,
        }
    }

    pub fn any(&self) -> bool {
        self.create || self.insert || self.drop || self.delete
    }
}

/// Anything a config file might hold for a flag.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn yes_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(FlagValue::deserialize(deserializer)?, FlagValue::Text(s) if s == "y"))
}

fn emit_flag<S>(enabled: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(if *enabled { "y" } else { "n" })
}

/// Expand environment variables in a string.
///
/// Only the `${VAR}` form is expanded; any other `$` is kept literally, so
/// passwords such as `pa$word` survive.
pub fn expand_env_vars(s: &str) -> ConfigResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + 2 + len];
        let value =
            env::var(var_name).map_err(|_| ConfigError::MissingEnvVar(var_name.to_string()))?;
        result.push_str(&value);
        rest = &rest[start + 2 + len + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

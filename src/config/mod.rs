//! Configuration for datamart.
//!
//! All configuration lives in one directory, the [`ConfigRoot`], which is
//! resolved once at start-up and threaded into every loader:
//!
//! - `program.json` - runtime options ([`RuntimeConfig`])
//! - `db.json` - the schema document ([`crate::schema::SchemaModel`])
//! - `database.ini` - connection parameters ([`ConnectionParams`])

mod connection;
mod settings;

use std::path::{Path, PathBuf};

pub use connection::ConnectionParams;
pub use settings::{expand_env_vars, DataSource, LifecycleFlags, RuntimeConfig};

/// Error type for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse config file: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Malformed line {line} in {path}: {content}")]
    MalformedIni {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Section {section} not found in the {path} file")]
    SectionNotFound { section: String, path: PathBuf },

    #[error("data source must be either 'csv' or 'postgres', got '{0}'")]
    UnsupportedDataSource(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// The configuration directory and the files inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRoot {
    dir: PathBuf,
    runtime_file: PathBuf,
    schema_file: PathBuf,
    connection_file: PathBuf,
}

impl ConfigRoot {
    pub const RUNTIME_FILE: &'static str = "program.json";
    pub const SCHEMA_FILE: &'static str = "db.json";
    pub const CONNECTION_FILE: &'static str = "database.ini";

    /// Use the conventional file names inside `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            runtime_file: dir.join(Self::RUNTIME_FILE),
            schema_file: dir.join(Self::SCHEMA_FILE),
            connection_file: dir.join(Self::CONNECTION_FILE),
            dir,
        }
    }

    /// Override the runtime config file. Relative paths resolve against the
    /// root directory.
    pub fn with_runtime_file(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_file = self.resolve(path);
        self
    }

    /// Override the schema document.
    pub fn with_schema_file(mut self, path: impl AsRef<Path>) -> Self {
        self.schema_file = self.resolve(path);
        self
    }

    /// Override the connection parameters file.
    pub fn with_connection_file(mut self, path: impl AsRef<Path>) -> Self {
        self.connection_file = self.resolve(path);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn runtime_file(&self) -> &Path {
        &self.runtime_file
    }

    pub fn schema_file(&self) -> &Path {
        &self.schema_file
    }

    pub fn connection_file(&self) -> &Path {
        &self.connection_file
    }

    /// Resolve a path relative to the root directory. Absolute paths are
    /// returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// Load the runtime config.
    pub fn runtime_config(&self) -> ConfigResult<RuntimeConfig> {
        RuntimeConfig::from_file(&self.runtime_file)
    }

    /// Load the runtime config, or its defaults when the file does not
    /// exist. A file that exists but cannot be read or parsed is an error.
    pub fn runtime_config_or_default(&self) -> ConfigResult<RuntimeConfig> {
        match self.runtime_config() {
            Err(ConfigError::FileNotFound(path)) => {
                tracing::debug!(path = %path.display(), "no runtime config; using defaults");
                Ok(RuntimeConfig::default())
            }
            other => other,
        }
    }

    /// Load one section of the connection file.
    pub fn connection_params(&self, section: &str) -> ConfigResult<ConnectionParams> {
        ConnectionParams::from_file(&self.connection_file, section)
    }
}

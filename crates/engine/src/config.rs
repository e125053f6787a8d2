//! Container configuration via `quire.toml`
//!
//! A container is described by its name, the slash path of its partition
//! key, the id field and optional document limits. Configs can be built in
//! code or loaded from a TOML file.

use quire_core::{DocumentLimits, JsonPath, KeySchema, QuireError, QuireResult, SYSTEM_PROPERTIES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "quire.toml";

/// Default id field name.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default number of documents per feed page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Container configuration loaded from `quire.toml`.
///
/// # Example
///
/// ```toml
/// name = "ExampleContainer"
/// partition_key_path = "/myPartitionKey"
///
/// # id_field = "id"
/// # default_page_size = 100
///
/// # [limits]
/// # max_document_bytes = 2097152
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerConfig {
    /// Container name, used in logs.
    pub name: String,
    /// Slash path of the partition key, e.g. `/myPartitionKey`.
    pub partition_key_path: String,
    /// Top-level field holding the document id.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Feed page size when a query does not set `max_item_count`.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Limits enforced on every write.
    #[serde(default)]
    pub limits: DocumentLimits,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl ContainerConfig {
    /// Config with default id field, page size and limits.
    pub fn new(name: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key_path: partition_key_path.into(),
            id_field: default_id_field(),
            default_page_size: DEFAULT_PAGE_SIZE,
            limits: DocumentLimits::default(),
        }
    }

    /// Override the id field.
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Override the default page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Override the document limits.
    pub fn with_limits(mut self, limits: DocumentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Quire container configuration
#
# Container name (used in logs)
name = "container"

# Slash path of the partition key inside each document
partition_key_path = "/pk"

# Top-level id field (default: "id")
# id_field = "id"

# Documents per feed page when a query sets no max_item_count (default: 100)
# default_page_size = 100

# Limits enforced on every write
# [limits]
# max_document_bytes = 2097152
# max_nesting_depth = 128
# max_path_length = 128
"#
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Config`] if the text does not parse or the
    /// config is invalid.
    pub fn from_toml_str(content: &str) -> QuireResult<Self> {
        let config: ContainerConfig = toml::from_str(content)
            .map_err(|e| QuireError::config(format!("Failed to parse container config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> QuireResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuireError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ContainerConfig = toml::from_str(&content).map_err(|e| {
            QuireError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> QuireResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| QuireError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            QuireError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parsed partition-key path.
    pub fn partition_key(&self) -> QuireResult<JsonPath> {
        let path: JsonPath = self.partition_key_path.parse().map_err(|e| {
            QuireError::config(format!(
                "Invalid partition_key_path '{}': {}",
                self.partition_key_path, e
            ))
        })?;
        if path.is_root() {
            return Err(QuireError::config("partition_key_path must name a field"));
        }
        if path.targets_end() {
            return Err(QuireError::config(format!(
                "partition_key_path '{}' must not end with the array-end segment '-'",
                self.partition_key_path
            )));
        }
        Ok(path)
    }

    /// Id field and partition-key path as a [`KeySchema`].
    pub fn key_schema(&self) -> QuireResult<KeySchema> {
        Ok(KeySchema::new(self.id_field.clone(), self.partition_key()?))
    }

    /// Check the config for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Config`] naming the first problem found.
    pub fn validate(&self) -> QuireResult<()> {
        if self.name.trim().is_empty() {
            return Err(QuireError::config("container name must not be empty"));
        }
        if self.id_field.is_empty() {
            return Err(QuireError::config("id_field must not be empty"));
        }
        if SYSTEM_PROPERTIES.contains(&self.id_field.as_str()) {
            return Err(QuireError::config(format!(
                "id_field '{}' is a system property",
                self.id_field
            )));
        }
        let pk = self.partition_key()?;
        if let Some(first) = pk.segments().first() {
            if *first == self.id_field {
                return Err(QuireError::config(format!(
                    "partition_key_path '{}' overlaps the id field",
                    self.partition_key_path
                )));
            }
            if SYSTEM_PROPERTIES.contains(&first.as_str()) {
                return Err(QuireError::config(format!(
                    "partition_key_path '{}' names a system property",
                    self.partition_key_path
                )));
            }
        }
        if self.default_page_size == 0 {
            return Err(QuireError::config("default_page_size must be at least 1"));
        }
        let limits = &self.limits;
        if limits.max_document_bytes == 0
            || limits.max_nesting_depth == 0
            || limits.max_path_length == 0
        {
            return Err(QuireError::config("document limits must be non-zero"));
        }
        Ok(())
    }
}

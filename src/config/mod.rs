//! Schema and connection descriptor loading
//!
//! Both descriptors are read as YAML when the file ends in `.yaml`/`.yml`
//! and as JSON otherwise.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::database::ConnectionParams;
use crate::models::Schema;

/// Descriptor file syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Yaml,
}

impl DescriptorFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DescriptorFormat::Yaml,
            _ => DescriptorFormat::Json,
        }
    }
}

/// Load and validate the field schema descriptor
pub fn load_schema(path: &Path) -> ConfigResult<Schema> {
    let schema: Schema = read_descriptor(path)?;
    schema.validate().map_err(ConfigError::Invalid)?;

    info!(
        path = %path.display(),
        table = %schema.target_table_name,
        fields = schema.fields.len(),
        "Loaded schema"
    );
    Ok(schema)
}

/// Load the connection descriptor as an opaque parameter map
pub fn load_connection(path: &Path) -> ConfigResult<ConnectionParams> {
    let params: ConnectionParams = read_descriptor(path)?;
    debug!(path = %path.display(), keys = params.len(), "Loaded connection descriptor");
    Ok(params)
}

fn read_descriptor<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = match DescriptorFormat::from_path(path) {
        DescriptorFormat::Yaml => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
        DescriptorFormat::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
    };

    parsed.map_err(|reason| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

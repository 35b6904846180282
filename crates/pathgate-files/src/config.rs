//! TOML configuration: startup attachments and MIME overrides.
//!
//! ```toml
//! [[attach]]
//! name = "sandbox"
//! path = "~/tasks/7"
//!
//! [mime]
//! log = "text/plain"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mime::MimeTypes;

/// Errors loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One attachment applied at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttachConfig {
    /// Virtual name.
    pub name: String,
    /// Host path; `~` is expanded.
    pub path: String,
}

impl AttachConfig {
    pub fn expanded_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).as_ref())
    }
}

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Attachments, applied in order.
    pub attach: Vec<AttachConfig>,
    /// Extension → content type overrides layered over the built-in table.
    pub mime: BTreeMap<String, String>,
}

impl FilesConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a config file. `~` in `path` is expanded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = PathBuf::from(shellexpand::tilde(&path.as_ref().to_string_lossy()).as_ref());
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            attachments = config.attach.len(),
            mime_overrides = config.mime.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Built-in MIME table with this config's overrides applied.
    pub fn mime_types(&self) -> MimeTypes {
        let mut mime = MimeTypes::with_defaults();
        mime.extend(self.mime.iter().map(|(ext, ty)| (ext.as_str(), ty.as_str())));
        mime
    }
}

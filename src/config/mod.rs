//! Configuration loading and runtime access.
//!
//! [`Config`] is the immutable on-disk shape; [`ConfigStore`] is the
//! runtime-mutable view that the resolver and relay consult on every call so
//! configuration updates take effect without a restart.

mod store;
mod types;

pub use store::{ConfigStore, QueryPolicy};
pub use types::*;

use std::path::Path;

use crate::error::{Error, Result};

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Validation(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Load configuration from the given path, or search the default
    /// locations, or fall back to defaults.
    pub fn load_or_default(custom_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = custom_path {
            return Self::load(path);
        }

        let default_paths = [
            "./dvrgate.toml",
            "./config.toml",
            "~/.config/dvrgate/config.toml",
            "/etc/dvrgate/config.toml",
        ];

        for path_str in default_paths {
            let path = shellexpand::tilde(path_str);
            let path = Path::new(path.as_ref());
            if path.exists() {
                return Self::load(path);
            }
        }

        tracing::info!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.dvr_servers.is_empty() {
            warnings.push("dvr_servers is empty; every resolution will fail".into());
        }

        for (i, server) in self.dvr_servers.iter().enumerate() {
            if !server.starts_with("http://") && !server.starts_with("https://") {
                warnings.push(format!(
                    "dvr_servers[{i}] '{server}' does not look like an http(s) URL"
                ));
            }
        }

        if self.dvr.max_retries == 0 {
            warnings.push("dvr.max_retries is 0; each server gets a single attempt".into());
        }

        if self.dvr.skip_tls_verify {
            warnings.push("dvr.skip_tls_verify is enabled; backend certificates are not checked".into());
        }

        warnings
    }
}

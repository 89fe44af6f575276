use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ItaloError;

/// Default file name of the secrets descriptor
pub const SECRETS_FILE: &str = "secrets.json";

/// Client credentials for the HALO identity server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    pub client_name: String,
    pub client_secret: String,
    pub client_scope: String,
    pub grant_type: String,
    pub server_name: String,
}

impl Secrets {
    /// Template written for the operator when no secrets file exists.
    /// Every value is a bracketed placeholder.
    pub fn template() -> Self {
        Self {
            client_name: "[client_name]".to_string(),
            client_secret: "[client_secret]".to_string(),
            client_scope: "[client_scope]".to_string(),
            grant_type: "[grant_type]".to_string(),
            server_name: "[server_name]".to_string(),
        }
    }

    /// Whether any value is still an unfilled placeholder
    pub fn is_template(&self) -> bool {
        [
            &self.client_name,
            &self.client_secret,
            &self.client_scope,
            &self.grant_type,
            &self.server_name,
        ]
        .iter()
        .any(|value| value.starts_with('[') && value.ends_with(']'))
    }

    /// Find the secrets file.
    ///
    /// The working directory wins; the per-user config directory
    /// (e.g. `~/.config/italo/secrets.json`) is used only when it already
    /// holds a file. Otherwise the working-directory path is returned so
    /// that a template lands next to the executable's launch point.
    pub fn locate() -> PathBuf {
        let local = PathBuf::from(SECRETS_FILE);
        if local.exists() {
            return local;
        }

        if let Some(mut user) = dirs::config_dir() {
            user.push("italo");
            user.push(SECRETS_FILE);
            if user.exists() {
                return user;
            }
        }

        local
    }

    /// Load the secrets descriptor at `path`.
    ///
    /// A missing file is replaced by a template and reported as
    /// [`ItaloError::MissingSecrets`].
    pub fn load(path: &Path) -> Result<Self, ItaloError> {
        if !path.exists() {
            Self::write_template(path)?;
            tracing::warn!(path = %path.display(), "secrets file missing, template written");
            return Err(ItaloError::MissingSecrets(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|err| ItaloError::SecretsAccess {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let secrets: Secrets =
            serde_json::from_str(&content).map_err(|err| ItaloError::SecretsParse {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        if secrets.is_template() {
            return Err(ItaloError::SecretsIncomplete(path.to_path_buf()));
        }

        Ok(secrets)
    }

    fn write_template(path: &Path) -> Result<(), ItaloError> {
        let write_error = |reason: String| ItaloError::SecretsAccess {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| write_error(err.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(&Self::template())
            .map_err(|err| write_error(err.to_string()))?;
        fs::write(path, json).map_err(|err| write_error(err.to_string()))
    }
}

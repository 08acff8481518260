//! Database credentials file.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

fn default_port() -> u16 {
    3306
}

/// Credentials loaded once at startup from a YAML file such as:
///
/// ```yaml
/// HOST: pinterest-db.example.com
/// PORT: 3306
/// USER: emulator
/// PASSWORD: secret
/// DATABASE: pinterest_data
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseCredentials {
    #[serde(rename = "HOST")]
    pub host: String,
    #[serde(rename = "PORT", default = "default_port")]
    pub port: u16,
    #[serde(rename = "USER")]
    pub user: String,
    #[serde(rename = "PASSWORD")]
    pub password: String,
    #[serde(rename = "DATABASE")]
    pub database: String,
}

impl DatabaseCredentials {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse database credentials")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid credentials file {}", path.display()))
    }

    /// `{scheme}://{user}:{password}@{host}:{port}/{database}`, with user and
    /// password percent-encoded.
    pub fn connection_url(&self, scheme: &str) -> anyhow::Result<String> {
        let mut url = url::Url::parse(&format!(
            "{scheme}://{}:{}/{}",
            self.host, self.port, self.database
        ))
        .with_context(|| format!("Invalid database host '{}'", self.host))?;
        url.set_username(&self.user)
            .map_err(|_| anyhow::anyhow!("Cannot set user on {scheme} URL"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| anyhow::anyhow!("Cannot set password on {scheme} URL"))?;
        Ok(url.to_string())
    }
}

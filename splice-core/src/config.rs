use serde::{Deserialize, Serialize};

use crate::base_url::BuildMode;

/// The `[site]` table of `splice.toml` plus the mode picked per invocation.
///
/// The CLI deserializes this from its layered configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    /// Chosen per invocation, never read from or written to the file.
    #[serde(skip)]
    pub mode: BuildMode,
}

impl Config {
    /// Switch to development mode: relative base URLs.
    pub fn dev(&mut self) {
        self.mode = BuildMode::Development;
    }

    pub fn is_dev(&self) -> bool {
        self.mode == BuildMode::Development
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Substituted for `BASE_URL` in production builds.
    pub base_url: String,
}

use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable that sets the production base URL directly.
pub const BASE_URL_ENV: &str = "BASE_URL";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpliceConfig {
    /// Build configuration
    pub build: BuildConfig,
    /// Site configuration (from splice-core)
    #[serde(flatten)]
    pub site: splice_core::Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Source directory holding index.html, pages/, assets/ and templates
    pub source: String,
    /// Output directory for generated site
    pub output: String,
    /// Configuration file path
    pub config: String,
    /// Host for dev server
    pub host: String,
    /// Port for dev server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "./src".to_string(),
            output: "./dist".to_string(),
            config: "./splice.toml".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

impl SpliceConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. BASE_URL environment variable (also read from .env)
    /// 3. Environment variables (SPLICE_*)
    /// 4. Configuration file
    /// 5. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = args
            .try_get_one::<String>("config")
            .unwrap_or(None)
            .cloned()
            .unwrap_or_else(|| BuildConfig::default().config);

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        let defaults = Self::default();
        builder = builder.add_source(ConfigBuilder::try_from(&defaults)?);

        // 2. Add configuration file if it exists
        if Path::new(&config_file).exists() {
            builder = builder.add_source(File::from(Path::new(&config_file)));
        }

        // 3. Add environment variables with SPLICE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("SPLICE")
                .prefix_separator("_")
                .separator("__"), // Use double underscore for nested keys
        );

        // 4. Plain BASE_URL, as used by existing .env files
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            let env_base = HashMap::from([("site.base_url".to_string(), base_url)]);
            builder = builder.add_source(ConfigBuilder::try_from(&env_base)?);
        }

        // 5. Override with CLI arguments (highest priority)
        let mut cli_overrides = HashMap::new();

        for (arg, key) in [
            ("source", "build.source"),
            ("output", "build.output"),
            ("config", "build.config"),
            ("host", "build.host"),
            ("base_url", "site.base_url"),
        ] {
            // Only override with CLI args that are actually defined for this command
            if let Some(value) = args.try_get_one::<String>(arg).unwrap_or(None) {
                cli_overrides.insert(key.to_string(), value.clone());
            }
        }
        if let Some(port) = args.try_get_one::<String>("port").unwrap_or(None) {
            let port_num: u16 = port
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid port: {}", port))?;
            cli_overrides.insert("build.port".to_string(), port_num.to_string());
        }
        if args.try_get_one::<bool>("open").unwrap_or(None) == Some(&true) {
            cli_overrides.insert("build.open".to_string(), "true".to_string());
        }

        if !cli_overrides.is_empty() {
            builder = builder.add_source(ConfigBuilder::try_from(&cli_overrides)?);
        }

        // Build and deserialize
        let config = builder.build()?;
        let splice_config: SpliceConfig = config.try_deserialize()?;

        Ok(splice_config)
    }

    /// Get the build configuration
    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }
}

/// Load configuration specifically for build commands
pub fn load_build_config(args: &ArgMatches) -> Result<SpliceConfig> {
    SpliceConfig::load(args)
}

/// Load configuration specifically for serve commands
pub fn load_serve_config(args: &ArgMatches) -> Result<SpliceConfig> {
    let mut config = SpliceConfig::load(args)?;
    config.site.dev();
    Ok(config)
}

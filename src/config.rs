//! Runtime settings for the ORM.
//!
//! [`OrmConfig`] is read from the `[orm]` section of `config/config.toml` (optional)
//! and overridden by environment variables prefixed with `LIFELINE`, e.g.
//! `LIFELINE__ORM__DEFAULT_CONNECTION=replica`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "LIFELINE";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OrmConfig {
    /// Connection the `"default"` alias resolves to.
    #[serde(default = "default_connection")]
    pub default_connection: String,
    /// Base URL used to build pagination links.
    #[serde(default = "default_resource_url")]
    pub resource_url: String,
    /// Resolve the relations of one instance on concurrent coroutines.
    #[serde(default = "default_fan_out")]
    pub fan_out: bool,
    /// Stack size handed to `may` for every coroutine the ORM spawns.
    #[serde(default = "default_coroutine_stack_size")]
    pub coroutine_stack_size: usize,
}

fn default_connection() -> String {
    "default".to_string()
}

fn default_resource_url() -> String {
    "/".to_string()
}

fn default_fan_out() -> bool {
    true
}

fn default_coroutine_stack_size() -> usize {
    0x8000
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            default_connection: default_connection(),
            resource_url: default_resource_url(),
            fan_out: default_fan_out(),
            coroutine_stack_size: default_coroutine_stack_size(),
        }
    }
}

impl OrmConfig {
    /// Load the ORM configuration from `config/config.toml`, falling back to env vars.
    ///
    /// A missing `[orm]` section is not an error: every field has a default.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        match settings.get::<OrmConfig>("orm") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(OrmConfig::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "ORM configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }

    /// Builder-style override of the connection the `"default"` alias points to.
    pub fn with_default_connection(mut self, name: impl Into<String>) -> Self {
        self.default_connection = name.into();
        self
    }

    pub fn with_resource_url(mut self, url: impl Into<String>) -> Self {
        self.resource_url = url.into();
        self
    }

    pub fn with_fan_out(mut self, fan_out: bool) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Stack size handed to each coroutine the ORM spawns.
    pub fn with_coroutine_stack_size(mut self, size: usize) -> Self {
        self.coroutine_stack_size = size;
        self
    }
}

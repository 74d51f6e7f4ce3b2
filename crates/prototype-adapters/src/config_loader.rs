//! Options loading from TOML and the environment.
//!
//! # File format
//!
//! Every key is optional; missing keys keep their defaults.
//!
//! ```toml
//! tag_key            = "json"
//! target_tag_key     = "db"          # overrides tag_key for targets
//! getter_prefix      = "Get"
//! setter_prefix      = "Set"
//! deep_clone         = true
//! omit_empty         = false
//! interrupt_on_error = true
//! cycle_threshold    = 1024
//! time_format        = "unix-millis" # rfc3339 | unix | unix-millis | unix-nanos | <chrono layout>
//! ```
//!
//! # Environment
//!
//! `PROTOTYPE_<KEY>` variables (upper-cased key names) override the file.
//! Flags accept `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`.

use std::fs;
use std::path::Path;

use config::{Config, Environment, File, FileFormat, Map};
use tracing::{debug, instrument};

use prototype_core::application::{Options, OptionsBuilder, OptionsConfig};

use crate::error::{AdapterError, AdapterResult};
use crate::time_codec::codec_by_name;

pub const ENV_PREFIX: &str = "PROTOTYPE";

/// Loads an [`OptionsConfig`] from TOML, layered under environment
/// variables.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    use_env: bool,
    env_source: Option<Map<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            env_prefix: ENV_PREFIX.to_string(),
            use_env: true,
            env_source: None,
        }
    }

    /// Variable prefix, without the trailing underscore.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env_source<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env_source = Some(vars.into_iter().collect());
        self
    }

    /// Skip the environment layer.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Parse `text`, then apply the environment.
    pub fn load_str(&self, text: &str) -> AdapterResult<OptionsConfig> {
        let mut builder = Config::builder().add_source(File::from_str(text, FileFormat::Toml));
        if self.use_env {
            builder = builder.add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .source(self.env_source.clone()),
            );
        }
        Ok(builder.build()?.try_deserialize()?)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load_file(&self, path: &Path) -> AdapterResult<OptionsConfig> {
        let text = fs::read_to_string(path).map_err(|source| AdapterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = self.load_str(&text)?;
        debug!(?config, "options loaded");
        Ok(config)
    }

    /// Defaults plus the environment; no file.
    pub fn load_env(&self) -> AdapterResult<OptionsConfig> {
        self.load_str("")
    }
}

/// A builder seeded from `config`, with `time_format` resolved to a codec.
pub fn builder_from_config(config: &OptionsConfig) -> AdapterResult<OptionsBuilder> {
    let codec = codec_by_name(&config.time_format)?;
    Ok(OptionsBuilder::from_config(config).shared_time_codec(codec))
}

/// Load `path` with the default loader and build [`Options`].
pub fn load_options(path: &Path) -> AdapterResult<Options> {
    let config = ConfigLoader::new().load_file(path)?;
    Ok(builder_from_config(&config)?.build())
}

use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, FileFormat};
use serde::Deserialize;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_LOG_LEVEL, DEFAULT_TIMEZONE, ENV_KEY_SEPARATOR, ENV_PREFIX,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub expander: ExpanderSettings,
    pub logging: LoggingConfig,
}

/// ## Summary
/// Knobs the importer exposes for occurrence expansion.
///
/// Each field is an extension point the host can override from
/// `config.toml` or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpanderSettings {
    /// Source timezone for entries that do not carry their own `TZID`.
    /// IANA names, Windows names and whole-hour offsets are accepted.
    pub default_timezone: String,

    /// Reinterpret a `DTSTART` ending in `Z` as wall-clock time in
    /// `default_timezone`, so weekly rules keep their local hour across DST.
    pub treat_z_as_local: bool,

    /// Log per-entry occurrence samples.
    #[serde(default)]
    pub verbose: bool,

    /// Fixed window year; the current UTC year is used when unset.
    #[serde(default)]
    pub window_year: Option<i32>,
}

impl Default for ExpanderSettings {
    fn default() -> Self {
        Self {
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            treat_z_as_local: true,
            verbose: false,
            window_year: None,
        }
    }
}

impl ExpanderSettings {
    /// ## Summary
    /// Returns a copy with a different fallback timezone.
    #[must_use]
    pub fn with_default_timezone(mut self, tz: impl Into<String>) -> Self {
        self.default_timezone = tz.into();
        self
    }

    /// ## Summary
    /// Returns a copy with the Z-as-local policy set.
    #[must_use]
    pub fn with_treat_z_as_local(mut self, enabled: bool) -> Self {
        self.treat_z_as_local = enabled;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env`, environment variables and an optional
    /// `config.toml` into a `Settings`.
    ///
    /// Environment variables use the `CAUSEWAY_` prefix and `__` between
    /// nested keys, e.g. `CAUSEWAY_EXPANDER__TREAT_Z_AS_LOCAL=false`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let settings = Self::builder()?
            .add_source(config::File::with_name(CONFIG_FILE_NAME).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_KEY_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Builds `Settings` from TOML text layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the TOML is malformed or a value has the wrong type.
    pub fn from_toml_str(toml: &str) -> CoreResult<Self> {
        let settings = Self::builder()?
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    fn builder() -> CoreResult<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("expander.default_timezone", DEFAULT_TIMEZONE)?
            .set_default("expander.treat_z_as_local", true)?
            .set_default("expander.verbose", false)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.expander.default_timezone.trim().is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "expander.default_timezone must not be empty".to_string(),
            ));
        }

        if let Some(year) = self
            .expander
            .window_year
            .filter(|year| !(1..=9999).contains(year))
        {
            return Err(CoreError::InvalidConfiguration(format!(
                "expander.window_year out of range: {year}"
            )));
        }

        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(
        default_timezone = %settings.expander.default_timezone,
        treat_z_as_local = settings.expander.treat_z_as_local,
        "Expander settings loaded"
    );
    Ok(settings)
}

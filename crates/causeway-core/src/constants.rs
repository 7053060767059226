/// Zone used when no default source timezone is configured.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Prefix for environment variable overrides, e.g.
/// `CAUSEWAY_EXPANDER__DEFAULT_TIMEZONE=Australia/Sydney`.
pub const ENV_PREFIX: &str = "CAUSEWAY";

/// Separator between nested keys in environment variable names.
pub const ENV_KEY_SEPARATOR: &str = "__";

/// Optional configuration file, resolved relative to the working directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_LOG_LEVEL: &str = "info";

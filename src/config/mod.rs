// Configuration management module
// TOML settings plus the startup credential lookup

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    ApiKey, Config, ConfigError, EmbeddingConfig, GOOGLE_API_KEY_VAR, GenerationConfig,
    IndexConfig, resolve_api_key,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("cosmic-explorer"))
        .ok_or(ConfigError::DirectoryError)
}


use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

use super::{Config, ConfigError, EmbeddingConfig, GOOGLE_API_KEY_VAR, get_config_dir};
use crate::embeddings::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!(
        "{}",
        style("🔧 Cosmic Explorer Configuration Setup").bold().cyan()
    );
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Server Configuration").bold().yellow());
    eprintln!("Configure the local embedding server used to encode questions.");
    eprintln!("The model must match the one the chunk index was built with.");
    eprintln!();

    configure_embedding(&mut config.embedding)?;

    eprintln!();
    eprintln!("{}", style("Generation Configuration").bold().yellow());
    configure_generation(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Index Location").bold().yellow());
    configure_index(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_embedding_connection(&config)? {
        eprintln!("{}", style("✓ Embedding server connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to the embedding server").yellow()
        );
        eprintln!("You can continue, but make sure it is running before asking questions.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Server:").bold().yellow());
    eprintln!("  Host: {}", style(&config.embedding.host).cyan());
    eprintln!("  Port: {}", style(config.embedding.port).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    match config.embedding_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Generation:").bold().yellow());
    eprintln!("  Model: {}", style(&config.generation.model).cyan());
    eprintln!("  Temperature: {}", style(config.generation.temperature).cyan());
    // Report presence only. The key itself is never printed.
    let key_state = if std::env::var(GOOGLE_API_KEY_VAR).is_ok_and(|v| !v.trim().is_empty()) {
        style("set").green()
    } else {
        style("missing").red()
    };
    eprintln!("  {}: {}", GOOGLE_API_KEY_VAR, key_state);

    eprintln!();
    eprintln!("{}", style("Index:").bold().yellow());
    eprintln!("  Path: {}", style(config.index.path.display()).cyan());
    eprintln!("  Table: {}", style(&config.index.table).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let mut config = Config::default();
            config.base_dir = config_dir.clone();
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_embedding(embedding: &mut EmbeddingConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == embedding.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Embedding server protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Embedding server host")
        .default(embedding.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = EmbeddingConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..EmbeddingConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Embedding server port")
        .default(embedding.port)
        .validate_with(|input: &u16| -> Result<(), ConfigError> {
            if *input == 0 {
                Err(ConfigError::InvalidPort(*input))
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(embedding.model.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            if input.trim().is_empty() {
                Err(ConfigError::InvalidModel(input.clone()))
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    embedding.set_protocol(protocol)?;
    embedding.set_host(host)?;
    embedding.set_port(port)?;
    embedding.set_model(model)?;

    Ok(())
}

fn configure_generation(config: &mut Config) -> Result<()> {
    let model: String = Input::new()
        .with_prompt("Generation model")
        .default(config.generation.model.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            if input.trim().is_empty() {
                Err(ConfigError::InvalidModel(input.clone()))
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(config.generation.temperature)
        .validate_with(|input: &f32| -> Result<(), ConfigError> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err(ConfigError::InvalidTemperature(*input))
            }
        })
        .interact_text()?;

    config.generation.set_model(model)?;
    config.generation.set_temperature(temperature)?;

    Ok(())
}

fn configure_index(config: &mut Config) -> Result<()> {
    let path: String = Input::new()
        .with_prompt("Chunk index directory")
        .default(config.index.path.display().to_string())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            if input.trim().is_empty() {
                Err(ConfigError::InvalidIndexPath)
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.index.path = PathBuf::from(path);

    if !config.index.path.exists() {
        eprintln!(
            "{}",
            style("⚠ Warning: that directory does not exist yet").yellow()
        );
        eprintln!("The index must be built offline and placed there before asking questions.");
    }

    Ok(())
}

fn test_embedding_connection(config: &Config) -> Result<bool> {
    match OllamaClient::new(config) {
        Ok(client) => Ok(client.ping().is_ok()),
        Err(_) => Ok(false),
    }
}

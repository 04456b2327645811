use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::{Config, GOOGLE_API_KEY_VAR, get_config_dir, resolve_api_key};
use crate::embeddings::OllamaClient;
use crate::generation::GeminiClient;
use crate::index::ChunkIndex;
use crate::loader::ResourceLoader;
use crate::pipeline::AnswerPipeline;

/// Whether a submitted line should reach the answer pipeline.
/// Empty and whitespace-only input is a no-op.
pub(crate) fn should_submit(input: &str) -> bool {
    !input.trim().is_empty()
}

/// Resolve the credential, load the shared resources, and wire up the
/// pipeline. The credential check runs first: without it nothing else is
/// attempted.
async fn build_pipeline() -> Result<AnswerPipeline> {
    let api_key = resolve_api_key()?;

    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    let resources = ResourceLoader::global().get_or_load(&config).await?;
    let generator =
        GeminiClient::new(&config, api_key).context("Failed to create generation client")?;

    Ok(AnswerPipeline::new(
        Arc::clone(&resources.embedder),
        Arc::clone(&resources.index),
        generator,
    ))
}

async fn answer_with_spinner(pipeline: &AnswerPipeline, question: &str) -> Result<String> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Searching the cosmos for an answer...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = pipeline.answer(question).await;

    spinner.finish_and_clear();
    result.map_err(Into::into)
}

/// Run the interactive question-and-answer session
#[inline]
pub async fn run_chat() -> Result<()> {
    let pipeline = build_pipeline().await?;

    eprintln!("{}", style("🚀 Cosmic Explorer Bot 🪐").bold().cyan());
    eprintln!("Your personal guide to the wonders of our solar system, powered by NASA data.");
    eprintln!();
    eprintln!("{}", style("Type a question, or 'exit' to quit.").dim());
    eprintln!();

    loop {
        let question: String = Input::new()
            .with_prompt("Ask a question about any of our solar system's 8 planets")
            .allow_empty(true)
            .interact_text()?;

        if matches!(question.trim(), "exit" | "quit") {
            break;
        }

        if !should_submit(&question) {
            continue;
        }

        info!("Answering chat question");
        match answer_with_spinner(&pipeline, &question).await {
            Ok(answer) => {
                eprintln!();
                println!("{}", answer);
                eprintln!();
            }
            Err(e) => {
                // Surfaced unfiltered; the session continues
                error!("Answer pipeline failed: {:#}", e);
                eprintln!("{} {:#}", style("Error:").red().bold(), e);
                eprintln!();
            }
        }
    }

    Ok(())
}

/// Answer a single question and print the result
#[inline]
pub async fn ask(question: &str) -> Result<()> {
    if !should_submit(question) {
        eprintln!("Nothing to ask.");
        return Ok(());
    }

    let pipeline = build_pipeline().await?;
    let answer = answer_with_spinner(&pipeline, question).await?;

    println!("{}", answer);
    Ok(())
}

/// Show connectivity and index status
#[inline]
pub async fn show_status() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    let config = Config::load(&config_dir).unwrap_or_default();

    println!("📊 Cosmic Explorer Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Embedding Server Status:");
    match OllamaClient::new(&config) {
        Ok(client) => match client.ping().and_then(|()| client.validate_model()) {
            Ok(()) => {
                println!(
                    "   ✅ Server: Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
                println!("   📋 Model: {}", config.embedding.model);
            }
            Err(e) => {
                println!("   ⚠️  Server: Reachable but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Server: Failed to connect - {}", e);
        }
    }

    println!();
    println!("🔍 Chunk Index Status:");
    match ChunkIndex::open(&config).await {
        Ok(index) => {
            println!("   ✅ Index: Loaded from {}", config.index_path().display());
            println!("   📐 Vector Dimension: {}", index.vector_dimension());
            match index.count_chunks().await {
                Ok(count) => println!("   📄 Chunks: {}", count),
                Err(e) => println!("   ⚠️  Chunks: Unknown - {}", e),
            }
        }
        Err(e) => {
            println!("   ❌ Index: {}", e);
        }
    }

    println!();
    println!("🔑 Credential Status:");
    match resolve_api_key() {
        Ok(_) => println!("   ✅ {}: set", GOOGLE_API_KEY_VAR),
        Err(e) => println!("   ❌ {}", e),
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'cosmic-explorer config' to adjust server and index settings");
    println!("   • Use 'cosmic-explorer chat' for an interactive session");
    println!("   • Use 'cosmic-explorer ask \"<question>\"' for a one-shot answer");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_input_is_submitted() {
        assert!(should_submit("Which planet is fourth from the Sun?"));
        assert!(should_submit("  padded  "));
    }

    #[test]
    fn empty_input_is_not_submitted() {
        assert!(!should_submit(""));
        assert!(!should_submit("   "));
        assert!(!should_submit("\t\n"));
    }
}

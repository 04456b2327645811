use clap::{Parser, Subcommand};
use cosmic_explorer::Result;
use cosmic_explorer::commands::{ask, run_chat, show_status};
use cosmic_explorer::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "cosmic-explorer")]
#[command(about = "Retrieval-augmented Q&A about the solar system's planets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server, generation model, and index location
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ask a single question and print the answer
    Ask {
        /// The question to answer
        question: String,
    },
    /// Start an interactive question-and-answer session
    Chat,
    /// Show embedding server, index, and credential status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ask { question } => {
            ask(&question).await?;
        }
        Commands::Chat => {
            run_chat().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["cosmic-explorer", "chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Chat);
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["cosmic-explorer", "ask", "How many moons does Mars have?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question } = parsed.command {
                assert_eq!(question, "How many moons does Mars have?");
            }
        }
    }

    #[test]
    fn ask_command_requires_question() {
        let cli = Cli::try_parse_from(["cosmic-explorer", "ask"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["cosmic-explorer", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["cosmic-explorer", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["cosmic-explorer", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}

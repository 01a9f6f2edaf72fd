//! tutorgate CLI: the main entry point.
//!
//! Commands:
//! - `ask`: ask the tutor about an exercise
//! - `hint`: request a proactive hint
//! - `config`: show effective or default configuration
//! - `doctor`: diagnose configuration and provider health

use clap::{Parser, Subcommand};

mod commands;

use commands::RequestArgs;

#[derive(Parser)]
#[command(
    name = "tutorgate",
    about = "tutorgate: a pedagogical firewall between learners and LLM tutors",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the tutor a question
    Ask {
        #[command(flatten)]
        request: RequestArgs,

        /// The learner's question (at most 500 characters)
        #[arg(short, long)]
        query: String,
    },

    /// Request a proactive hint
    Hint {
        #[command(flatten)]
        request: RequestArgs,

        /// Optional question to go with the hint
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show configuration
    Config {
        /// Print the default configuration instead of the effective one
        #[arg(long)]
        defaults: bool,
    },

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so replies on stdout stay pipeable
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask { request, query } => commands::ask::run(request, query).await?,
        Commands::Hint { request, query } => commands::hint::run(request, query).await?,
        Commands::Config { defaults } => commands::config_cmd::run(defaults).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorgate_core::behavior::{CognitiveState, ProvenanceState};

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_parses_states() {
        let cli = Cli::try_parse_from([
            "tutorgate",
            "ask",
            "--problem-id",
            "two-sum",
            "--problem",
            "Find two numbers",
            "--query",
            "why?",
            "--cognitive",
            "passive-idle",
            "--provenance",
            "SUSPECTED_PASTE",
            "--json",
        ])
        .unwrap();

        let Commands::Ask { request, query } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(query, "why?");
        assert!(request.json);
        assert_eq!(request.cognitive, Some(CognitiveState::PassiveIdle));
        assert_eq!(request.provenance, Some(ProvenanceState::SuspectedPaste));
        assert_eq!(request.iteration, None);
    }

    #[test]
    fn ask_requires_a_query() {
        assert!(
            Cli::try_parse_from([
                "tutorgate",
                "ask",
                "--problem-id",
                "p",
                "--problem",
                "text",
            ])
            .is_err()
        );
    }

    #[test]
    fn hint_query_is_optional() {
        let cli = Cli::try_parse_from([
            "tutorgate",
            "hint",
            "--problem-id",
            "p",
            "--problem",
            "text",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Hint { query: None, .. }));
    }

    #[test]
    fn unknown_state_is_rejected() {
        assert!(
            Cli::try_parse_from([
                "tutorgate",
                "hint",
                "--problem-id",
                "p",
                "--problem",
                "text",
                "--cognitive",
                "SLEEPY",
            ])
            .is_err()
        );
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["tutorgate", "doctor", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}

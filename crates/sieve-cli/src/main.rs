//! Sieve CLI - Check proposed Wikibase edits against property constraints

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, constraints, rules, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Constraint checks for Wikibase edits before they are saved", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of .sieve/config.toml and ~/.sieve/config.toml
    #[arg(long, global = true)]
    config: Option<String>,

    /// Serve entities from a JSON snapshot instead of the Wikibase API
    #[arg(long, global = true)]
    offline: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a batch of item updates
    Check {
        /// JSON file holding an array of item updates
        batch: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,

        /// Evaluate on the current thread only
        #[arg(long)]
        sequential: bool,
    },

    /// Show constraint declarations of one type on a property
    Constraints {
        /// Property id (e.g., P570)
        property: String,

        /// Constraint type item id (e.g., Q21510854)
        constraint_type: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// List registered rules and whether the configuration enables them
    Rules,
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sieve_cli=info,sieve_scrutinize=info,sieve_cache=info,sieve_fetch=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let context = Context::load(cli.config.as_deref(), cli.offline)?;

    match cli.command {
        Commands::Check {
            batch,
            format,
            sequential,
        } => check::run(
            &context,
            check::CheckArgs {
                batch,
                format,
                sequential,
            },
        ),
        Commands::Constraints {
            property,
            constraint_type,
            format,
        } => constraints::run(&context, &property, &constraint_type, &format),
        Commands::Rules => rules::run(&context),
    }
}

//! sqlload CLI - Main entry point

use clap::Parser;
use sqlload_cli::{Cli, Commands, ConnectionConfig};
use sqlload_common::logging::{init_logging, LogConfig, LogLevel};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    let Some(command) = cli.command.as_ref() else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    // Verbose mode logs debug events, otherwise progress at info
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = match log_config.clone().with_env_overrides() {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment overrides: {}", e);
            log_config
        },
    };

    // The CLI still works without logging
    let guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    let config = ConnectionConfig::from(&cli.connection);
    let result = execute_command(command, &config).await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        if e.is_data_error() {
            eprintln!("No rows were loaded; fix the input and run the load again.");
        }
        // process::exit skips destructors; flush the log file first
        drop(guard);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(command: &Commands, config: &ConnectionConfig) -> sqlload_cli::Result<()> {
    match command {
        Commands::Check => sqlload_cli::commands::check::run(config).await,

        Commands::LoadCsv {
            table,
            path,
            nullstr,
            sep,
            types,
        } => {
            sqlload_cli::commands::load_csv::run(config, table, path, nullstr, sep, types.as_deref())
                .await
        },

        Commands::LoadSql { path } => sqlload_cli::commands::load_sql::run(config, path).await,

        Commands::QuerySql { path } => sqlload_cli::commands::query_sql::run(config, path).await,

        Commands::PrintDsn { redacted } => sqlload_cli::commands::print_dsn::run(config, *redacted),
    }
}

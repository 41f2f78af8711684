// qualis/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

use qualis_core::QualisError;
use qualis_core::infrastructure::error::InfrastructureError;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // RUST_LOG=debug qualis run ... to see generated SQL.
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli).await.map_err(into_report)
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Rules { table } => commands::rules::execute(&cli.project_dir, table, cli.json)?,
        Commands::Run { rule, table } => {
            commands::run::execute(&cli.project_dir, rule, table, cli.json).await?
        }
        Commands::Scores => commands::scores::execute(&cli.project_dir, cli.json).await?,
        Commands::Analyze {
            query,
            source,
            explain,
            repeat,
        } => {
            commands::analyze::execute(&cli.project_dir, &query, &source, explain, repeat, cli.json)
                .await?
        }
    }

    Ok(())
}

/// Renders library errors with their diagnostic code and help.
/// The outermost context, if any, stays as the headline.
fn into_report(err: anyhow::Error) -> miette::Report {
    let headline = err.to_string();
    let report = match err.downcast::<QualisError>() {
        Ok(e) => miette::Report::new(e),
        Err(err) => match err.downcast::<InfrastructureError>() {
            Ok(e) => miette::Report::new(e),
            Err(other) => return miette::miette!("{:#}", other),
        },
    };
    if report.to_string() == headline {
        report
    } else {
        report.wrap_err(headline)
    }
}

use crate::{error::CliError, job_file::JobFile, shutdown::ShutdownCoordinator};
use clap::Parser;
use commands::Commands;
use connectors::{backend::SearchBackend, http::HttpSearchBackend};
use engine::auth::{Principal, Role};
use std::process::exit;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};

mod commands;
mod error;
mod job_file;
mod output;
mod shutdown;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "resift", version = "0.0.1", about = "Bulk search-index mutation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let shutdown = ShutdownCoordinator::new(cancel.clone());
    shutdown.register_handlers();

    match run(cli, cancel).await {
        Ok(()) => {}
        Err(CliError::ShutdownRequested) => exit(shutdown::ExitCode::ShutdownRequested.as_i32()),
        Err(err) => {
            eprintln!("{err}");
            exit(shutdown::ExitCode::GeneralError.as_i32());
        }
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), CliError> {
    match cli.command {
        Commands::Run {
            job,
            url,
            principal,
            roles,
            json,
        } => {
            let job_file = load_job_file(&job).await?;
            let label = job_file.label.clone();
            let principal = build_principal(&principal, &roles)?;
            let backend: Arc<dyn SearchBackend> =
                Arc::new(HttpSearchBackend::new(&url, REQUEST_TIMEOUT)?);

            info!(label = %label, url = %url, "Running bulk job");
            let bulk_job = job_file.into_job()?;
            let receipt = match bulk_job.run(backend, &principal, cancel.clone()).await {
                Ok(receipt) => receipt,
                Err(err) if cancel.is_cancelled() => {
                    info!("Run cancelled: {err}");
                    return Err(CliError::ShutdownRequested);
                }
                Err(err) => return Err(err.into()),
            };

            if json {
                output::print_receipt_json(&receipt)?;
            } else {
                output::print_receipt_table(&label, &receipt);
            }
        }
        Commands::Ping { url } => {
            let backend = HttpSearchBackend::new(&url, REQUEST_TIMEOUT)?;
            backend.ping().await?;
            println!("{url}: ok");
        }
        Commands::Job { file } => {
            let job_file = load_job_file(&file).await?;
            let json = serde_json::to_string_pretty(&job_file)?;
            println!("{json}");
        }
    }

    Ok(())
}

async fn load_job_file(path: &str) -> Result<JobFile, CliError> {
    let raw = tokio::fs::read_to_string(path).await?;
    JobFile::parse(&raw)
}

fn build_principal(name: &str, roles: &[String]) -> Result<Principal, CliError> {
    let mut principal = Principal::new(name);
    for role in roles {
        let role = Role::from_str(role).map_err(CliError::InvalidRole)?;
        principal = principal.with_role(role);
    }
    Ok(principal)
}

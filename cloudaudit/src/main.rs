//! Cloudaudit - audit log export tool
//!
//! CLI for exporting cloud organisation audit logs to JSON files
use chrono::Local;
use clap::Parser;
use cloudaudit::{ExportConfig, Interrupt, Result, cli, credentials, run_export};
use cloudaudit_api::CloudAuditClient;
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging; stdout is reserved for exported JSON
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Cli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Cli) -> Result<()> {
    match args.command {
        cli::Commands::HelpEnv => {
            credentials::print_environment_variables();
            Ok(())
        }
        cli::Commands::Export(export_args) => {
            // Flags are validated before credentials are needed
            let config = ExportConfig::from_args(&export_args, Local::now())?;

            let client_config = credentials::load_config_from_env()?;
            let client = CloudAuditClient::new(client_config)?;
            let api = client.audit_log_api();

            let interrupt = Interrupt::on_ctrl_c();
            let summary = run_export(&api, &config, &interrupt).await?;

            info!(
                "Success! {} audit log entries saved to {} destination(s)",
                summary.total_logs,
                summary.files.len()
            );
            Ok(())
        }
    }
}

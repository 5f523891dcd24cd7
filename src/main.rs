use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::info;

use geoheaders::cli::Cli;
use geoheaders::config::{StaticConfig, validate_config};
use geoheaders::errors::GeoHeadersError;
use geoheaders::runtime::modes::{self, Mode};
use geoheaders::system::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<GeoHeadersError>() {
                Some(e) => eprintln!("{}", e.format_colored()),
                None => eprintln!("{} {:#}", "Error:".red().bold(), err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mode = modes::detect_mode(&cli);

    if mode == Mode::PrintConfig {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    let config = StaticConfig::load(cli.config.as_deref())?;
    validate_config(&config)?;

    // Must outlive the server so buffered log lines are flushed
    let _guard = init_logging(&config.logging)?;

    match mode {
        Mode::Check => {
            let geoip = modes::prepare_geoip(&config)?;
            info!("Configuration OK, GeoIP instance '{}' ready", geoip.name());
            println!("{}", "Configuration OK".green().bold());
            Ok(())
        }
        Mode::Server => modes::run_server(&config).await,
        Mode::PrintConfig => Ok(()),
    }
}

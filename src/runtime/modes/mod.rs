//! Mode routing
//!
//! - Server mode (HTTP server, default)
//! - Check mode (validate configuration and open the database, then exit)
//! - Print mode (emit a sample configuration)

pub mod server;

pub use server::{prepare_geoip, run_server};

use crate::cli::Cli;

/// Execution mode selected by command-line flags
#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Server,
    Check,
    PrintConfig,
}

/// Detect which mode to run
///
/// `--print-config` wins over `--check`; no flag means server mode.
pub fn detect_mode(cli: &Cli) -> Mode {
    if cli.print_config {
        Mode::PrintConfig
    } else if cli.check {
        Mode::Check
    } else {
        Mode::Server
    }
}

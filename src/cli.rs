//! Command-line interface definitions using clap

use clap::Parser;

/// GeoHeaders - annotate requests with GeoIP location headers
#[derive(Parser, Debug)]
#[command(name = "geoheaders")]
#[command(version)]
#[command(
    about = "Resolve the client IP against a MaxMind database and forward the location as request headers",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (default: config.toml, optional)
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Print a sample configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Validate the configuration and open the database, then exit
    #[arg(long)]
    pub check: bool,
}

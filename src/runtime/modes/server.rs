//! Server mode
//!
//! Runs a standalone HTTP server with the GeoIP middleware in front of the
//! inspect handler. Every path is answered by the handler, so any request
//! shows what the middleware attached.

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::middleware::GeoIpHeaders;
use crate::api::services::InspectService;
use crate::config::StaticConfig;

/// Build the middleware from the `[geoip]` section.
///
/// The database is opened once here; each worker gets a clone sharing it.
pub fn prepare_geoip(config: &StaticConfig) -> Result<GeoIpHeaders> {
    let geoip = GeoIpHeaders::new(&config.geoip).map_err(|e| {
        tracing::error!("GeoIP initialization failed: {}", e);
        e
    })?;

    if geoip.exclusions().is_empty() {
        info!("GeoIP: No excluded ranges configured");
    } else {
        info!(
            "GeoIP: {} excluded ranges: {}",
            geoip.exclusions().len(),
            geoip
                .exclusions()
                .blocks()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(geoip)
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let geoip = prepare_geoip(config)?;

    let workers = config.server.workers.clamp(1, 32);
    if workers != config.server.workers {
        warn!(
            "Configured worker count {} is out of range, using {}",
            config.server.workers, workers
        );
    }

    let server = HttpServer::new(move || {
        App::new()
            .wrap(geoip.clone())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store")))
            .default_service(web::to(InspectService::inspect))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(workers);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server terminated with an error")?;

    info!("Server stopped");
    Ok(())
}

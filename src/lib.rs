//! GeoHeaders - GeoIP request annotation middleware
//!
//! Resolves the client address of each HTTP request against a MaxMind
//! GeoIP2/GeoLite2 database and forwards the result to the wrapped service
//! as seven `X-Geoip2-*` request headers (country, country code, region,
//! city, latitude, longitude, geohash).
//!
//! # Architecture
//! - `api`: the actix-web middleware and the inspect handler
//! - `services`: GeoIP lookup engines (MaxMind reader, in-memory table)
//! - `utils`: client IP extraction, exclusion ranges, geohash encoding
//! - `config`: TOML + environment configuration and validation
//! - `runtime`: execution modes (server, check)
//! - `system`: logging initialization
//!
//! # Example
//! ```no_run
//! use actix_web::{App, HttpServer, web};
//! use geoheaders::api::middleware::GeoIpHeaders;
//! use geoheaders::config::GeoIpConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let geoip = GeoIpHeaders::new(&GeoIpConfig {
//!     database_path: "GeoLite2-City.mmdb".into(),
//!     ..Default::default()
//! })?;
//!
//! HttpServer::new(move || {
//!     App::new()
//!         .wrap(geoip.clone())
//!         .route("/", web::get().to(|| async { "ok" }))
//! })
//! .bind(("127.0.0.1", 8080))?
//! .run()
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod system;
pub mod utils;

//! 配置值验证模块
//!
//! Checks run before the server starts. Malformed `exclude_ips` entries are
//! not checked here: the middleware skips them one by one.

use actix_web::http::header::HeaderName;

use super::{GeoIpConfig, StaticConfig};
use crate::errors::{GeoHeadersError, Result};

const LOG_FORMATS: &[&str] = &["text", "json"];

/// Validate the whole static configuration, reporting every problem at once.
pub fn validate_config(config: &StaticConfig) -> Result<()> {
    let mut problems = Vec::new();

    if config.server.port == 0 {
        problems.push("server.port must not be 0".to_string());
    }

    if config.server.workers == 0 {
        problems.push("server.workers must be at least 1".to_string());
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        problems.push(format!(
            "logging.format \"{}\" is invalid. Valid: {:?}",
            config.logging.format, LOG_FORMATS
        ));
    }

    if let Err(e) = validate_geoip_config(&config.geoip) {
        problems.push(e.message().to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(GeoHeadersError::config(problems.join("; ")))
    }
}

/// Validate the middleware section on its own.
pub fn validate_geoip_config(config: &GeoIpConfig) -> Result<()> {
    if config.database_path.trim().is_empty() {
        return Err(GeoHeadersError::config("geoip.database_path must be set"));
    }

    parse_forwarded_headers(&config.forwarded_headers)?;
    Ok(())
}

/// Parse the configured forwarding header names, keeping their order.
pub fn parse_forwarded_headers(names: &[String]) -> Result<Vec<HeaderName>> {
    names
        .iter()
        .map(|name| {
            HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| {
                GeoHeadersError::config(format!(
                    "geoip.forwarded_headers: \"{}\" is not a valid header name",
                    name
                ))
            })
        })
        .collect()
}

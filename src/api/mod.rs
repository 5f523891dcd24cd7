//! HTTP layer: the GeoIP middleware and the handlers of the standalone server

pub mod middleware;
pub mod services;

//! Service layer
//!
//! Geolocation lookup engines consumed by the HTTP middleware.

pub mod geoip;

pub use geoip::{GeoIpLookup, GeoIpProvider, GeoRecord, MaxMindProvider, MemoryProvider};

//! GeoIP request annotation middleware
//!
//! Resolves the client address of every request against the GeoIP database
//! and writes the result into seven request headers before the wrapped
//! service runs:
//!
//! 1. extract the candidate IP (forwarding header chain, then peer address)
//! 2. skip excluded addresses
//! 3. look the address up
//! 4. write the record fields and the geohash
//!
//! The seven headers are always stripped first, so a request never carries
//! geolocation from an earlier hop or a different source address. Every
//! path ends in exactly one call of the wrapped service; nothing here
//! produces a response of its own.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderMap, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::net::IpAddr;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, trace, warn};

use crate::config::{GeoIpConfig, parse_forwarded_headers, validate_geoip_config};
use crate::errors;
use crate::services::geoip::{GeoIpProvider, GeoRecord};
use crate::utils::ip::{ExclusionList, extract_candidate_ip};

pub const X_GEOIP_COUNTRY: &str = "x-geoip2-country";
pub const X_GEOIP_COUNTRY_CODE: &str = "x-geoip2-countrycode";
pub const X_GEOIP_REGION: &str = "x-geoip2-region";
pub const X_GEOIP_CITY: &str = "x-geoip2-city";
pub const X_GEOIP_LATITUDE: &str = "x-geoip2-latitude";
pub const X_GEOIP_LONGITUDE: &str = "x-geoip2-longitude";
pub const X_GEOIP_GEOHASH: &str = "x-geoip2-geohash";

/// All headers owned by the middleware, in output order.
pub const GEOIP_HEADERS: [&str; 7] = [
    X_GEOIP_COUNTRY,
    X_GEOIP_COUNTRY_CODE,
    X_GEOIP_REGION,
    X_GEOIP_CITY,
    X_GEOIP_LATITUDE,
    X_GEOIP_LONGITUDE,
    X_GEOIP_GEOHASH,
];

/// What happened to a request's geolocation headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    /// Record found and written
    Annotated,
    /// Candidate matched an exclusion block; no lookup done
    Excluded,
    /// No usable client address
    NoAddress,
    /// Valid address without a database record
    NotFound,
    /// The database failed to answer
    LookupFailed,
}

impl Annotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Annotation::Annotated => "annotated",
            Annotation::Excluded => "excluded",
            Annotation::NoAddress => "no_address",
            Annotation::NotFound => "not_found",
            Annotation::LookupFailed => "lookup_failed",
        }
    }
}

struct GeoIpState {
    name: String,
    provider: GeoIpProvider,
    exclusions: ExclusionList,
    forwarded_headers: Vec<HeaderName>,
    debug: bool,
}

/// GeoIP 中间件工厂
///
/// Built once; clones share the same opened database across all workers.
#[derive(Clone)]
pub struct GeoIpHeaders {
    state: Arc<GeoIpState>,
}

impl GeoIpHeaders {
    /// Open the configured MaxMind database and build the middleware.
    ///
    /// Fails when the database path is empty, missing, or not a MaxMind
    /// database. No half-initialized instance is ever returned.
    pub fn new(config: &GeoIpConfig) -> errors::Result<Self> {
        validate_geoip_config(config)?;
        let provider = GeoIpProvider::open(&config.database_path)?;
        Self::with_provider(config, provider)
    }

    /// Build the middleware around an already opened lookup engine.
    /// `config.database_path` is ignored.
    pub fn with_provider(
        config: &GeoIpConfig,
        provider: GeoIpProvider,
    ) -> errors::Result<Self> {
        let forwarded_headers = parse_forwarded_headers(&config.forwarded_headers)?;

        let (exclusions, rejected) = ExclusionList::parse(&config.exclude_ips);
        if config.debug {
            for (entry, err) in &rejected {
                warn!(
                    instance = %config.name,
                    "GeoIP: Skipping exclusion entry \"{}\": {}",
                    entry,
                    err.message()
                );
            }
        }

        info!(
            instance = %config.name,
            provider = provider.provider_name(),
            exclusions = exclusions.len(),
            "GeoIP: Middleware initialized"
        );

        Ok(Self {
            state: Arc::new(GeoIpState {
                name: config.name.clone(),
                provider,
                exclusions,
                forwarded_headers,
                debug: config.debug,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.state.exclusions
    }

    /// Rewrite the geolocation headers of one request.
    ///
    /// `remote_addr` is the direct peer as `host:port`; it is only used when
    /// no forwarding header yields an address.
    pub fn annotate(&self, remote_addr: &str, headers: &mut HeaderMap) -> Annotation {
        self.state.annotate(remote_addr, headers)
    }
}

impl GeoIpState {
    fn annotate(&self, remote_addr: &str, headers: &mut HeaderMap) -> Annotation {
        clear_geoip_headers(headers);

        let candidate = match extract_candidate_ip(remote_addr, headers, &self.forwarded_headers) {
            Ok(candidate) => candidate,
            Err(e) => {
                trace!(instance = %self.name, "GeoIP: {}", e.message());
                return Annotation::NoAddress;
            }
        };

        if self.exclusions.is_excluded(&candidate) {
            trace!(instance = %self.name, ip = %candidate, "GeoIP: Address excluded");
            return Annotation::Excluded;
        }

        let Ok(ip) = candidate.parse::<IpAddr>() else {
            trace!(instance = %self.name, candidate = %candidate, "GeoIP: Not an IP address");
            return Annotation::NoAddress;
        };

        let record = match self.provider.lookup(ip) {
            Ok(Some(record)) => record,
            Ok(None) => {
                trace!(instance = %self.name, ip = %ip, "GeoIP: No record");
                return Annotation::NotFound;
            }
            Err(e) => {
                if self.debug {
                    warn!(instance = %self.name, ip = %ip, "GeoIP: Lookup failed: {}", e.message());
                }
                return Annotation::LookupFailed;
            }
        };

        write_record(headers, &record);
        Annotation::Annotated
    }
}

/// Remove every geolocation header (absent, not empty).
pub fn clear_geoip_headers(headers: &mut HeaderMap) {
    for name in GEOIP_HEADERS {
        headers.remove(name);
    }
}

fn write_record(headers: &mut HeaderMap, record: &GeoRecord) {
    set_header(headers, X_GEOIP_COUNTRY, record.country.as_deref());
    set_header(headers, X_GEOIP_COUNTRY_CODE, record.country_code.as_deref());
    set_header(headers, X_GEOIP_REGION, record.region.as_deref());
    set_header(headers, X_GEOIP_CITY, record.city.as_deref());
    set_header(
        headers,
        X_GEOIP_LATITUDE,
        record.latitude.map(|v| v.to_string()).as_deref(),
    );
    set_header(
        headers,
        X_GEOIP_LONGITUDE,
        record.longitude.map(|v| v.to_string()).as_deref(),
    );
    set_header(headers, X_GEOIP_GEOHASH, record.geohash().as_deref());
}

/// Write a non-empty value; anything that is not a legal header value stays absent.
fn set_header(headers: &mut HeaderMap, name: &'static str, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };

    match HeaderValue::from_bytes(value.as_bytes()) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => trace!("GeoIP: Dropping {} value {:?}", name, value),
    }
}

impl<S, B> Transform<S, ServiceRequest> for GeoIpHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = GeoIpHeadersService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GeoIpHeadersService {
            service: Rc::new(service),
            state: Arc::clone(&self.state),
        }))
    }
}

pub struct GeoIpHeadersService<S> {
    service: Rc<S>,
    state: Arc<GeoIpState>,
}

impl<S, B> Service<ServiceRequest> for GeoIpHeadersService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        let remote_addr = req
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default();
        let outcome = self.state.annotate(&remote_addr, req.headers_mut());

        trace!(
            instance = %self.state.name,
            outcome = outcome.as_str(),
            path = %req.path(),
            "GeoIP: Request annotated"
        );

        Box::pin(async move { srv.call(req).await })
    }
}

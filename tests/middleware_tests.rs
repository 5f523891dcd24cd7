//! Middleware tests
//!
//! Drives `GeoIpHeaders` through a real actix-web service stack with an
//! in-memory lookup table, checking the headers the downstream handler sees.

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, HttpRequest, HttpResponse, web};
use serde_json::Value;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use geoheaders::api::middleware::{
    GEOIP_HEADERS, GeoIpHeaders, X_GEOIP_CITY, X_GEOIP_COUNTRY, X_GEOIP_COUNTRY_CODE,
    X_GEOIP_GEOHASH, X_GEOIP_LATITUDE, X_GEOIP_LONGITUDE, X_GEOIP_REGION,
};
use geoheaders::api::services::InspectService;
use geoheaders::config::GeoIpConfig;
use geoheaders::errors::{GeoHeadersError, Result};
use geoheaders::services::geoip::{GeoIpLookup, GeoIpProvider, GeoRecord, MemoryProvider};

// =============================================================================
// Test Setup
// =============================================================================

const MUNICH_IP: &str = "188.193.88.199";
const BOYDTON_IP: &str = "20.1.184.61";

fn munich() -> GeoRecord {
    GeoRecord {
        country: Some("Germany".into()),
        country_code: Some("DE".into()),
        region: Some("BY".into()),
        city: Some("Munich".into()),
        latitude: Some(48.1872),
        longitude: Some(11.4802),
    }
}

fn boydton() -> GeoRecord {
    GeoRecord {
        country: Some("United States".into()),
        country_code: Some("US".into()),
        region: Some("VA".into()),
        city: Some("Boydton".into()),
        latitude: Some(36.6676),
        longitude: Some(-78.3875),
    }
}

fn city_table() -> MemoryProvider {
    MemoryProvider::new()
        .with(MUNICH_IP.parse().unwrap(), munich())
        .with(BOYDTON_IP.parse().unwrap(), boydton())
}

/// Country-level table: no subdivision, city or coordinates
fn country_table() -> MemoryProvider {
    MemoryProvider::new().with(
        "188.192.0.0/14".parse().unwrap(),
        GeoRecord {
            country: Some("Germany".into()),
            country_code: Some("DE".into()),
            ..Default::default()
        },
    )
}

/// Lookup engine that always fails
struct BrokenLookup;

impl GeoIpLookup for BrokenLookup {
    fn lookup(&self, _ip: IpAddr) -> Result<Option<GeoRecord>> {
        Err(GeoHeadersError::lookup("database is corrupt"))
    }

    fn name(&self) -> &'static str {
        "Broken"
    }
}

fn geoip(config: GeoIpConfig, provider: GeoIpProvider) -> GeoIpHeaders {
    GeoIpHeaders::with_provider(&config, provider).expect("Failed to build middleware")
}

fn peer(ip: &str) -> SocketAddr {
    SocketAddr::new(ip.parse().unwrap(), 9999)
}

/// Run one request through the inspect handler and return the headers it saw.
async fn inspect(middleware: GeoIpHeaders, req: TestRequest) -> HashMap<String, String> {
    let app = test::init_service(
        App::new()
            .wrap(middleware)
            .default_service(web::to(InspectService::inspect)),
    )
    .await;

    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    body.as_object()
        .expect("inspect body must be an object")
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
        .collect()
}

fn assert_munich(headers: &HashMap<String, String>) {
    assert_eq!(headers[X_GEOIP_COUNTRY], "Germany");
    assert_eq!(headers[X_GEOIP_COUNTRY_CODE], "DE");
    assert_eq!(headers[X_GEOIP_REGION], "BY");
    assert_eq!(headers[X_GEOIP_CITY], "Munich");
    assert_eq!(headers[X_GEOIP_LATITUDE], "48.1872");
    assert_eq!(headers[X_GEOIP_LONGITUDE], "11.4802");
    assert_eq!(headers[X_GEOIP_GEOHASH], "u284jhpwu11s");
}

// =============================================================================
// Annotation Tests
// =============================================================================

#[actix_rt::test]
async fn test_annotates_from_remote_addr() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(city_table()),
    );

    let headers = inspect(mw.clone(), TestRequest::get().peer_addr(peer(MUNICH_IP))).await;
    assert_munich(&headers);

    let headers = inspect(mw, TestRequest::get().peer_addr(peer(BOYDTON_IP))).await;
    assert_eq!(headers[X_GEOIP_COUNTRY], "United States");
    assert_eq!(headers[X_GEOIP_COUNTRY_CODE], "US");
    assert_eq!(headers[X_GEOIP_REGION], "VA");
    assert_eq!(headers[X_GEOIP_CITY], "Boydton");
    assert_eq!(headers[X_GEOIP_LATITUDE], "36.6676");
    assert_eq!(headers[X_GEOIP_LONGITUDE], "-78.3875");
    assert_eq!(headers[X_GEOIP_GEOHASH], "dq8285puqb59");
}

#[actix_rt::test]
async fn test_geohash_is_stable_across_requests() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(city_table()),
    );

    let first = inspect(mw.clone(), TestRequest::get().peer_addr(peer(MUNICH_IP))).await;
    let second = inspect(mw, TestRequest::get().peer_addr(peer(MUNICH_IP))).await;
    assert_eq!(first[X_GEOIP_GEOHASH], second[X_GEOIP_GEOHASH]);
}

#[actix_rt::test]
async fn test_leftmost_forwarded_address_wins() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(city_table()),
    );

    let req = TestRequest::get()
        .peer_addr(peer(BOYDTON_IP))
        .insert_header(("X-Forwarded-For", format!("{}, 192.168.1.1", MUNICH_IP)));
    let headers = inspect(mw, req).await;
    assert_munich(&headers);
}

#[actix_rt::test]
async fn test_forwarded_headers_checked_in_order() {
    let config = GeoIpConfig {
        forwarded_headers: vec!["X-Real-IP".into(), "X-Forwarded-For".into()],
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(city_table()));

    let req = TestRequest::get()
        .insert_header(("X-Real-IP", BOYDTON_IP))
        .insert_header(("X-Forwarded-For", MUNICH_IP));
    let headers = inspect(mw.clone(), req).await;
    assert_eq!(headers[X_GEOIP_CITY], "Boydton");

    // Blank first header falls through to the next one
    let req = TestRequest::get()
        .insert_header(("X-Real-IP", " "))
        .insert_header(("X-Forwarded-For", MUNICH_IP));
    let headers = inspect(mw, req).await;
    assert_eq!(headers[X_GEOIP_CITY], "Munich");
}

#[actix_rt::test]
async fn test_country_only_record() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(country_table()),
    );

    let headers = inspect(mw, TestRequest::get().peer_addr(peer(MUNICH_IP))).await;
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[X_GEOIP_COUNTRY], "Germany");
    assert_eq!(headers[X_GEOIP_COUNTRY_CODE], "DE");
    for name in [
        X_GEOIP_REGION,
        X_GEOIP_CITY,
        X_GEOIP_LATITUDE,
        X_GEOIP_LONGITUDE,
        X_GEOIP_GEOHASH,
    ] {
        assert!(!headers.contains_key(name), "{} should be absent", name);
    }
}

// =============================================================================
// Headers Absent Tests
// =============================================================================

#[actix_rt::test]
async fn test_excluded_address_gets_no_headers() {
    let config = GeoIpConfig {
        exclude_ips: vec![MUNICH_IP.into()],
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(city_table()));

    let req = TestRequest::get()
        .peer_addr(peer(MUNICH_IP))
        .insert_header((X_GEOIP_CITY, "Spoofed"));
    let headers = inspect(mw, req).await;
    assert!(headers.is_empty(), "unexpected headers: {:?}", headers);
}

#[actix_rt::test]
async fn test_forwarded_address_decides_exclusion() {
    let config = GeoIpConfig {
        exclude_ips: vec!["188.193.0.0/16".into()],
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(city_table()));

    // Direct peer is not excluded, the forwarded client is
    let req = TestRequest::get()
        .peer_addr(peer(BOYDTON_IP))
        .insert_header(("X-Forwarded-For", MUNICH_IP));
    assert!(inspect(mw.clone(), req).await.is_empty());

    // Direct peer is excluded, the forwarded client is not
    let req = TestRequest::get()
        .peer_addr(peer(MUNICH_IP))
        .insert_header(("X-Forwarded-For", BOYDTON_IP));
    assert_eq!(inspect(mw, req).await[X_GEOIP_CITY], "Boydton");
}

#[actix_rt::test]
async fn test_dual_stack_peer_matches_ipv4_exclusion() {
    let config = GeoIpConfig {
        exclude_ips: vec!["188.193.88.0/24".into()],
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(city_table()));

    // IPv4 client accepted on a `::` socket
    let req = TestRequest::get().peer_addr(peer("::ffff:188.193.88.199"));
    assert!(inspect(mw.clone(), req).await.is_empty());

    // Same form relayed by a proxy
    let req = TestRequest::get()
        .peer_addr(peer(BOYDTON_IP))
        .insert_header(("X-Forwarded-For", "::ffff:188.193.88.199"));
    assert!(inspect(mw, req).await.is_empty());
}

#[actix_rt::test]
async fn test_invalid_exclusion_entry_is_skipped() {
    let config = GeoIpConfig {
        debug: true,
        exclude_ips: vec!["invalid".into(), format!("{}/32", BOYDTON_IP)],
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(city_table()));
    assert_eq!(mw.exclusions().len(), 1);

    let headers = inspect(mw.clone(), TestRequest::get().peer_addr(peer(MUNICH_IP))).await;
    assert_munich(&headers);

    let headers = inspect(mw, TestRequest::get().peer_addr(peer(BOYDTON_IP))).await;
    assert!(headers.is_empty());
}

#[actix_rt::test]
async fn test_unparseable_forwarded_address() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(city_table()),
    );

    let req = TestRequest::get()
        .peer_addr(peer(MUNICH_IP))
        .insert_header(("X-Forwarded-For", "qwerty"));
    assert!(inspect(mw, req).await.is_empty());
}

#[actix_rt::test]
async fn test_missing_peer_address() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(city_table()),
    );

    assert!(inspect(mw, TestRequest::get()).await.is_empty());
}

#[actix_rt::test]
async fn test_unknown_address_gets_no_headers() {
    let mw = geoip(
        GeoIpConfig::default(),
        GeoIpProvider::from_lookup(city_table()),
    );

    let req = TestRequest::get()
        .peer_addr(peer("2001:db8::1"))
        .insert_header((X_GEOIP_COUNTRY, "Atlantis"));
    assert!(inspect(mw, req).await.is_empty());
}

#[actix_rt::test]
async fn test_lookup_failure_passes_request_through() {
    let config = GeoIpConfig {
        debug: true,
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(BrokenLookup));

    assert!(
        inspect(mw, TestRequest::get().peer_addr(peer(MUNICH_IP)))
            .await
            .is_empty()
    );
}

// =============================================================================
// Downstream Invocation Tests
// =============================================================================

#[actix_rt::test]
async fn test_downstream_called_exactly_once_per_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = GeoIpConfig {
        exclude_ips: vec![MUNICH_IP.into()],
        ..Default::default()
    };
    let mw = geoip(config, GeoIpProvider::from_lookup(city_table()));

    let counter = calls.clone();
    let app = test::init_service(App::new().wrap(mw).default_service(web::to(
        move |req: HttpRequest| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let present = GEOIP_HEADERS
                    .iter()
                    .filter(|name| req.headers().contains_key(**name))
                    .count();
                HttpResponse::Ok().body(present.to_string())
            }
        },
    )))
    .await;

    let requests = [
        TestRequest::get().peer_addr(peer(MUNICH_IP)),
        TestRequest::get().peer_addr(peer(BOYDTON_IP)),
        TestRequest::get().insert_header(("X-Forwarded-For", "qwerty")),
        TestRequest::get(),
    ];
    let expected = ["0", "7", "0", "0"];

    for (req, expected) in requests.into_iter().zip(expected) {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, expected.as_bytes());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

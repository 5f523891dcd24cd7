use actix_web::{HttpRequest, HttpResponse, Responder};
use serde_json::{Map, Value};
use tracing::trace;

use crate::api::middleware::GEOIP_HEADERS;

/// Inspect Service
///
/// Downstream handler of the standalone server: echoes the geolocation
/// headers the middleware attached to the request. Absent headers are
/// omitted from the body.
pub struct InspectService;

impl InspectService {
    pub async fn inspect(req: HttpRequest) -> impl Responder {
        let body = geoip_headers_json(&req);
        trace!("Inspect request for {}: {} geoip headers", req.path(), body.len());
        HttpResponse::Ok().json(Value::Object(body))
    }
}

fn geoip_headers_json(req: &HttpRequest) -> Map<String, Value> {
    GEOIP_HEADERS
        .iter()
        .filter_map(|name| {
            let value = req.headers().get(*name)?;
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            Some((name.to_string(), Value::String(value)))
        })
        .collect()
}

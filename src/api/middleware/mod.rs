pub mod geoip;

pub use geoip::{
    Annotation, GEOIP_HEADERS, GeoIpHeaders, GeoIpHeadersService, X_GEOIP_CITY, X_GEOIP_COUNTRY,
    X_GEOIP_COUNTRY_CODE, X_GEOIP_GEOHASH, X_GEOIP_LATITUDE, X_GEOIP_LONGITUDE, X_GEOIP_REGION,
    clear_geoip_headers,
};

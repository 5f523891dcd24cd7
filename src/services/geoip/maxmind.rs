//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 MaxMind `.mmdb` 文件进行 IP 地理位置查询。City and Country
//! databases share one decode path: records are decoded as GeoIP2 City,
//! whose nested sections default to empty when the database lacks them.

use std::net::IpAddr;
use std::path::Path;

use maxminddb::{Reader, geoip2};
use tracing::{debug, trace};

use super::provider::{GeoIpLookup, GeoRecord};
use crate::errors::{GeoHeadersError, Result};

/// MaxMind GeoIP Provider
pub struct MaxMindProvider {
    reader: Reader<Vec<u8>>,
}

impl MaxMindProvider {
    /// 从文件路径创建 MaxMind Provider
    pub fn open(path: &str) -> Result<Self> {
        if !Path::new(path).is_file() {
            return Err(GeoHeadersError::database_not_found(format!(
                "GeoIP database \"{}\" does not exist",
                path
            )));
        }

        let reader = Reader::open_readfile(path).map_err(|e| {
            GeoHeadersError::invalid_database(format!(
                "\"{}\" is not a valid MaxMind database: {}",
                path, e
            ))
        })?;

        debug!(
            "GeoIP: Loaded {} database (build epoch {})",
            reader.metadata.database_type, reader.metadata.build_epoch
        );

        Ok(Self { reader })
    }

    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }
}

impl GeoIpLookup for MaxMindProvider {
    fn lookup(&self, ip: IpAddr) -> Result<Option<GeoRecord>> {
        let result = self.reader.lookup(ip)?;
        let Some(city) = result.decode::<geoip2::City>()? else {
            trace!("MaxMind lookup for {}: not found", ip);
            return Ok(None);
        };

        let record = record_from_city(&city);

        trace!(
            "MaxMind lookup for {}: country={:?}, region={:?}, city={:?}",
            ip, record.country_code, record.region, record.city
        );

        Ok(Some(record))
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}

fn record_from_city(city: &geoip2::City<'_>) -> GeoRecord {
    GeoRecord {
        country: city.country.names.english.map(String::from),
        country_code: city.country.iso_code.map(String::from),
        region: city
            .subdivisions
            .first()
            .and_then(|s| s.iso_code)
            .map(String::from),
        city: city.city.names.english.map(String::from),
        latitude: city.location.latitude,
        longitude: city.location.longitude,
    }
}

//! GeoIP Provider 抽象层
//!
//! 统一的 GeoIP 查询接口：
//! - `GeoIpLookup`: point lookup contract of a geolocation engine
//! - `GeoIpProvider`: cheap-to-clone handle shared by every request worker
//!
//! The engine is opened exactly once; the handle only hands out shared
//! read access, and the engine is released when the last handle drops.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::info;

use super::maxmind::MaxMindProvider;
use crate::errors::Result;
use crate::utils::geohash;

/// 地理位置信息
///
/// Snapshot of one lookup. Every field is independently optional: a
/// country database fills only the country fields, and city databases
/// still miss subdivisions or names for some ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoRecord {
    /// Country name (English)
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 国家代码 (e.g., "DE", "US")
    pub country_code: Option<String>,
    /// ISO code of the most general subdivision (e.g., "BY")
    pub region: Option<String>,
    /// 城市名称
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoRecord {
    /// Both coordinates, or nothing.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Geohash of the coordinates; never computed from partial coordinates.
    pub fn geohash(&self) -> Option<String> {
        self.coordinates()
            .map(|(lat, lng)| geohash::encode(lat, lng))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// GeoIP 查询 trait
///
/// Implementations must answer concurrent lookups from any worker thread
/// without external locking.
pub trait GeoIpLookup: Send + Sync {
    /// `Ok(None)` is a miss (valid address, no record); `Err` is a read
    /// failure on the database itself.
    fn lookup(&self, ip: IpAddr) -> Result<Option<GeoRecord>>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 统一 GeoIP Provider
pub struct GeoIpProvider {
    inner: Arc<dyn GeoIpLookup>,
}

impl GeoIpProvider {
    /// Open a MaxMind database file. Fails if the file is missing or is not
    /// a MaxMind database; there is no lazy or retried opening.
    pub fn open(path: &str) -> Result<Self> {
        let provider = MaxMindProvider::open(path)?;
        info!("GeoIP: Using MaxMind database at {}", path);
        Ok(Self::from_lookup(provider))
    }

    /// Wrap any lookup engine.
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: GeoIpLookup + 'static,
    {
        Self {
            inner: Arc::new(lookup),
        }
    }

    /// 查询 IP 地址的地理位置
    pub fn lookup(&self, ip: IpAddr) -> Result<Option<GeoRecord>> {
        self.inner.lookup(ip)
    }

    /// 获取当前使用的 provider 名称
    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

impl Clone for GeoIpProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for GeoIpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIpProvider")
            .field("provider", &self.inner.name())
            .finish()
    }
}

//! GeoIP 服务模块
//!
//! 提供 IP 地址地理位置查询功能，支持：
//! - MaxMind GeoLite2 / GeoIP2 本地数据库 (City or Country)
//! - 内存表 (CIDR → record)

mod maxmind;
mod memory;
mod provider;

pub use maxmind::MaxMindProvider;
pub use memory::MemoryProvider;
pub use provider::{GeoIpLookup, GeoIpProvider, GeoRecord};

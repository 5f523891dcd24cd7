//! IP 地址处理工具
//!
//! Client address handling for the GeoIP middleware:
//! - candidate extraction (forwarding header chain, then the direct peer address)
//! - CIDR exclusion blocks
//!
//! The candidate is kept as a string until it is used: a candidate that is not
//! an IP is never excluded and simply fails the lookup later.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use actix_web::http::header::{HeaderMap, HeaderName};

use crate::errors::{GeoHeadersError, Result};

/// Split a `host:port` string on its last colon and return the host.
///
/// Bracketed IPv6 hosts (`[2001:db8::1]:443`) are unwrapped. An address
/// without any colon cannot be split and is reported as a parse failure.
pub fn split_host_port(addr: &str) -> Result<&str> {
    let Some((host, _port)) = addr.rsplit_once(':') else {
        return Err(GeoHeadersError::address_parse(format!(
            "missing port in address \"{}\"",
            addr
        )));
    };

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    Ok(host)
}

/// 从 HeaderMap 提取转发的 IP
///
/// Headers are consulted in the given order. For each, the first
/// comma-separated entry (the original client) is taken; an empty entry
/// moves on to the next header.
pub fn extract_forwarded_ip_from_headers(
    headers: &HeaderMap,
    forwarded_headers: &[HeaderName],
) -> Option<String> {
    forwarded_headers.iter().find_map(|name| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

/// Pick the single candidate client IP for a request.
///
/// A usable forwarding header always wins over the direct peer address.
pub fn extract_candidate_ip(
    remote_addr: &str,
    headers: &HeaderMap,
    forwarded_headers: &[HeaderName],
) -> Result<String> {
    if let Some(forwarded) = extract_forwarded_ip_from_headers(headers, forwarded_headers) {
        return Ok(forwarded);
    }

    split_host_port(remote_addr).map(String::from)
}

/// A CIDR block. Bare addresses are single-host blocks (/32 or /128).
///
/// IPv4-mapped IPv6 (`::ffff:a.b.c.d`) is treated as the IPv4 address it
/// carries, both for blocks and for the addresses tested against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpBlock {
    network: IpAddr,
    prefix_len: u8,
}

impl IpBlock {
    pub fn new(network: IpAddr, prefix_len: u8) -> Result<Self> {
        let max = max_prefix_len(&network);
        if prefix_len > max {
            return Err(GeoHeadersError::config(format!(
                "prefix length /{} exceeds /{} for {}",
                prefix_len, max, network
            )));
        }
        let (network, prefix_len) = match network {
            IpAddr::V6(v6) if prefix_len >= 96 => match v6.to_ipv4_mapped() {
                Some(v4) => (IpAddr::V4(v4), prefix_len - 96),
                None => (network, prefix_len),
            },
            _ => (network, prefix_len),
        };

        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// CIDR 检查
    pub fn contains(&self, ip: &IpAddr) -> bool {
        let ip = match (ip, self.network) {
            (IpAddr::V6(v6), IpAddr::V4(_)) => match v6.to_ipv4_mapped() {
                Some(v4) => IpAddr::V4(v4),
                None => return false,
            },
            _ => *ip,
        };

        match (&ip, self.network) {
            (IpAddr::V4(ip), IpAddr::V4(net)) => {
                let mask = u32::MAX
                    .checked_shl(32 - self.prefix_len as u32)
                    .unwrap_or(0);
                let ip_bits = u32::from_be_bytes(ip.octets());
                let net_bits = u32::from_be_bytes(net.octets());
                (ip_bits & mask) == (net_bits & mask)
            }
            (IpAddr::V6(ip), IpAddr::V6(net)) => {
                let mask = u128::MAX
                    .checked_shl(128 - self.prefix_len as u32)
                    .unwrap_or(0);
                let ip_bits = u128::from_be_bytes(ip.octets());
                let net_bits = u128::from_be_bytes(net.octets());
                (ip_bits & mask) == (net_bits & mask)
            }
            _ => false, // IPv4 vs IPv6 不匹配
        }
    }
}

fn max_prefix_len(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

impl FromStr for IpBlock {
    type Err = GeoHeadersError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || GeoHeadersError::config(format!("invalid IP or CIDR \"{}\"", s));

        match s.split_once('/') {
            Some((network, prefix_len)) => {
                let network: IpAddr = network.parse().map_err(|_| invalid())?;
                let prefix_len: u8 = prefix_len.parse().map_err(|_| invalid())?;
                IpBlock::new(network, prefix_len)
            }
            None => {
                let network: IpAddr = s.parse().map_err(|_| invalid())?;
                let prefix_len = max_prefix_len(&network);
                IpBlock::new(network, prefix_len)
            }
        }
    }
}

impl fmt::Display for IpBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Configured exclusion blocks, parsed once at construction.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    blocks: Vec<IpBlock>,
}

impl ExclusionList {
    /// Parse the configured entries, keeping order.
    ///
    /// Malformed entries are skipped and handed back to the caller together
    /// with the reason, so one bad entry never disables the others.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> (Self, Vec<(String, GeoHeadersError)>) {
        let mut blocks = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();

        for entry in entries {
            let entry = entry.as_ref();
            match entry.parse::<IpBlock>() {
                Ok(block) => blocks.push(block),
                Err(e) => rejected.push((entry.to_string(), e)),
            }
        }

        (Self { blocks }, rejected)
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.blocks.iter().any(|block| block.contains(ip))
    }

    /// A candidate that does not parse as an IP is not excluded.
    pub fn is_excluded(&self, candidate: &str) -> bool {
        match candidate.parse::<IpAddr>() {
            Ok(ip) => self.contains(&ip),
            Err(_) => false,
        }
    }

    pub fn blocks(&self) -> &[IpBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

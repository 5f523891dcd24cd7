//! In-memory GeoIP table
//!
//! A lookup engine backed by a list of CIDR blocks. Useful for fixed
//! internal ranges and for exercising the middleware without a database
//! file. The first matching block wins.

use std::net::IpAddr;

use super::provider::{GeoIpLookup, GeoRecord};
use crate::errors::Result;
use crate::utils::ip::IpBlock;

#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    entries: Vec<(IpBlock, GeoRecord)>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: IpBlock, record: GeoRecord) {
        self.entries.push((block, record));
    }

    /// Builder-style insert.
    pub fn with(mut self, block: IpBlock, record: GeoRecord) -> Self {
        self.insert(block, record);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoIpLookup for MemoryProvider {
    fn lookup(&self, ip: IpAddr) -> Result<Option<GeoRecord>> {
        Ok(self
            .entries
            .iter()
            .find(|(block, _)| block.contains(&ip))
            .map(|(_, record)| record.clone()))
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}

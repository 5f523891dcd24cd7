pub mod geohash;
pub mod ip;

pub use geohash::{GEOHASH_PRECISION, encode as encode_geohash};
pub use ip::{ExclusionList, IpBlock, extract_candidate_ip, split_host_port};

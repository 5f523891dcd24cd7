mod structs;
pub mod validators;

pub use structs::*;
pub use validators::{parse_forwarded_headers, validate_config, validate_geoip_config};

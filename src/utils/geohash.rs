//! Geohash encoding
//!
//! Coordinates are quantized to 32 bits per axis and interleaved
//! (longitude first), then the top `5 * precision` bits are emitted in the
//! geohash base-32 alphabet. Integer quantization keeps the output
//! byte-for-byte stable for identical inputs.

/// Default precision, in characters.
pub const GEOHASH_PRECISION: usize = 12;

/// Longest hash representable by the 64 interleaved bits.
pub const MAX_PRECISION: usize = 12;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encode a coordinate pair at the default precision.
pub fn encode(latitude: f64, longitude: f64) -> String {
    encode_with_precision(latitude, longitude, GEOHASH_PRECISION)
}

/// Encode a coordinate pair into `precision` characters (clamped to 1..=12).
pub fn encode_with_precision(latitude: f64, longitude: f64, precision: usize) -> String {
    let precision = precision.clamp(1, MAX_PRECISION);
    let bits = 5 * precision as u32;
    let mut hash = encode_int(latitude, longitude) >> (64 - bits);

    let mut out = vec![0u8; precision];
    for slot in out.iter_mut().rev() {
        *slot = BASE32[(hash & 0x1f) as usize];
        hash >>= 5;
    }

    // Only alphabet bytes are written
    out.into_iter().map(char::from).collect()
}

/// 64-bit interleaved hash: longitude bits on odd positions, latitude on even.
fn encode_int(latitude: f64, longitude: f64) -> u64 {
    let lat = quantize(latitude, 90.0);
    let lng = quantize(longitude, 180.0);
    spread(lat) | (spread(lng) << 1)
}

/// Map `[-range, range]` onto `[0, 2^32)`. Float-to-int casts saturate, so
/// out-of-range input pins to the nearest edge and NaN maps to zero.
fn quantize(value: f64, range: f64) -> u32 {
    let p = (value + range) / (2.0 * range);
    (p * 4_294_967_296.0) as u32
}

/// Spread the 32 bits of `x` onto the even bit positions of a u64.
fn spread(x: u32) -> u64 {
    let mut x = x as u64;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

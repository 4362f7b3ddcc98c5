//! Frame duration quantization.
//!
//! Frame durations are stored in a single byte: the top two bits select one
//! of four granularity buckets and the low six bits hold the magnitude in
//! bucket units. The bucket table was recovered from empirical measurements
//! against real hardware and is kept bit-exact even though parts of it are
//! still not fully understood; images re-encoded with a different table play
//! back at the wrong speed.
//!
//! The transform is lossy and non-injective: `decode(encode(ms))` reproduces
//! `ms` only when `ms` is an exact multiple of its bucket's granularity and
//! within range. Everything else is silently rounded down.

/// Duration buckets as `(granularity_ms, max_representable_ms)`, selected by
/// the top two bits of the encoded byte.
pub const DURATION_BUCKETS: [(u32, u32); 4] = [(2, 126), (10, 630), (100, 6300), (1000, 63000)];

/// Encoded byte emitted when a duration exceeds every bucket (decodes to 30 ms)
pub const FALLBACK_ENCODED: u8 = 0x0F;

/// Low six bits of the encoded byte hold the magnitude
const MAGNITUDE_MASK: u8 = 0x3F;

/// Encodes a millisecond duration into one byte.
///
/// The smallest bucket whose granularity can represent the truncated
/// magnitude in six bits is selected; durations beyond the largest bucket
/// collapse to [`FALLBACK_ENCODED`].
///
/// # Examples
///
/// ```
/// use rundmd_types::file::dmd::duration;
///
/// assert_eq!(duration::decode(duration::encode(500)), 500);
/// // 95 ms is not a multiple of the 2 ms granularity and rounds down
/// assert_eq!(duration::decode(duration::encode(95)), 94);
/// ```
pub fn encode(duration_ms: u32) -> u8 {
	for (bucket, (granularity, _)) in DURATION_BUCKETS.iter().enumerate() {
		let magnitude = duration_ms / granularity;
		if magnitude <= u32::from(MAGNITUDE_MASK) {
			return ((bucket as u8) << 6) | (magnitude as u8);
		}
	}
	FALLBACK_ENCODED
}

/// Decodes an encoded duration byte back to milliseconds.
pub fn decode(encoded: u8) -> u32 {
	let (granularity, _) = DURATION_BUCKETS[usize::from(encoded >> 6)];
	u32::from(encoded & MAGNITUDE_MASK) * granularity
}

pub mod texture;

/// Converts a 4-byte string into a 32-bit little endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! rtag4 {
	($b4: literal) => {
		u32::from_le_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Divides `x` by `d`, rounding up
pub const fn div_round_up(x: u64, d: u64) -> u64 {
	(x + d - 1) / d
}

/// Rounds `x` up to the next multiple of `d`
pub const fn round_up(x: u64, d: u64) -> u64 {
	div_round_up(x, d) * d
}

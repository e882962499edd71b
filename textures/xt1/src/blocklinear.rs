//! Block linear (GOB tiled) surface addressing for the Tegra X1.
//!
//! A GOB is 64 bytes wide and 8 rows tall. GOBs are stacked vertically into blocks
//! of `block_height` GOBs, and blocks are laid out left to right, then top to bottom.
//! All coordinates here are in texel blocks, not pixels.

use rgk_core::div_round_up;
use tegra_swizzle::BlockHeight;
use thiserror::Error;

pub const GOB_WIDTH_IN_BYTES: u64 = 64;
pub const GOB_HEIGHT_IN_ROWS: u64 = 8;
pub const GOB_SIZE_IN_BYTES: u64 = 512;

/// Width padding used by the wide ASTC block sizes
pub const SPECIAL_PAD: u32 = 0x20;

/// Largest supported GOB block height, as a power of two
pub const MAX_BLOCK_HEIGHT_LOG2: u8 = 5;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TilingError {
	#[error("Block at offset {offset} overruns a {length} byte buffer")]
	OutOfBounds {
		offset: u64,
		length: usize,
	},
	#[error("Surface dimensions overflow")]
	Overflow,
}

/// Returns the byte offset of block `(x, y)` within a tiled surface `width` blocks wide.
///
/// A `special_pad` of 0 disables width padding.
pub const fn block_offset(x: u32, y: u32, width: u32, bytes_per_block: u32, block_height: u32,
	special_pad: u32) -> u64
{
	let (x, y) = (x as u64, y as u64);
	let bpb = bytes_per_block as u64;
	let block_height = block_height as u64;
	let gob_rows = GOB_HEIGHT_IN_ROWS * block_height;

	let gob_offset = (y / gob_rows) * GOB_SIZE_IN_BYTES * block_height * width_in_gobs(width, bytes_per_block, special_pad)
		+ ((x * bpb) / GOB_WIDTH_IN_BYTES) * GOB_SIZE_IN_BYTES * block_height
		+ ((y % gob_rows) / GOB_HEIGHT_IN_ROWS) * GOB_SIZE_IN_BYTES;

	let xb = x * bpb;
	gob_offset
		+ ((xb % 64) / 32) * 256
		+ ((y % 8) / 2) * 64
		+ ((xb % 32) / 16) * 32
		+ (y % 2) * 16
		+ (xb % 16)
}

/// Number of GOBs spanning one row of blocks, after padding the width
const fn width_in_gobs(width: u32, bytes_per_block: u32, special_pad: u32) -> u64 {
	let pad = if special_pad == 0 { 1 } else { special_pad as u64 };
	let padded = div_round_up(width as u64, pad) * pad;
	div_round_up(padded * bytes_per_block as u64, GOB_WIDTH_IN_BYTES)
}

/// Tiling parameters for a single 2D surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLinear {
	/// Width in blocks
	pub width: u32,
	/// Height in blocks
	pub height: u32,
	pub bytes_per_block: u32,
	/// GOB block height; always a power of two
	pub block_height: u32,
	pub special_pad: u32,
}

impl BlockLinear {
	pub fn new(width: u32, height: u32, bytes_per_block: u32, block_height: u32, special_pad: u32) -> BlockLinear {
		BlockLinear {
			width: width,
			height: height,
			bytes_per_block: bytes_per_block,
			block_height: block_height,
			special_pad: special_pad,
		}
	}

	/// Byte offset of block `(x, y)` within the tiled surface
	pub fn offset(&self, x: u32, y: u32) -> u64 {
		block_offset(x, y, self.width, self.bytes_per_block, self.block_height, self.special_pad)
	}

	/// Size of the untiled surface in bytes
	pub fn linear_size(&self) -> Result<usize, TilingError> {
		(self.width as usize)
			.checked_mul(self.height as usize)
			.and_then(|n| n.checked_mul(self.bytes_per_block as usize))
			.ok_or(TilingError::Overflow)
	}

	/// Size of the tiled surface in bytes, including GOB padding
	pub fn tiled_size(&self) -> Result<usize, TilingError> {
		let block_height = self.block_height as u64;
		let height_in_blocks = div_round_up(self.height as u64, GOB_HEIGHT_IN_ROWS * block_height);

		width_in_gobs(self.width, self.bytes_per_block, self.special_pad)
			.checked_mul(GOB_SIZE_IN_BYTES * block_height)
			.and_then(|n| n.checked_mul(height_in_blocks))
			.and_then(|n| usize::try_from(n).ok())
			.ok_or(TilingError::Overflow)
	}

	/// Converts a tiled surface into tightly packed rows of blocks
	pub fn untile(&self, source: &[u8]) -> Result<Vec<u8>, TilingError> {
		let size = self.linear_size()?;

		// every block occupies a distinct range of the source, so anything shorter is truncated
		if size > source.len() {
			return Err(TilingError::OutOfBounds {
				offset: size as u64,
				length: source.len(),
			});
		}

		let mut dest = vec![0; size];
		self.copy_blocks(|linear, tiled| {
			let src = checked_range(tiled, self.bytes_per_block, source.len())?;
			dest[linear..linear + self.bytes_per_block as usize].copy_from_slice(&source[src]);
			Ok(())
		})?;

		Ok(dest)
	}

	/// Converts tightly packed rows of blocks into a tiled surface
	pub fn tile(&self, source: &[u8]) -> Result<Vec<u8>, TilingError> {
		let linear_size = self.linear_size()?;
		if linear_size > source.len() {
			return Err(TilingError::OutOfBounds {
				offset: linear_size as u64,
				length: source.len(),
			});
		}

		let mut dest = vec![0; self.tiled_size()?];
		let dest_len = dest.len();
		self.copy_blocks(|linear, tiled| {
			let dst = checked_range(tiled, self.bytes_per_block, dest_len)?;
			dest[dst].copy_from_slice(&source[linear..linear + self.bytes_per_block as usize]);
			Ok(())
		})?;

		Ok(dest)
	}

	/// Visits every block with its linear and tiled offsets
	fn copy_blocks<F>(&self, mut copy: F) -> Result<(), TilingError>
	where
		F: FnMut(usize, u64) -> Result<(), TilingError>,
	{
		let bpb = self.bytes_per_block as usize;

		for y in 0..self.height {
			for x in 0..self.width {
				let linear = ((y as usize * self.width as usize) + x as usize) * bpb;
				copy(linear, self.offset(x, y))?;
			}
		}

		Ok(())
	}
}

fn checked_range(offset: u64, bytes_per_block: u32, length: usize) -> Result<std::ops::Range<usize>, TilingError> {
	let end = offset + bytes_per_block as u64;
	if end > length as u64 {
		return Err(TilingError::OutOfBounds {
			offset: offset,
			length: length,
		});
	}

	Ok(offset as usize..end as usize)
}

/// Largest GOB block height usable for a surface `height` blocks tall, as a power of two
pub fn max_block_height_log2(height: u32) -> u8 {
	match tegra_swizzle::block_height_mip0(height) {
		BlockHeight::One => 0,
		BlockHeight::Two => 1,
		BlockHeight::Four => 2,
		BlockHeight::Eight => 3,
		BlockHeight::Sixteen => 4,
		BlockHeight::ThirtyTwo => 5,
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	use std::collections::HashSet;

	use super::*;

	fn pattern(len: usize) -> Vec<u8> {
		(0..len).map(|i| (i * 7 + i / 251) as u8).collect()
	}

	#[test]
	fn test_block_offsets() {
		// 4 blocks of 16 bytes fill exactly one GOB row
		assert_eq!(block_offset(0, 0, 4, 16, 1, 0), 0);
		assert_eq!(block_offset(1, 0, 4, 16, 1, 0), 32);
		assert_eq!(block_offset(2, 0, 4, 16, 1, 0), 256);
		assert_eq!(block_offset(3, 0, 4, 16, 1, 0), 288);
		assert_eq!(block_offset(0, 1, 4, 16, 1, 0), 16);
		assert_eq!(block_offset(0, 2, 4, 16, 1, 0), 64);
		assert_eq!(block_offset(0, 7, 4, 16, 1, 0), 208);
		assert_eq!(block_offset(0, 8, 4, 16, 1, 0), 512);

		// next GOB in the same block is stacked below
		assert_eq!(block_offset(0, 8, 4, 16, 2, 0), 512);
		assert_eq!(block_offset(0, 16, 4, 16, 2, 0), 1024);
		assert_eq!(block_offset(4, 0, 8, 16, 2, 0), 1024);
	}

	#[test]
	fn test_special_pad_widens_rows() {
		// 5 blocks pad out to 32 blocks = 8 GOBs per row
		assert_eq!(block_offset(0, 8, 5, 16, 1, 0), 2 * 512);
		assert_eq!(block_offset(0, 8, 5, 16, 1, SPECIAL_PAD), 8 * 512);

		// padding never moves blocks within the first row of GOBs
		for x in 0..5 {
			assert_eq!(block_offset(x, 3, 5, 16, 1, 0), block_offset(x, 3, 5, 16, 1, SPECIAL_PAD));
		}
	}

	#[test]
	fn test_sizes() {
		let surface = BlockLinear::new(4, 4, 16, 1, 0);
		assert_eq!(surface.linear_size(), Ok(256));
		assert_eq!(surface.tiled_size(), Ok(512));

		let surface = BlockLinear::new(5, 17, 16, 2, SPECIAL_PAD);
		assert_eq!(surface.tiled_size(), Ok(8 * 512 * 2 * 2));

		let surface = BlockLinear::new(0, 0, 16, 1, 0);
		assert_eq!(surface.linear_size(), Ok(0));
		assert_eq!(surface.tiled_size(), Ok(0));
	}

	#[rstest]
	#[case(1, 1, 1, 1, 0)]
	#[case(4, 4, 1, 1, 0)]
	#[case(7, 13, 4, 2, 0)]
	#[case(64, 64, 16, 16, 0)]
	#[case(33, 9, 8, 4, 0)]
	#[case(5, 5, 16, 1, SPECIAL_PAD)]
	#[case(17, 40, 16, 8, SPECIAL_PAD)]
	#[case(64, 3, 4, 2, SPECIAL_PAD)]
	fn test_offsets_injective_and_in_bounds(#[case] width: u32, #[case] height: u32, #[case] bpb: u32,
		#[case] block_height: u32, #[case] special_pad: u32)
	{
		let surface = BlockLinear::new(width, height, bpb, block_height, special_pad);
		let size = surface.tiled_size().unwrap() as u64;
		let mut seen = HashSet::new();

		for y in 0..height {
			for x in 0..width {
				let offset = surface.offset(x, y);
				assert!(offset + bpb as u64 <= size, "({}, {}) at {} exceeds {}", x, y, offset, size);
				assert_eq!(offset % bpb as u64, 0);
				assert!(seen.insert(offset), "({}, {}) collides at {}", x, y, offset);
			}
		}
	}

	#[test]
	fn test_tile_round_trip() {
		let dims = [1, 2, 3, 7, 8, 15, 16, 31, 33, 64];

		for &width in dims.iter() {
			for &height in dims.iter() {
				for &bpb in [1, 4, 8, 16].iter() {
					for &block_height in [1, 2, 4, 8, 16].iter() {
						for &special_pad in [0, SPECIAL_PAD].iter() {
							let surface = BlockLinear::new(width, height, bpb, block_height, special_pad);
							let linear = pattern(surface.linear_size().unwrap());
							let tiled = surface.tile(&linear).unwrap();

							assert_eq!(tiled.len(), surface.tiled_size().unwrap());
							assert_eq!(surface.untile(&tiled).unwrap(), linear, "{:?}", surface);
						}
					}
				}
			}
		}
	}

	#[test]
	fn test_zero_pad_matches_default_path() {
		// a pad of 1 is the same as no padding at all
		let a = BlockLinear::new(19, 23, 8, 2, 0);
		let b = BlockLinear::new(19, 23, 8, 2, 1);
		let linear = pattern(a.linear_size().unwrap());

		assert_eq!(a.tile(&linear).unwrap(), b.tile(&linear).unwrap());
	}

	#[test]
	fn test_untile_truncated() {
		let surface = BlockLinear::new(4, 4, 1, 1, 0);

		// large enough for every block in linear order, but not for the tiled addresses
		let err = surface.untile(&[0; 16]).unwrap_err();
		assert!(matches!(err, TilingError::OutOfBounds { length: 16, .. }));

		let err = surface.untile(&[0; 8]).unwrap_err();
		assert_eq!(err, TilingError::OutOfBounds { offset: 16, length: 8 });

		// the last block sits at offset 83
		assert!(surface.untile(&[0; 83]).is_err());
		assert!(surface.untile(&[0; 84]).is_ok());
	}

	#[test]
	fn test_tile_short_source() {
		let surface = BlockLinear::new(4, 4, 16, 1, 0);
		assert!(surface.tile(&[0; 255]).is_err());
	}

	#[test]
	fn test_max_block_height() {
		assert_eq!(max_block_height_log2(1), 0);
		assert_eq!(max_block_height_log2(1024), 4);
		assert!(max_block_height_log2(100) <= MAX_BLOCK_HEIGHT_LOG2);
	}
}

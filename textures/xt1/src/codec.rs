//! Pixel codec seam.
//!
//! Block compressed and ASTC data is decompressed by whatever codec the host provides.
//! Raw formats are handled here.

use rgk_core::texture::{
	rgba8_size,
	RGBA8_PIXEL_SIZE
};

use crate::format::{
	BCFormat,
	RawFormat
};

/// Alpha written for formats without an alpha channel
pub const OPAQUE: u8 = 0xFF;

/// External block codecs. Every method returns `None` when the codec can't handle the request.
///
/// Block data is always untiled, tightly packed rows of blocks, and pixel data is RGBA8.
pub trait BlockCodec {
	fn decode_bc(&self, _blocks: &[u8], _width: u32, _height: u32, _format: BCFormat) -> Option<Vec<u8>> {
		None
	}

	fn encode_bc(&self, _rgba: &[u8], _width: u32, _height: u32, _format: BCFormat) -> Option<Vec<u8>> {
		None
	}

	fn decode_astc(&self, _blocks: &[u8], _block_width: u32, _block_height: u32, _block_depth: u32,
		_width: u32, _height: u32, _depth: u32) -> Option<Vec<u8>>
	{
		None
	}

	fn encode_astc(&self, _rgba: &[u8], _block_width: u32, _block_height: u32, _block_depth: u32,
		_width: u32, _height: u32, _depth: u32) -> Option<Vec<u8>>
	{
		None
	}
}

/// A codec that supports nothing beyond the raw formats
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCodec;

impl BlockCodec for NoCodec {}

/// Expands raw texels to RGBA8. R8 is replicated across the color channels.
pub fn decode_raw(texels: &[u8], width: u32, height: u32, format: RawFormat) -> Option<Vec<u8>> {
	let count = width as usize * height as usize;

	match format {
		RawFormat::R8 => {
			let texels = texels.get(..count)?;
			let mut rgba = Vec::with_capacity(rgba8_size(width, height));

			for &v in texels.iter() {
				rgba.extend_from_slice(&[v, v, v, OPAQUE]);
			}

			Some(rgba)
		}
		RawFormat::R8G8B8A8 => texels.get(..count * RGBA8_PIXEL_SIZE).map(|t| t.to_vec()),
	}
}

/// Packs RGBA8 pixels into raw texels. R8 keeps the red channel.
pub fn encode_raw(rgba: &[u8], width: u32, height: u32, format: RawFormat) -> Option<Vec<u8>> {
	let rgba = rgba.get(..rgba8_size(width, height))?;

	match format {
		RawFormat::R8 => Some(rgba.chunks_exact(RGBA8_PIXEL_SIZE).map(|p| p[0]).collect()),
		RawFormat::R8G8B8A8 => Some(rgba.to_vec()),
	}
}

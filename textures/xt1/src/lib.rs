//! XT1 textures, as found in Tegra X1 game assets.
//!
//! An XT1 file is a 56 byte header followed by a single block linear (GOB tiled) surface.
//! Untiling and tiling are handled here. Pixel codecs for BC and ASTC data come from the host
//! through [`codec::BlockCodec`].

pub mod blocklinear;
pub mod codec;
pub mod dds;
pub mod format;
pub mod header;

use std::io;
use thiserror::Error;

use byteorder::WriteBytesExt;

use rgk_core::texture::{
	rgba8_size,
	Texture
};

use blocklinear::{
	BlockLinear,
	TilingError
};

use codec::BlockCodec;
use format::{Codec, FormatEntry};
use header::Header;

#[cfg(feature = "export")]
use blocklinear::{
	max_block_height_log2,
	SPECIAL_PAD
};

#[cfg(feature = "export")]
use format::{
	DEFAULT_FORMAT,
	Options,
	resolve_format
};

#[cfg(feature = "export")]
use header::Flags;

#[derive(Clone, Debug, PartialEq)]
pub struct XT1Texture {
	pub header: Header,
	/// Tiled payload, `header.texture_size` bytes long
	pub data: Vec<u8>,
}

impl XT1Texture {
	/// Parses the header and copies out the payload it describes
	#[cfg(feature = "import")]
	pub fn read(data: &[u8]) -> Result<XT1Texture, XT1ImportError> {
		let header = Header::read(&mut &data[..])?;

		let start = header.header_size as u64;
		let end = start.checked_add(header.texture_size).unwrap_or(u64::MAX);
		if end > data.len() as u64 {
			return Err(XT1ImportError::TruncatedPayload {
				offset: end,
				length: data.len(),
			});
		}

		if header.num_mipmaps != 1 || header.depth != 1 {
			log::warn!("XT1 texture has {} mipmaps and depth {}, only the first 2D surface is read",
				header.num_mipmaps, header.depth);
		}

		Ok(XT1Texture {
			header: header,
			data: data[start as usize..end as usize].to_vec(),
		})
	}

	/// Catalog entry for this texture's format id
	#[cfg(feature = "import")]
	pub fn format(&self) -> Result<&'static FormatEntry, XT1ImportError> {
		format::lookup(self.header.format).ok_or_else(|| {
			log::warn!("Unsupported XT1 format id: {:#x}", self.header.format);
			XT1ImportError::UnsupportedFormat(self.header.format)
		})
	}

	#[cfg(feature = "import")]
	fn surface(&self, entry: &FormatEntry) -> Result<BlockLinear, XT1ImportError> {
		let block_height = self.header.gob_block_height()
			.ok_or(XT1ImportError::BlockHeight(self.header.block_height_log2))?;

		let surface = BlockLinear::new(
			entry.width_in_blocks(self.header.width),
			entry.height_in_blocks(self.header.height),
			entry.bytes_per_block,
			block_height,
			self.header.tiling_pad(),
		);

		log::debug!("Untiling {}x{} blocks, block height {}, special pad {}", surface.width, surface.height,
			surface.block_height, surface.special_pad);

		Ok(surface)
	}

	/// Returns the payload as tightly packed rows of blocks
	#[cfg(feature = "import")]
	pub fn untile(&self) -> Result<Vec<u8>, XT1ImportError> {
		let entry = self.format()?;
		Ok(self.surface(entry)?.untile(&self.data)?)
	}

	/// Untiles and decompresses the texture to RGBA8
	#[cfg(feature = "import")]
	pub fn decode<C>(&self, codec: &C) -> Result<Texture, XT1ImportError>
	where
		C: BlockCodec + ?Sized,
	{
		let entry = self.format()?;
		let blocks = self.surface(entry)?.untile(&self.data)?;
		let (width, height) = (self.header.width, self.header.height);

		let pixels = match entry.codec {
			Codec::Raw(raw) => codec::decode_raw(&blocks, width, height, raw),
			Codec::BC(bc) => codec.decode_bc(&blocks, width, height, bc),
			Codec::ASTC => codec.decode_astc(&blocks, entry.block_width, entry.block_height, 1, width, height, 1),
		};

		let pixels = pixels.ok_or_else(|| {
			log::warn!("No decoder available for format: {}", entry.full_name());
			XT1ImportError::CodecUnavailable(entry.name)
		})?;

		let got = pixels.len();
		Texture::from_rgba(width, height, pixels).ok_or(XT1ImportError::CodecOutput {
			expected: rgba8_size(width, height),
			got: got,
		})
	}

	/// Compresses an RGBA8 texture in the format selected by `options`
	#[cfg(feature = "export")]
	pub fn encode<C>(tex: &Texture, options: Options, codec: &C) -> Result<XT1Texture, XT1ExportError>
	where
		C: BlockCodec + ?Sized,
	{
		if tex.pixels.len() != rgba8_size(tex.width, tex.height) {
			return Err(XT1ExportError::Dimensions);
		}

		let entry = match format::lookup(resolve_format(options)) {
			Some(entry) => entry,
			None => {
				log::warn!("Could not determine texture format, defaulting to ASTC_8x8_UNORM");
				format::lookup(DEFAULT_FORMAT).ok_or(XT1ExportError::UnsupportedFormat(DEFAULT_FORMAT))?
			}
		};

		let blocks = match entry.codec {
			Codec::Raw(raw) => codec::encode_raw(&tex.pixels, tex.width, tex.height, raw),
			Codec::BC(bc) => codec.encode_bc(&tex.pixels, tex.width, tex.height, bc),
			Codec::ASTC => codec.encode_astc(&tex.pixels, entry.block_width, entry.block_height, 1,
				tex.width, tex.height, 1),
		};

		let blocks = blocks.ok_or_else(|| {
			log::warn!("No encoder available for format: {}", entry.full_name());
			XT1ExportError::CodecUnavailable(entry.name)
		})?;

		XT1Texture::from_blocks(entry.id, tex.width, tex.height, &blocks)
	}

	/// Tiles already compressed blocks into a new texture.
	///
	/// The wide ASTC sizes are tiled with [`SPECIAL_PAD`], everything else without padding.
	#[cfg(feature = "export")]
	pub fn from_blocks(format_id: u32, width: u32, height: u32, blocks: &[u8]) -> Result<XT1Texture, XT1ExportError> {
		let entry = format::lookup(format_id).ok_or(XT1ExportError::UnsupportedFormat(format_id))?;

		let height_in_blocks = entry.height_in_blocks(height);
		let block_height_log2 = max_block_height_log2(height_in_blocks);

		let (flags, special_pad) = if entry.uses_special_pad() {
			(Flags::SPECIAL_PAD, SPECIAL_PAD)
		} else {
			(Flags::empty(), 0)
		};

		let surface = BlockLinear::new(
			entry.width_in_blocks(width),
			height_in_blocks,
			entry.bytes_per_block,
			1 << block_height_log2,
			special_pad,
		);

		log::debug!("Tiling {} as {}x{} blocks, block height {}, special pad {}", entry.full_name(),
			surface.width, surface.height, surface.block_height, special_pad);

		let data = surface.tile(blocks)?;

		Ok(XT1Texture {
			header: Header::new(format_id, width, height, data.len() as u64, block_height_log2, flags, special_pad),
			data: data,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		self.header.write(buf)?;
		buf.write_all(&self.data)
	}
}

/// Returns `true` if the data starts with an XT1 header
#[cfg(feature = "import")]
pub fn is_xt1(data: &[u8]) -> bool {
	Header::read(&mut &data[..]).is_ok()
}

/// Loads an XT1 file into an RGBA8 texture
#[cfg(feature = "import")]
pub fn read_xt1<C>(data: &[u8], codec: &C) -> Result<Texture, XT1ImportError>
where
	C: BlockCodec + ?Sized,
{
	let xt1 = XT1Texture::read(data)?;
	let tex = xt1.decode(codec)?;

	if let Ok(entry) = xt1.format() {
		log::info!("Loaded XT1 texture {:#x} ({}), {}x{}", entry.id, entry.full_name(), tex.width, tex.height);
	}

	Ok(tex)
}

/// Encodes an RGBA8 texture into a complete XT1 file
#[cfg(feature = "export")]
pub fn write_xt1<C>(tex: &Texture, options: Options, codec: &C) -> Result<Vec<u8>, XT1ExportError>
where
	C: BlockCodec + ?Sized,
{
	let xt1 = XT1Texture::encode(tex, options, codec)?;

	let mut out = Vec::with_capacity(header::HEADER_SIZE as usize + xt1.data.len());
	xt1.write(&mut out)?;
	Ok(out)
}

#[cfg(feature = "import")]
#[derive(Debug, Error)]
pub enum XT1ImportError {
	#[error("Unsupported block height: 2^{0}")]
	BlockHeight(u8),
	#[error("No codec available for {0}")]
	CodecUnavailable(&'static str),
	#[error("Codec returned {got} bytes, expected {expected}")]
	CodecOutput {
		expected: usize,
		got: usize,
	},
	#[error("Texture dimensions too large to untile")]
	Dimensions,
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Not an XT1 texture: {0:X}")]
	Magic(u32),
	#[error("Payload truncated: needs {offset} bytes, have {length}")]
	TruncatedPayload {
		offset: u64,
		length: usize,
	},
	#[error("Unknown/unsupported format: {0:#x}")]
	UnsupportedFormat(u32),
}

#[cfg(feature = "import")]
impl From<TilingError> for XT1ImportError {
	fn from(e: TilingError) -> XT1ImportError {
		match e {
			TilingError::OutOfBounds { offset, length } => XT1ImportError::TruncatedPayload {
				offset: offset,
				length: length,
			},
			TilingError::Overflow => XT1ImportError::Dimensions,
		}
	}
}

#[cfg(feature = "export")]
#[derive(Debug, Error)]
pub enum XT1ExportError {
	#[error("No codec available for {0}")]
	CodecUnavailable(&'static str),
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Block data too short: needs {offset} bytes, have {length}")]
	TruncatedPayload {
		offset: u64,
		length: usize,
	},
	#[error("Texture dimensions too large to tile, or not matching the pixel data")]
	Dimensions,
	#[error("Unknown/unsupported format: {0:#x}")]
	UnsupportedFormat(u32),
}

#[cfg(feature = "export")]
impl From<TilingError> for XT1ExportError {
	fn from(e: TilingError) -> XT1ExportError {
		match e {
			TilingError::OutOfBounds { offset, length } => XT1ExportError::TruncatedPayload {
				offset: offset,
				length: length,
			},
			TilingError::Overflow => XT1ExportError::Dimensions,
		}
	}
}

#[cfg(all(test, feature = "import", feature = "export"))]
mod tests {
	use super::*;
	use crate::codec::NoCodec;
	use crate::format::BCFormat;

	/// Fills blocks with their index and decodes every block to a flat color
	struct PatternCodec;

	impl BlockCodec for PatternCodec {
		fn encode_bc(&self, _rgba: &[u8], width: u32, height: u32, format: BCFormat) -> Option<Vec<u8>> {
			let bpb = if format == BCFormat::BC1 { 8 } else { 16 };
			Some(blocks(((width + 3) / 4 * ((height + 3) / 4)) as usize, bpb))
		}

		fn encode_astc(&self, _rgba: &[u8], block_width: u32, block_height: u32, _block_depth: u32,
			width: u32, height: u32, _depth: u32) -> Option<Vec<u8>>
		{
			let count = ((width + block_width - 1) / block_width) * ((height + block_height - 1) / block_height);
			Some(blocks(count as usize, 16))
		}

		fn decode_astc(&self, blocks: &[u8], _block_width: u32, _block_height: u32, _block_depth: u32,
			width: u32, height: u32, _depth: u32) -> Option<Vec<u8>>
		{
			let mut tex = Texture::new(width, height);
			for y in 0..height {
				for x in 0..width {
					tex.set_pixel(x, y, [blocks[0], blocks[blocks.len() - 1], 0, 0xFF]);
				}
			}
			Some(tex.pixels)
		}
	}

	fn blocks(count: usize, bpb: usize) -> Vec<u8> {
		(0..count * bpb).map(|i| (i / bpb) as u8 ^ (i % bpb) as u8).collect()
	}

	fn r8_file(texture_size: Option<u64>) -> Vec<u8> {
		let linear: Vec<u8> = (0..16).map(|i| i * 3 + 1).collect();
		let tiled = BlockLinear::new(4, 4, 1, 1, 0).tile(&linear).unwrap();

		let size = texture_size.unwrap_or(tiled.len() as u64);
		let header = Header::new(0x01, 4, 4, size, 0, Flags::empty(), 0);

		let mut data = vec![];
		header.write(&mut data).unwrap();
		data.extend_from_slice(&tiled[..size as usize]);
		data
	}

	#[test]
	fn test_decode_r8() {
		let data = r8_file(None);
		assert!(is_xt1(&data));

		let tex = read_xt1(&data, &NoCodec).unwrap();
		assert_eq!((tex.width, tex.height), (4, 4));

		for y in 0..4 {
			for x in 0..4 {
				let v = ((y * 4 + x) * 3 + 1) as u8;
				assert_eq!(tex.pixel(x, y), Some([v, v, v, codec::OPAQUE]));
			}
		}
	}

	#[test]
	fn test_truncated_payload() {
		// header claims only the linear size
		let data = r8_file(Some(16));
		match read_xt1(&data, &NoCodec) {
			Err(XT1ImportError::TruncatedPayload { length, .. }) => assert_eq!(length, 16),
			other => panic!("expected truncated payload, got {:?}", other),
		}

		// header claims more than the file holds
		let mut data = r8_file(None);
		data.truncate(data.len() - 1);
		assert!(matches!(XT1Texture::read(&data), Err(XT1ImportError::TruncatedPayload { .. })));
	}

	#[test]
	fn test_rewrite_larger_header() {
		// same texture with 8 extra header bytes before the payload
		let data = r8_file(None);
		let mut padded = data[..header::HEADER_SIZE as usize].to_vec();
		padded[16] = 0x40;
		padded[40] = 2;
		padded.extend_from_slice(&[0xEE; 8]);
		padded.extend_from_slice(&data[header::HEADER_SIZE as usize..]);

		let xt1 = XT1Texture::read(&padded).unwrap();
		assert_eq!((xt1.header.header_size, xt1.header.depth), (0x40, 2));

		let mut rewritten = vec![];
		xt1.write(&mut rewritten).unwrap();
		assert_eq!(rewritten, data);

		let reread = XT1Texture::read(&rewritten).unwrap();
		assert_eq!((reread.header.header_size, reread.header.depth), (0x38, 1));
		assert_eq!(reread.decode(&NoCodec).unwrap(), xt1.decode(&NoCodec).unwrap());
	}

	#[test]
	fn test_encode_pixel_mismatch() {
		let mut tex = Texture::new(4, 4);
		tex.pixels.truncate(60);
		assert!(matches!(write_xt1(&tex, Options::BC1, &PatternCodec), Err(XT1ExportError::Dimensions)));

		tex.pixels.resize(68, 0);
		assert!(matches!(XT1Texture::encode(&tex, Options::empty(), &NoCodec), Err(XT1ExportError::Dimensions)));
	}

	#[test]
	fn test_not_xt1() {
		assert!(!is_xt1(b"DDS |\0\0\0"));
		assert!(!is_xt1(b"XT"));
		assert!(matches!(read_xt1(b"PNG\0 and more", &NoCodec), Err(XT1ImportError::Magic(_))));
	}

	#[test]
	fn test_unsupported_format() {
		let mut data = r8_file(None);
		data[28] = 0x51;

		assert!(is_xt1(&data));
		assert!(matches!(read_xt1(&data, &NoCodec), Err(XT1ImportError::UnsupportedFormat(0x51))));
	}

	#[test]
	fn test_bad_block_height() {
		let mut data = r8_file(None);
		data[0x30] = 9;
		assert!(matches!(read_xt1(&data, &NoCodec), Err(XT1ImportError::BlockHeight(9))));
	}

	#[test]
	fn test_codec_unavailable() {
		let tex = Texture::new(16, 16);
		assert!(matches!(write_xt1(&tex, Options::empty(), &NoCodec), Err(XT1ExportError::CodecUnavailable("ASTC_8x8"))));

		let xt1 = XT1Texture::from_blocks(0x4D, 8, 8, &blocks(4, 16)).unwrap();
		assert!(matches!(xt1.decode(&NoCodec), Err(XT1ImportError::CodecUnavailable("BC7"))));
	}

	#[test]
	fn test_rgba8_round_trip() {
		let mut tex = Texture::new(9, 5);
		for y in 0..5 {
			for x in 0..9 {
				tex.set_pixel(x, y, [x as u8, y as u8, (x * y) as u8, 0x80]);
			}
		}

		let raw = codec::encode_raw(&tex.pixels, 9, 5, format::RawFormat::R8G8B8A8).unwrap();
		let xt1 = XT1Texture::from_blocks(0x25, 9, 5, &raw).unwrap();

		let mut data = vec![];
		xt1.write(&mut data).unwrap();
		assert_eq!(read_xt1(&data, &NoCodec).unwrap(), tex);
	}

	#[test]
	fn test_encode_default_format() {
		let tex = Texture::new(64, 64);
		let data = write_xt1(&tex, Options::empty(), &PatternCodec).unwrap();
		let xt1 = XT1Texture::read(&data).unwrap();

		assert_eq!(xt1.header.format, 0x80);
		assert_eq!(xt1.header.flags, Flags::empty());
		assert_eq!(xt1.header.special_pad, 0);
		assert_eq!(xt1.header.texture_size as usize, data.len() - header::HEADER_SIZE as usize);
		assert_eq!(xt1.untile().unwrap(), blocks(64, 16));
	}

	#[test]
	fn test_encode_special_pad() {
		let tex = Texture::new(40, 24);
		let data = write_xt1(&tex, Options::ASTC_4X4 | Options::SRGB, &PatternCodec).unwrap();
		let xt1 = XT1Texture::read(&data).unwrap();

		assert_eq!(xt1.header.format, 0x87);
		assert_eq!(xt1.header.flags, Flags::SPECIAL_PAD);
		assert_eq!(xt1.header.special_pad, SPECIAL_PAD);
		assert_eq!(xt1.header.block_height_log2, max_block_height_log2(6));

		// 10 blocks padded to 32 blocks of 16 bytes = 8 GOBs per row
		let gob_rows = 8 * (1u64 << xt1.header.block_height_log2);
		assert_eq!(xt1.header.texture_size, 8 * 512 * (gob_rows / 8) * ((6 + gob_rows - 1) / gob_rows));
		assert_eq!(xt1.untile().unwrap(), blocks(60, 16));

		let decoded = xt1.decode(&PatternCodec).unwrap();
		assert_eq!(decoded.pixel(39, 23), Some([0, 59 ^ 15, 0, 0xFF]));
	}

	#[test]
	fn test_encode_bc() {
		let tex = Texture::new(20, 12);
		let data = write_xt1(&tex, Options::BC1, &PatternCodec).unwrap();
		let xt1 = XT1Texture::read(&data).unwrap();

		assert_eq!(xt1.header.format, 0x42);
		assert_eq!(xt1.header.flags, Flags::empty());
		assert_eq!(xt1.untile().unwrap(), blocks(15, 8));
	}

	#[test]
	fn test_from_blocks_short() {
		assert!(matches!(XT1Texture::from_blocks(0x80, 16, 16, &[0; 63]),
			Err(XT1ExportError::TruncatedPayload { .. })));
		assert!(matches!(XT1Texture::from_blocks(0x99, 16, 16, &[0; 64]),
			Err(XT1ExportError::UnsupportedFormat(0x99))));
	}
}

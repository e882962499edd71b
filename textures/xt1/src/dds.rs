//! DX10 DirectDraw Surface interop, for moving already compressed block data in and out of XT1.
//!
//! Only the first mip level of a 2D texture is carried over.

use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io;
use thiserror::Error;

use rgk_core::rtag4;

use crate::format;

#[cfg(feature = "import")]
use crate::XT1ImportError;

#[cfg(all(feature = "import", feature = "export"))]
use crate::XT1ExportError;

use crate::XT1Texture;

pub const MAGIC: u32 = rtag4!(b"DDS ");
pub const FOURCC_DX10: u32 = rtag4!(b"DX10");
pub const HEADER_SIZE: u32 = 124;
pub const PIXEL_FORMAT_SIZE: u32 = 32;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_LINEARSIZE: u32 = 0x80000;
const DDPF_FOURCC: u32 = 0x4;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;

/// Maps a DXGI format to the XT1 format id that stores the same blocks
pub fn xt1_format_for_dxgi(dxgi_format: u32) -> Option<u32> {
	match dxgi_format {
		28 => Some(0x25), // R8G8B8A8_UNORM
		61 => Some(0x01), // R8_UNORM
		71 => Some(0x42), // BC1_UNORM
		72 => Some(0x46), // BC1_UNORM_SRGB
		74 => Some(0x43), // BC2_UNORM
		75 => Some(0x47), // BC2_UNORM_SRGB
		77 => Some(0x44), // BC3_UNORM
		78 => Some(0x48), // BC3_UNORM_SRGB
		80 => Some(0x45), // BC4_UNORM
		81 => Some(0x49), // BC4_SNORM
		83 => Some(0x4B), // BC5_UNORM
		84 => Some(0x4C), // BC5_SNORM
		95 => Some(0x50), // BC6H_UF16
		98 => Some(0x4D), // BC7_UNORM
		99 => Some(0x4E), // BC7_UNORM_SRGB
		134 => Some(0x79), // ASTC_4X4_UNORM
		135 => Some(0x87), // ASTC_4X4_UNORM_SRGB
		142 => Some(0x7B), // ASTC_5X5_UNORM
		143 => Some(0x89), // ASTC_5X5_UNORM_SRGB
		150 => Some(0x7D), // ASTC_6X6_UNORM
		151 => Some(0x8B), // ASTC_6X6_UNORM_SRGB
		162 => Some(0x80), // ASTC_8X8_UNORM
		163 => Some(0x8E), // ASTC_8X8_UNORM_SRGB
		178 => Some(0x84), // ASTC_10X10_UNORM
		179 => Some(0x92), // ASTC_10X10_UNORM_SRGB
		186 => Some(0x3A), // ASTC_12X12_UNORM
		187 => Some(0x94), // ASTC_12X12_UNORM_SRGB
		_ => None,
	}
}

/// Maps an XT1 format id to its DXGI equivalent
pub fn dxgi_for_xt1_format(format_id: u32) -> Option<u32> {
	match format_id {
		0x01 => Some(61),
		0x25 => Some(28),
		0x42 => Some(71),
		0x43 => Some(74),
		0x44 => Some(77),
		0x45 => Some(80),
		0x46 => Some(72),
		0x47 => Some(75),
		0x48 => Some(78),
		0x49 => Some(81),
		0x4B => Some(83),
		0x4C => Some(84),
		0x4D => Some(98),
		0x4E => Some(99),
		0x50 => Some(95),
		0x2D | 0x79 => Some(134),
		0x87 => Some(135),
		0x7B => Some(142),
		0x89 => Some(143),
		0x7D => Some(150),
		0x8B => Some(151),
		0x38 | 0x80 => Some(162),
		0x8E => Some(163),
		0x84 => Some(178),
		0x92 => Some(179),
		0x3A => Some(186),
		0x94 => Some(187),
		_ => None,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct DDSTexture {
	pub width: u32,
	pub height: u32,
	pub mipmap_count: u32,
	pub dxgi_format: u32,
	/// Every surface following the headers
	pub data: Vec<u8>,
}

impl DDSTexture {
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<DDSTexture, DDSImportError>
	where
		R: ReadBytesExt,
	{
		let magic = buf.read_u32::<LE>()?;
		if magic != MAGIC {
			return Err(DDSImportError::Magic(magic));
		}

		let size = buf.read_u32::<LE>()?;
		if size != HEADER_SIZE {
			log::warn!("DDS header size field is {} instead of {}", size, HEADER_SIZE);
		}

		let _flags = buf.read_u32::<LE>()?;
		let height = buf.read_u32::<LE>()?;
		let width = buf.read_u32::<LE>()?;
		let _pitch_or_linear_size = buf.read_u32::<LE>()?;
		let _depth = buf.read_u32::<LE>()?;
		let mipmap_count = buf.read_u32::<LE>()?;
		skip(buf, 11 * 4)?;

		let pf_size = buf.read_u32::<LE>()?;
		if pf_size != PIXEL_FORMAT_SIZE {
			return Err(DDSImportError::PixelFormatSize(pf_size));
		}

		let pf_flags = buf.read_u32::<LE>()?;
		let fourcc = buf.read_u32::<LE>()?;
		if pf_flags & DDPF_FOURCC == 0 || fourcc != FOURCC_DX10 {
			return Err(DDSImportError::NotDX10(fourcc));
		}

		// rest of the pixel format, caps and reserved
		skip(buf, 5 * 4 + 5 * 4)?;

		let dxgi_format = buf.read_u32::<LE>()?;
		skip(buf, 4 * 4)?;

		let mut data = vec![];
		buf.read_to_end(&mut data)?;

		Ok(DDSTexture {
			width: width,
			height: height,
			// 0 is allowed for a single surface
			mipmap_count: mipmap_count.max(1),
			dxgi_format: dxgi_format,
			data: data,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(MAGIC)?;
		buf.write_u32::<LE>(HEADER_SIZE)?;
		buf.write_u32::<LE>(DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE)?;
		buf.write_u32::<LE>(self.height)?;
		buf.write_u32::<LE>(self.width)?;
		buf.write_u32::<LE>(linear_size_field(self.data.len()))?;
		buf.write_u32::<LE>(0)?;
		buf.write_u32::<LE>(self.mipmap_count)?;
		buf.write_all(&[0; 11 * 4])?;

		buf.write_u32::<LE>(PIXEL_FORMAT_SIZE)?;
		buf.write_u32::<LE>(DDPF_FOURCC)?;
		buf.write_u32::<LE>(FOURCC_DX10)?;
		buf.write_all(&[0; 5 * 4])?;

		buf.write_u32::<LE>(DDSCAPS_TEXTURE)?;
		buf.write_all(&[0; 4 * 4])?;

		buf.write_u32::<LE>(self.dxgi_format)?;
		buf.write_u32::<LE>(RESOURCE_DIMENSION_TEXTURE2D)?;
		buf.write_u32::<LE>(0)?;
		buf.write_u32::<LE>(1)?;
		buf.write_u32::<LE>(0)?;

		buf.write_all(&self.data)
	}

	/// Tiles the first mip level into an XT1 texture
	#[cfg(all(feature = "import", feature = "export"))]
	pub fn to_xt1(&self) -> Result<XT1Texture, DDSImportError> {
		let format_id = xt1_format_for_dxgi(self.dxgi_format)
			.ok_or(DDSImportError::DXGIFormat(self.dxgi_format))?;
		let entry = format::lookup(format_id).ok_or(XT1ExportError::UnsupportedFormat(format_id))?;

		if self.mipmap_count > 1 {
			log::warn!("DDS texture has {} mip levels, only the first is converted", self.mipmap_count);
		}

		let mip0_size = entry.width_in_blocks(self.width) as usize
			* entry.height_in_blocks(self.height) as usize
			* entry.bytes_per_block as usize;
		let mip0 = &self.data[..mip0_size.min(self.data.len())];

		Ok(XT1Texture::from_blocks(format_id, self.width, self.height, mip0)?)
	}

	/// Untiles an XT1 texture into a single level DDS
	#[cfg(feature = "import")]
	pub fn from_xt1(xt1: &XT1Texture) -> Result<DDSTexture, XT1ImportError> {
		let dxgi_format = dxgi_for_xt1_format(xt1.header.format)
			.ok_or(XT1ImportError::UnsupportedFormat(xt1.header.format))?;

		Ok(DDSTexture {
			width: xt1.header.width,
			height: xt1.header.height,
			mipmap_count: 1,
			dxgi_format: dxgi_format,
			data: xt1.untile()?,
		})
	}
}

/// The linear size field is informational; payloads past 4 GiB saturate it
#[cfg(feature = "export")]
fn linear_size_field(len: usize) -> u32 {
	u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(feature = "import")]
fn skip<R>(buf: &mut R, count: usize) -> io::Result<()>
where
	R: ReadBytesExt,
{
	let mut discard = vec![0; count];
	buf.read_exact(&mut discard)
}

#[cfg(feature = "import")]
#[derive(Debug, Error)]
pub enum DDSImportError {
	#[error("Unsupported DXGI format: {0}")]
	DXGIFormat(u32),
	#[cfg(feature = "export")]
	#[error("Could not convert to XT1")]
	Export {
		#[from]
		source: XT1ExportError,
	},
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Not a DDS file: {0:X}")]
	Magic(u32),
	#[error("DDS file has no DX10 header (FourCC {0:X})")]
	NotDX10(u32),
	#[error("Invalid DDS pixel format size: {0}")]
	PixelFormatSize(u32),
}

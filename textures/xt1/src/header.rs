use bitflags::bitflags;

use byteorder::LE;

#[cfg(feature = "import")]
use byteorder::ReadBytesExt;

#[cfg(feature = "export")]
use byteorder::WriteBytesExt;

#[cfg(feature = "export")]
use std::io;

use rgk_core::rtag4;

use crate::blocklinear::MAX_BLOCK_HEIGHT_LOG2;

#[cfg(feature = "import")]
use crate::XT1ImportError;

pub const MAGIC: u32 = rtag4!(b"XT1\0");
pub const HEADER_SIZE: u32 = 0x38;
pub const UNKNOWN_A: u32 = 0x01000101;
pub const UNKNOWN_TRAILER: u32 = 0x00010007;
pub const TEXTURE_TYPE_2D: u32 = 1;

bitflags! {
	pub struct Flags: u8 {
		/// Rows are padded by `special_pad` blocks before tiling
		const SPECIAL_PAD = 4;
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	pub magic: u32,
	pub unknown_a: u32,
	pub texture_size: u64,
	pub header_size: u32,
	pub num_mipmaps: u32,
	pub texture_type: u32,
	pub format: u32,
	pub width: u32,
	pub height: u32,
	pub depth: u32,
	pub special_pad: u32,
	pub block_height_log2: u8,
	pub flags: Flags,
	pub reserved: [u8; 2],
	pub unknown_trailer: u32,
}

impl Header {
	/// Creates a single mip 2D header with the fixed values every XT1 writer uses
	pub fn new(format: u32, width: u32, height: u32, texture_size: u64, block_height_log2: u8,
		flags: Flags, special_pad: u32) -> Header
	{
		Header {
			magic: MAGIC,
			unknown_a: UNKNOWN_A,
			texture_size: texture_size,
			header_size: HEADER_SIZE,
			num_mipmaps: 1,
			texture_type: TEXTURE_TYPE_2D,
			format: format,
			width: width,
			height: height,
			depth: 1,
			special_pad: special_pad,
			block_height_log2: block_height_log2,
			flags: flags,
			reserved: [0; 2],
			unknown_trailer: UNKNOWN_TRAILER,
		}
	}

	/// GOB block height in GOBs, or `None` if the header's value is out of range
	pub fn gob_block_height(&self) -> Option<u32> {
		if self.block_height_log2 > MAX_BLOCK_HEIGHT_LOG2 {
			return None;
		}

		Some(1 << self.block_height_log2)
	}

	/// Row padding the tiler should apply; zero unless [`Flags::SPECIAL_PAD`] is set
	pub fn tiling_pad(&self) -> u32 {
		if self.flags.contains(Flags::SPECIAL_PAD) {
			self.special_pad
		} else {
			0
		}
	}

	/// Only the magic is validated; everything else is taken as-is.
	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<Header, XT1ImportError>
	where
		R: ReadBytesExt,
	{
		let magic = buf.read_u32::<LE>()?;
		if magic != MAGIC {
			return Err(XT1ImportError::Magic(magic));
		}

		Ok(Header {
			magic: magic,
			unknown_a: buf.read_u32::<LE>()?,
			texture_size: buf.read_u64::<LE>()?,
			header_size: buf.read_u32::<LE>()?,
			num_mipmaps: buf.read_u32::<LE>()?,
			texture_type: buf.read_u32::<LE>()?,
			format: buf.read_u32::<LE>()?,
			width: buf.read_u32::<LE>()?,
			height: buf.read_u32::<LE>()?,
			depth: buf.read_u32::<LE>()?,
			special_pad: buf.read_u32::<LE>()?,
			block_height_log2: buf.read_u8()?,
			flags: Flags::from_bits_truncate(buf.read_u8()?),
			reserved: [buf.read_u8()?, buf.read_u8()?],
			unknown_trailer: buf.read_u32::<LE>()?,
		})
	}

	/// Writes a single mip 2D header with the payload directly after it, whatever was read.
	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(MAGIC)?;
		buf.write_u32::<LE>(self.unknown_a)?;
		buf.write_u64::<LE>(self.texture_size)?;
		buf.write_u32::<LE>(HEADER_SIZE)?;
		buf.write_u32::<LE>(1)?;
		buf.write_u32::<LE>(TEXTURE_TYPE_2D)?;
		buf.write_u32::<LE>(self.format)?;
		buf.write_u32::<LE>(self.width)?;
		buf.write_u32::<LE>(self.height)?;
		buf.write_u32::<LE>(1)?;
		buf.write_u32::<LE>(self.special_pad)?;
		buf.write_u8(self.block_height_log2)?;
		buf.write_u8(self.flags.bits())?;
		buf.write_all(&self.reserved)?;
		buf.write_u32::<LE>(self.unknown_trailer)
	}
}

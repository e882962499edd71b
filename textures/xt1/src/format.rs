use bitflags::bitflags;
use rgk_core::div_round_up;

/// Format written when no export option selects one
pub const DEFAULT_FORMAT: u32 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
	Unorm,
	Srgb,
	Snorm,
}

impl ColorSpace {
	pub const fn name(self) -> &'static str {
		match self {
			ColorSpace::Unorm => "UNORM",
			ColorSpace::Srgb => "SRGB",
			ColorSpace::Snorm => "SNORM",
		}
	}
}

/// Uncompressed layouts, one texel per block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawFormat {
	R8,
	R8G8B8A8,
}

/// Block compressed variants handed to the BC codec
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BCFormat {
	BC1,
	BC2,
	BC3,
	BC4,
	BC5,
	BC6H,
	BC7,
}

/// Codec family used to decompress a format, with its sub-format parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
	Raw(RawFormat),
	BC(BCFormat),
	ASTC,
}

bitflags! {
	/// Export options a host may set; at most one size is expected alongside a color space
	pub struct Options: u32 {
		const ASTC_12X12 = 1 << 0;
		const ASTC_10X10 = 1 << 1;
		const ASTC_8X8 = 1 << 2;
		const ASTC_6X6 = 1 << 3;
		const ASTC_4X4 = 1 << 4;
		const BC1 = 1 << 5;
		const BC7 = 1 << 6;
		const UNORM = 1 << 7;
		const SRGB = 1 << 8;
	}
}

/// Host option names and descriptions, in registration order
pub const OPTION_DESCRIPTIONS: [(Options, &str, &str); 9] = [
	(Options::ASTC_12X12, "-xt1_12x12", "Export 12X12 XT1 Texture."),
	(Options::ASTC_10X10, "-xt1_10x10", "Export 10X10 XT1 Texture."),
	(Options::ASTC_8X8, "-xt1_8x8", "Export 8X8 XT1 Texture (Default)."),
	(Options::ASTC_6X6, "-xt1_6x6", "Export 6X6 XT1 Texture."),
	(Options::ASTC_4X4, "-xt1_4x4", "Export 4X4 XT1 Texture."),
	(Options::BC1, "-xt1_bc1", "Export BC1 XT1 Texture."),
	(Options::BC7, "-xt1_bc7", "Export BC7 XT1 Texture."),
	(Options::UNORM, "-xt1_UNORM", "Export UNORM XT1 Texture (Default)."),
	(Options::SRGB, "-xt1_SRGB", "Export SRGB XT1 Texture."),
];

impl Options {
	/// Looks up a single option by its host name, ignoring case
	pub fn from_name(name: &str) -> Option<Options> {
		OPTION_DESCRIPTIONS.iter()
			.find(|(_, n, _)| n.eq_ignore_ascii_case(name))
			.map(|(o, _, _)| *o)
	}

	/// Combines every recognized option name, skipping unknown ones
	pub fn from_names<'a, I>(names: I) -> Options
	where
		I: IntoIterator<Item = &'a str>,
	{
		names.into_iter()
			.filter_map(Options::from_name)
			.fold(Options::empty(), |acc, o| acc | o)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatEntry {
	pub id: u32,
	pub bytes_per_block: u32,
	pub block_width: u32,
	pub block_height: u32,
	pub name: &'static str,
	pub color_space: ColorSpace,
	pub codec: Codec,
	/// Export option that selects this format
	pub option: Option<Options>,
}

impl FormatEntry {
	pub fn width_in_blocks(&self, width: u32) -> u32 {
		div_round_up(width as u64, self.block_width as u64) as u32
	}

	pub fn height_in_blocks(&self, height: u32) -> u32 {
		div_round_up(height as u64, self.block_height as u64) as u32
	}

	/// Whether tiling this format pads the row width with [`crate::blocklinear::SPECIAL_PAD`]
	pub fn uses_special_pad(&self) -> bool {
		matches!(self.name, "ASTC_12x12" | "ASTC_10x10" | "ASTC_6x6" | "ASTC_5x5" | "ASTC_4x4")
	}

	/// Name and color space, e.g. `ASTC_8x8_UNORM`
	pub fn full_name(&self) -> String {
		format!("{}_{}", self.name, self.color_space.name())
	}
}

const fn entry(id: u32, bytes_per_block: u32, block_width: u32, block_height: u32, name: &'static str,
	color_space: ColorSpace, codec: Codec, option: Option<Options>) -> FormatEntry
{
	FormatEntry {
		id: id,
		bytes_per_block: bytes_per_block,
		block_width: block_width,
		block_height: block_height,
		name: name,
		color_space: color_space,
		codec: codec,
		option: option,
	}
}

use self::{
	BCFormat::*,
	ColorSpace::*,
};

// Order matters: export resolution takes the first match.
pub static FORMATS: [FormatEntry; 29] = [
	entry(0x01, 1, 1, 1, "R8", Unorm, Codec::Raw(RawFormat::R8), None),
	entry(0x25, 4, 1, 1, "R8G8B8A8", Unorm, Codec::Raw(RawFormat::R8G8B8A8), None),
	entry(0x42, 8, 4, 4, "BC1", Unorm, Codec::BC(BC1), Some(Options::BC1)),
	entry(0x43, 16, 4, 4, "BC2", Unorm, Codec::BC(BC2), None),
	entry(0x44, 16, 4, 4, "BC3", Unorm, Codec::BC(BC3), None),
	entry(0x45, 8, 4, 4, "BC4", Unorm, Codec::BC(BC4), None),
	entry(0x46, 8, 4, 4, "BC1", Srgb, Codec::BC(BC1), Some(Options::BC1)),
	entry(0x47, 16, 4, 4, "BC2", Srgb, Codec::BC(BC2), None),
	entry(0x48, 16, 4, 4, "BC3", Srgb, Codec::BC(BC3), None),
	entry(0x49, 8, 4, 4, "BC4", Snorm, Codec::BC(BC4), None),
	entry(0x4B, 16, 4, 4, "BC5", Unorm, Codec::BC(BC5), None),
	entry(0x4C, 16, 4, 4, "BC5", Srgb, Codec::BC(BC5), None),
	entry(0x4D, 16, 4, 4, "BC7", Unorm, Codec::BC(BC7), Some(Options::BC7)),
	entry(0x4E, 16, 4, 4, "BC7", Srgb, Codec::BC(BC7), Some(Options::BC7)),
	entry(0x50, 16, 4, 4, "BC6H_UF16", Srgb, Codec::BC(BC6H), None),
	entry(0x2D, 16, 4, 4, "ASTC_4x4", Unorm, Codec::ASTC, Some(Options::ASTC_4X4)),
	entry(0x38, 16, 8, 8, "ASTC_8x8", Unorm, Codec::ASTC, Some(Options::ASTC_8X8)),
	entry(0x3A, 16, 12, 12, "ASTC_12x12", Unorm, Codec::ASTC, Some(Options::ASTC_12X12)),
	entry(0x79, 16, 4, 4, "ASTC_4x4", Unorm, Codec::ASTC, Some(Options::ASTC_4X4)),
	entry(0x7B, 16, 5, 5, "ASTC_5x5", Unorm, Codec::ASTC, None),
	entry(0x7D, 16, 6, 6, "ASTC_6x6", Unorm, Codec::ASTC, Some(Options::ASTC_6X6)),
	entry(0x80, 16, 8, 8, "ASTC_8x8", Unorm, Codec::ASTC, Some(Options::ASTC_8X8)),
	entry(0x84, 16, 10, 10, "ASTC_10x10", Unorm, Codec::ASTC, Some(Options::ASTC_10X10)),
	entry(0x87, 16, 4, 4, "ASTC_4x4", Srgb, Codec::ASTC, Some(Options::ASTC_4X4)),
	entry(0x89, 16, 5, 5, "ASTC_5x5", Srgb, Codec::ASTC, None),
	entry(0x8B, 16, 6, 6, "ASTC_6x6", Srgb, Codec::ASTC, Some(Options::ASTC_6X6)),
	entry(0x8E, 16, 8, 8, "ASTC_8x8", Srgb, Codec::ASTC, Some(Options::ASTC_8X8)),
	entry(0x92, 16, 10, 10, "ASTC_10x10", Srgb, Codec::ASTC, Some(Options::ASTC_10X10)),
	entry(0x94, 16, 12, 12, "ASTC_12x12", Srgb, Codec::ASTC, Some(Options::ASTC_12X12)),
];

pub fn lookup(id: u32) -> Option<&'static FormatEntry> {
	FORMATS.iter().find(|f| f.id == id)
}

/// Picks the format id to export with.
///
/// A selected size wins in the requested color space, SRGB alone picks the first SRGB
/// format, and everything else falls back to [`DEFAULT_FORMAT`].
pub fn resolve_format(options: Options) -> u32 {
	let srgb = options.contains(Options::SRGB);

	for f in FORMATS.iter() {
		if let Some(option) = f.option {
			if !options.contains(option) {
				continue;
			}

			if (srgb && f.color_space == Srgb) || (!srgb && f.color_space == Unorm) {
				return f.id;
			}
		}
	}

	if srgb {
		if let Some(f) = FORMATS.iter().find(|f| f.color_space == Srgb) {
			return f.id;
		}
	}

	DEFAULT_FORMAT
}

/// Number of bytes in a single RGBA8 pixel
pub const RGBA8_PIXEL_SIZE: usize = 4;

/// A decoded texture, stored as tightly packed RGBA8 rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
	pub width: u32,
	pub height: u32,
	pub pixels: Vec<u8>,
}

impl Texture {
	/// Creates a fully transparent black texture
	pub fn new(width: u32, height: u32) -> Texture {
		Texture {
			width: width,
			height: height,
			pixels: vec![0; rgba8_size(width, height)],
		}
	}

	/// Wraps an existing RGBA8 buffer, returning `None` if its length doesn't match the dimensions
	pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Texture> {
		if pixels.len() != rgba8_size(width, height) {
			return None;
		}

		Some(Texture {
			width: width,
			height: height,
			pixels: pixels,
		})
	}

	/// Returns the RGBA8 value at the specified coordinates
	pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
		if x >= self.width || y >= self.height {
			return None;
		}

		let i = ((y as usize * self.width as usize) + x as usize) * RGBA8_PIXEL_SIZE;
		let p = &self.pixels[i..i + RGBA8_PIXEL_SIZE];
		Some([p[0], p[1], p[2], p[3]])
	}

	/// Sets the RGBA8 value at the specified coordinates. Out of range coordinates are ignored.
	pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
		if x >= self.width || y >= self.height {
			return;
		}

		let i = ((y as usize * self.width as usize) + x as usize) * RGBA8_PIXEL_SIZE;
		self.pixels[i..i + RGBA8_PIXEL_SIZE].copy_from_slice(&rgba);
	}
}

/// Returns the byte size of an RGBA8 image with the given dimensions
pub fn rgba8_size(width: u32, height: u32) -> usize {
	width as usize * height as usize * RGBA8_PIXEL_SIZE
}

use std::{
	env,
	error::Error,
	fs::{
		read,
		File
	},
	io::{
		BufWriter,
		Write
	},
	path::Path
};

use rgk_textures_xt1::{
	dds::DDSTexture,
	XT1Texture
};

fn main() -> Result<(), Box<dyn Error>> {
	let args: Vec<String> = env::args().collect();
	if args.len() < 2 {
		println!("Usage: xt1conv <input.dds|input.xt1>");
		return Err("No input file provided".into());
	}

	let input = Path::new(&args[1]);
	let ext = input.extension()
		.and_then(|e| e.to_str())
		.map(|e| e.to_ascii_lowercase())
		.unwrap_or_default();
	let data = read(input)?;

	match ext.as_str() {
		"dds" => {
			let dds = DDSTexture::read(&mut data.as_slice())?;
			println!("DXGI format {}, {}x{}, {} mip levels", dds.dxgi_format, dds.width, dds.height,
				dds.mipmap_count);

			let xt1 = dds.to_xt1()?;
			println!("XT1 format {:#x}, block height 2^{}, {} bytes tiled", xt1.header.format,
				xt1.header.block_height_log2, xt1.data.len());

			let output = input.with_extension("xt1");
			let mut out = BufWriter::new(File::create(&output)?);
			xt1.write(&mut out)?;
			out.flush()?;
			println!("Wrote {}", output.display());
		}
		"xt1" => {
			let xt1 = XT1Texture::read(&data)?;
			println!("XT1 format {:#x}, {}x{}", xt1.header.format, xt1.header.width, xt1.header.height);

			let dds = DDSTexture::from_xt1(&xt1)?;
			let output = input.with_extension("dds");
			let mut out = BufWriter::new(File::create(&output)?);
			dds.write(&mut out)?;
			out.flush()?;
			println!("Wrote {}", output.display());
		}
		_ => return Err(format!("Unrecognized file type: {}", input.display()).into()),
	}

	Ok(())
}

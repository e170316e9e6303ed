use anyhow::Context;
use clap::Parser;

use vfs::cli::Args;
use vfs::fs::VirtualFs;
use vfs::image::Image;
use vfs::repl::Repl;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let image = Image::open_or_format(&args.image_path, args.block_size, args.fat_class)
        .with_context(|| format!("failed to open image {:?}", args.image_path))?;

    let mut fs = VirtualFs::new(image);
    Repl::new(&mut fs).run().context("command loop failed")?;
    Ok(())
}

//! Command-line invocation: `vfs [-b{128|256|512|1024}] [-f{7|8|9|10}] IMAGE_PATH`.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ImageError;
use crate::params::{BlockSize, FatClass};

#[derive(Debug, Parser)]
#[command(name = "vfs", about = "A single-file virtual filesystem shell")]
pub struct Args {
    /// Block size in bytes: one of 128, 256, 512, 1024.
    #[arg(short = 'b', value_parser = parse_block_size, default_value = "256")]
    pub block_size: BlockSize,

    /// FAT class: one of 7, 8, 9, 10 (data blocks = 2^class).
    #[arg(short = 'f', value_parser = parse_fat_class, default_value = "8")]
    pub fat_class: FatClass,

    /// Path to the container image; created and formatted if missing.
    pub image_path: PathBuf,
}

fn parse_block_size(s: &str) -> Result<BlockSize, String> {
    let n: i32 = s.parse().map_err(|_| format!("invalid block size '{s}'"))?;
    BlockSize::from_bytes(n).map_err(|e: ImageError| e.to_string())
}

fn parse_fat_class(s: &str) -> Result<FatClass, String> {
    let n: i32 = s.parse().map_err(|_| format!("invalid fat class '{s}'"))?;
    FatClass::from_class(n).map_err(|e: ImageError| e.to_string())
}

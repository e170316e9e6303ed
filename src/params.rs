//! Container format parameters chosen at image-creation time.
//!
//! Block size and FAT class are picked at runtime from CLI flags, so
//! they are plain enums rather than compile-time type parameters.

use crate::error::ImageError;

/// Size in bytes of a single data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSize {
    B128,
    B256,
    B512,
    B1024,
}

impl BlockSize {
    pub const DEFAULT: BlockSize = BlockSize::B256;

    pub fn bytes(self) -> u32 {
        match self {
            BlockSize::B128 => 128,
            BlockSize::B256 => 256,
            BlockSize::B512 => 512,
            BlockSize::B1024 => 1024,
        }
    }

    pub fn from_bytes(n: i32) -> Result<BlockSize, ImageError> {
        match n {
            128 => Ok(BlockSize::B128),
            256 => Ok(BlockSize::B256),
            512 => Ok(BlockSize::B512),
            1024 => Ok(BlockSize::B1024),
            other => Err(ImageError::BadBlockSize(other)),
        }
    }

    /// Directory entries are fixed at 32 bytes on disk (see
    /// `sys::dir_entry::RawDirEntry`); this is how many fit per block.
    pub fn entries_per_block(self) -> u32 {
        self.bytes() / crate::sys::dir_entry::RAW_DIR_ENTRY_SIZE as u32
    }
}

/// `fatClass` selects the number of data blocks as `N = 2^fatClass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatClass {
    C7,
    C8,
    C9,
    C10,
}

impl FatClass {
    pub const DEFAULT: FatClass = FatClass::C8;

    pub fn class(self) -> i32 {
        match self {
            FatClass::C7 => 7,
            FatClass::C8 => 8,
            FatClass::C9 => 9,
            FatClass::C10 => 10,
        }
    }

    pub fn block_count(self) -> u32 {
        1u32 << self.class()
    }

    pub fn from_class(n: i32) -> Result<FatClass, ImageError> {
        match n {
            7 => Ok(FatClass::C7),
            8 => Ok(FatClass::C8),
            9 => Ok(FatClass::C9),
            10 => Ok(FatClass::C10),
            other => Err(ImageError::BadFatClass(other)),
        }
    }
}

/// Total on-disk image size for a given `(blockSize, fatClass)` pair:
/// `blockSize + N*4 + N*blockSize`.
pub fn image_size(block_size: BlockSize, fat_class: FatClass) -> u64 {
    let block_size = block_size.bytes() as u64;
    let n = fat_class.block_count() as u64;
    block_size + n * 4 + n * block_size
}

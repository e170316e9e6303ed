use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ImageError;
use crate::params::{BlockSize, FatClass};

/// Fixed validity marker written to every formatted image.
pub const MAGIC: i32 = 9999;

/// The header block: exactly one block's worth of bytes, though only
/// the first 24 bytes are meaningful; the remainder of the block is
/// unused padding reserved by the container layout.
///
/// Laid out and read in the host's native byte order; `zerocopy`
/// reads/writes these fields as a plain byte-for-byte cast of the
/// mapped image, with no serialization step.
#[repr(C)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct RawSuperblock {
    /// Fixed validity marker; must equal `MAGIC` for the image to be valid.
    pub magic: i32,
    /// Size in bytes of a single data block: one of 128, 256, 512, 1024.
    pub block_size: i32,
    /// FAT class; the number of data blocks is `2^fat_class`.
    pub fat_class: i32,
    /// Data-block index of the root directory; always 0.
    pub root_block: i32,
    /// Head of the free-block linked list, or `-1` if the image is full.
    pub free_head: i32,
    /// Number of free blocks; must equal the length of the free chain.
    pub free_count: i32,
}

pub const RAW_SUPERBLOCK_SIZE: usize = core::mem::size_of::<RawSuperblock>();

impl RawSuperblock {
    pub fn formatted(block_size: BlockSize, fat_class: FatClass) -> RawSuperblock {
        let n = fat_class.block_count() as i32;
        RawSuperblock {
            magic: MAGIC,
            block_size: block_size.bytes() as i32,
            fat_class: fat_class.class(),
            root_block: 0,
            free_head: 1,
            free_count: n - 1,
        }
    }

    /// Validates the magic and the block-size/fat-class fields, and
    /// returns the decoded parameters for size-checking by the caller.
    pub fn validate(&self) -> Result<(BlockSize, FatClass), ImageError> {
        if self.magic != MAGIC {
            return Err(ImageError::BadMagic(self.magic));
        }
        let block_size = BlockSize::from_bytes(self.block_size)?;
        let fat_class = FatClass::from_class(self.fat_class)?;
        Ok((block_size, fat_class))
    }
}

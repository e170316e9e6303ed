//! File content chain management.
//!
//! Content is opaque binary throughout: no NUL-terminated string
//! routines touch file bytes anywhere in this module.

use crate::alloc;
use crate::error::Error;
use crate::image::Image;

/// Number of blocks a file of byte length `len` occupies: at least 1,
/// `ceil(len / blockSize)` otherwise.
pub fn blocks_for_len(len: u64, block_size: u32) -> u32 {
    let block_size = block_size as u64;
    let blocks = len.div_ceil(block_size).max(1);
    blocks as u32
}

/// Creates a new block chain holding `bytes`, returning its head block.
/// The caller must have already reserved `blocks_for_len(bytes.len(), block_size)`
/// blocks of capacity.
pub fn create_from_bytes(image: &mut Image, bytes: &[u8]) -> Result<u32, Error> {
    let block_size = image.block_size().bytes() as usize;
    let n_blocks = blocks_for_len(bytes.len() as u64, block_size as u32);

    let mut blocks = Vec::with_capacity(n_blocks as usize);
    for _ in 0..n_blocks {
        blocks.push(alloc::acquire(image)?);
    }
    for (i, &b) in blocks.iter().enumerate() {
        let next = if i + 1 < blocks.len() { blocks[i + 1] as i32 } else { -1 };
        image.fat_set(b, next);
    }

    for (i, &b) in blocks.iter().enumerate() {
        let start = i * block_size;
        let end = ((i + 1) * block_size).min(bytes.len());
        let block = image.block_mut(b);
        block.fill(0);
        if start < bytes.len() {
            block[..end - start].copy_from_slice(&bytes[start..end]);
        }
    }

    Ok(blocks.first().copied().unwrap_or(u32::MAX))
}

/// Reads the full `len`-byte payload of the chain rooted at `head`.
pub fn read_to_vec(image: &Image, head: u32, len: u64) -> Vec<u8> {
    let block_size = image.block_size().bytes() as u64;
    let mut out = Vec::with_capacity(len as usize);
    let mut remaining = len;
    let mut block = head;
    loop {
        let take = remaining.min(block_size) as usize;
        out.extend_from_slice(&image.block(block)[..take]);
        remaining -= take as u64;
        if remaining == 0 {
            break;
        }
        block = image.fat_get(block) as u32;
    }
    out
}

/// Duplicates the chain rooted at `src_head` (length `len` bytes) into
/// a freshly allocated chain of identical length. The caller must have
/// already reserved capacity for the duplicate.
pub fn duplicate_chain(image: &mut Image, src_head: u32, len: u64) -> Result<u32, Error> {
    let bytes = read_to_vec(image, src_head, len);
    create_from_bytes(image, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BlockSize, FatClass};
    use tempfile::NamedTempFile;

    fn fresh_image() -> Image {
        let path = NamedTempFile::new().unwrap().into_temp_path();
        std::fs::remove_file(&path).ok();
        Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap()
    }

    #[test]
    fn exact_multiple_uses_exact_block_count() {
        assert_eq!(blocks_for_len(512, 256), 2);
        assert_eq!(blocks_for_len(0, 256), 1);
        assert_eq!(blocks_for_len(1, 256), 1);
        assert_eq!(blocks_for_len(257, 256), 2);
    }

    #[test]
    fn round_trip_preserves_interior_nuls() {
        let mut image = fresh_image();
        let bytes: Vec<u8> = (0..600u32).map(|i| (i % 256) as u8).collect();
        let head = create_from_bytes(&mut image, &bytes).unwrap();
        let back = read_to_vec(&image, head, bytes.len() as u64);
        assert_eq!(back, bytes);
    }

    #[test]
    fn duplicate_is_independent() {
        let mut image = fresh_image();
        let bytes = vec![7u8; 300];
        let head = create_from_bytes(&mut image, &bytes).unwrap();
        let dup = duplicate_chain(&mut image, head, bytes.len() as u64).unwrap();
        assert_ne!(head, dup);
        let back = read_to_vec(&image, dup, bytes.len() as u64);
        assert_eq!(back, bytes);
    }
}

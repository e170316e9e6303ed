//! Free-block allocator over the FAT.
//!
//! Stateless logic over `Image`'s superblock + FAT: `acquire`/`release`
//! maintain a singly-linked LIFO free list rooted at `freeHead`.

use log::trace;

use crate::error::Error;
use crate::image::Image;

/// Acquires one free block, or `Err(CapacityExhausted)` if none remain.
pub fn acquire(image: &mut Image) -> Result<u32, Error> {
    let sb = image.superblock();
    if sb.free_count == 0 {
        return Err(Error::CapacityExhausted);
    }
    let b = sb.free_head;
    let next = image.fat_get(b as u32);
    let sb = image.superblock_mut();
    sb.free_head = next;
    sb.free_count -= 1;
    image.fat_set(b as u32, -1);
    trace!("acquire -> block {}, {} free remain", b, image.superblock().free_count);
    Ok(b as u32)
}

/// Returns `b` to the free list. The caller must ensure `b` is not
/// reachable from any live directory or file chain.
pub fn release(image: &mut Image, b: u32) {
    let head = image.superblock().free_head;
    image.fat_set(b, head);
    let sb = image.superblock_mut();
    sb.free_head = b as i32;
    sb.free_count += 1;
    trace!("release block {} -> {} free remain", b, image.superblock().free_count);
}

/// Frees an entire chain rooted at `head` by splicing it onto the front
/// of the free list in one step.
pub fn release_chain(image: &mut Image, head: u32) {
    let mut count = 1u32;
    let mut tail = head;
    loop {
        let next = image.fat_get(tail);
        if next == -1 {
            break;
        }
        tail = next as u32;
        count += 1;
    }
    let old_head = image.superblock().free_head;
    image.fat_set(tail, old_head);
    let sb = image.superblock_mut();
    sb.free_head = head as i32;
    sb.free_count += count as i32;
    trace!(
        "release_chain head {} ({} blocks) -> {} free remain",
        head,
        count,
        image.superblock().free_count
    );
}

pub fn free_count(image: &Image) -> u32 {
    image.superblock().free_count as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BlockSize, FatClass};
    use tempfile::NamedTempFile;

    fn fresh_image() -> Image {
        let path = NamedTempFile::new().unwrap().into_temp_path();
        std::fs::remove_file(&path).ok();
        Image::open_or_format(&path, BlockSize::B128, FatClass::C7).unwrap()
    }

    #[test]
    fn acquire_then_release_restores_free_count() {
        let mut image = fresh_image();
        let before = free_count(&image);
        let b = acquire(&mut image).unwrap();
        assert_eq!(free_count(&image), before - 1);
        release(&mut image, b);
        assert_eq!(free_count(&image), before);
    }

    #[test]
    fn exhaustion_returns_capacity_error() {
        let mut image = fresh_image();
        let total = free_count(&image);
        for _ in 0..total {
            acquire(&mut image).unwrap();
        }
        assert!(acquire(&mut image).is_err());
    }
}

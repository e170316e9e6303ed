//! Directory chain management.
//!
//! A directory is addressed by its head block; its live count lives in
//! slot 0's (`.`) `size` field. Iteration, lookup, append, and
//! swap-with-last removal are all expressed in terms of "slot index",
//! with block-chain traversal folded in underneath.

use log::debug;

use crate::alloc;
use crate::error::Error;
use crate::image::Image;
use crate::sys::dir_entry::{RawDirEntry, MAX_NAME_LEN};

pub fn live_count(image: &Image, head: u32) -> u32 {
    image.read_dir_entry(head, 0).size as u32
}

fn set_live_count(image: &mut Image, head: u32, n: u32) {
    let mut dot = image.read_dir_entry(head, 0);
    dot.size = n as i32;
    image.write_dir_entry(head, 0, &dot);
}

/// Walks the FAT chain starting at `head` to find the block holding
/// slot `slot`.
fn block_for_slot(image: &Image, head: u32, slot: u32) -> u32 {
    let e = image.entries_per_block();
    let mut block = head;
    for _ in 0..(slot / e) {
        block = image.fat_get(block) as u32;
    }
    block
}

pub fn entry_at(image: &Image, head: u32, slot: u32) -> RawDirEntry {
    let e = image.entries_per_block();
    let block = block_for_slot(image, head, slot);
    image.read_dir_entry(block, slot % e)
}

fn set_entry_at(image: &mut Image, head: u32, slot: u32, entry: &RawDirEntry) {
    let e = image.entries_per_block();
    let block = block_for_slot(image, head, slot);
    image.write_dir_entry(block, slot % e, entry);
}

/// Lists every live entry of `head`, in on-disk (chain) order.
pub fn entries(image: &Image, head: u32) -> Vec<RawDirEntry> {
    let n = live_count(image, head);
    (0..n).map(|i| entry_at(image, head, i)).collect()
}

/// Finds the slot and entry matching `name`, byte-exact against the
/// stored null-padded name.
pub fn find(image: &Image, head: u32, name: &str) -> Option<(u32, RawDirEntry)> {
    let n = live_count(image, head);
    (0..n)
        .map(|i| (i, entry_at(image, head, i)))
        .find(|(_, e)| e.name_str() == name)
}

/// How many extra data blocks an append to this directory would need:
/// 0 if the tail block still has room, 1 if a new tail must be acquired.
pub fn blocks_needed_for_append(image: &Image, head: u32) -> u32 {
    let n = live_count(image, head);
    let e = image.entries_per_block();
    if n % e == 0 {
        1
    } else {
        0
    }
}

/// Appends `entry` to `head`. The caller must already have verified
/// (via `blocks_needed_for_append`) that `freeCount` covers any tail
/// growth this call performs.
pub fn append(image: &mut Image, head: u32, entry: RawDirEntry) -> Result<(), Error> {
    let n = live_count(image, head);
    let e = image.entries_per_block();

    if n % e == 0 && n > 0 {
        let tail = last_block(image, head);
        let new_block = alloc::acquire(image)?;
        image.fat_set(tail, new_block as i32);
        image.fat_set(new_block, -1);
        debug!("directory {} grew a tail block ({})", head, new_block);
    }

    set_entry_at(image, head, n, &entry);
    set_live_count(image, head, n + 1);
    Ok(())
}

fn last_block(image: &Image, head: u32) -> u32 {
    let mut block = head;
    loop {
        let next = image.fat_get(block);
        if next == -1 {
            return block;
        }
        block = next as u32;
    }
}

/// Removes the entry named `name` from `head` using swap-with-last
/// compaction, and returns the **original** removed entry (captured
/// before the swap overwrites its slot). Returning the pre-swap data is
/// what lets callers (notably `move`) relocate the chain that was
/// actually named, instead of whatever entry swap-with-last moved into
/// the vacated slot.
pub fn remove_by_name(image: &mut Image, head: u32, name: &str) -> Result<RawDirEntry, Error> {
    let (p, removed) = find(image, head, name).ok_or_else(|| Error::NotFound(name.to_string()))?;
    remove_at(image, head, p)?;
    Ok(removed)
}

fn remove_at(image: &mut Image, head: u32, p: u32) -> Result<(), Error> {
    let n = live_count(image, head);
    let last_slot = n - 1;
    if p != last_slot {
        let last_entry = entry_at(image, head, last_slot);
        set_entry_at(image, head, p, &last_entry);
    }
    set_live_count(image, head, last_slot);

    let e = image.entries_per_block();
    if last_slot % e == 0 {
        let tail = last_block(image, head);
        if tail != head {
            let prev = block_before(image, head, tail);
            image.fat_set(prev, -1);
            alloc::release(image, tail);
            debug!("directory {} freed empty tail block {}", head, tail);
        }
    }
    Ok(())
}

fn block_before(image: &Image, head: u32, target: u32) -> u32 {
    let mut block = head;
    loop {
        let next = image.fat_get(block) as u32;
        if next == target {
            return block;
        }
        block = next;
    }
}

pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.len() > MAX_NAME_LEN || name.is_empty() {
        return Err(Error::NameTooLong(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BlockSize, FatClass};
    use crate::sys::dir_entry::KIND_DIR;
    use tempfile::NamedTempFile;

    fn fresh_image() -> Image {
        let path = NamedTempFile::new().unwrap().into_temp_path();
        std::fs::remove_file(&path).ok();
        Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap()
    }

    fn make_entry(name: &str, block: u32) -> RawDirEntry {
        let mut e = RawDirEntry::zeroed();
        e.kind = KIND_DIR;
        e.set_name(name);
        e.first_block = block as i32;
        e
    }

    #[test]
    fn root_starts_with_dot_and_dotdot() {
        let image = fresh_image();
        assert_eq!(live_count(&image, 0), 2);
        assert_eq!(entry_at(&image, 0, 0).name_str(), ".");
        assert_eq!(entry_at(&image, 0, 1).name_str(), "..");
    }

    #[test]
    fn append_and_find() {
        let mut image = fresh_image();
        let b = alloc::acquire(&mut image).unwrap();
        append(&mut image, 0, make_entry("sub", b)).unwrap();
        assert_eq!(live_count(&image, 0), 3);
        let (slot, entry) = find(&image, 0, "sub").unwrap();
        assert_eq!(slot, 2);
        assert_eq!(entry.first_block, b as i32);
    }

    #[test]
    fn tail_growth_on_e_plus_one_th_append() {
        let mut image = fresh_image();
        let e = image.entries_per_block();
        for i in 0..(e - 2) {
            let b = alloc::acquire(&mut image).unwrap();
            append(&mut image, 0, make_entry(&format!("d{i}"), b)).unwrap();
        }
        // root now has e live entries (., .., d0..d(e-3)); next append grows.
        assert_eq!(live_count(&image, 0), e);
        let before = alloc::free_count(&image);
        let b = alloc::acquire(&mut image).unwrap();
        append(&mut image, 0, make_entry("overflow", b)).unwrap();
        // one block for the new entry's own head (already acquired above)
        // plus one more for the directory tail growth.
        assert_eq!(alloc::free_count(&image), before - 2);
    }

    #[test]
    fn remove_returns_original_entry_before_swap() {
        let mut image = fresh_image();
        let ba = alloc::acquire(&mut image).unwrap();
        let bb = alloc::acquire(&mut image).unwrap();
        append(&mut image, 0, make_entry("a", ba)).unwrap();
        append(&mut image, 0, make_entry("b", bb)).unwrap();

        let removed = remove_by_name(&mut image, 0, "a").unwrap();
        assert_eq!(removed.first_block, ba as i32);
        // "b" was swapped into "a"'s old slot; it must keep its own block.
        let (_, b_entry) = find(&image, 0, "b").unwrap();
        assert_eq!(b_entry.first_block, bb as i32);
    }
}

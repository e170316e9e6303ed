//! End-to-end scenarios run against a real tempfile-backed image.

use std::io::Write;

use tempfile::NamedTempFile;
use vfs::fs::VirtualFs;
use vfs::image::Image;
use vfs::params::{BlockSize, FatClass};

fn fresh_image_path() -> tempfile::TempPath {
    let path = NamedTempFile::new().unwrap().into_temp_path();
    std::fs::remove_file(&path).ok();
    path
}

fn host_file_with(bytes: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn fresh_format_then_list_then_pwd() {
    let path = fresh_image_path();
    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
    let fs = VirtualFs::new(image);

    // root is empty save for `.` and `..`, which `ls` does include.
    let lines = fs.list();
    assert_eq!(lines.len(), 2);
    assert_eq!(fs.print_working_dir(), "/");
}

#[test]
fn grow_across_block_boundary_and_shrink_back() {
    let path = fresh_image_path();
    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
    let mut fs = VirtualFs::new(image);

    let e = fs.image().entries_per_block();
    let before = fs.image().superblock().free_count;

    // Filling root to exactly E live entries (`.`, `..`, plus E - 2
    // directories) leaves the tail block full; the next mkdir must
    // grow a new tail block for root, on top of the new dir's own head
    // block.
    for i in 0..(e - 2) {
        fs.make_dir(&format!("d{i}")).unwrap();
    }
    let mid = fs.image().superblock().free_count;
    assert_eq!(before - mid, (e - 2) as i32);

    fs.make_dir("overflow").unwrap();
    let after = fs.image().superblock().free_count;
    assert_eq!(mid - after, 2);

    fs.remove_dir("overflow").unwrap();
    let restored = fs.image().superblock().free_count;
    assert_eq!(restored, mid);
}

#[test]
fn ingest_egress_round_trip_with_interior_nuls() {
    let path = fresh_image_path();
    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
    let mut fs = VirtualFs::new(image);

    let mut bytes = vec![0u8; 600];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
    bytes[100] = 0;
    bytes[300] = 0;
    let host_in = host_file_with(&bytes);

    fs.ingest(host_in.path(), "a").unwrap();

    let host_out = NamedTempFile::new().unwrap();
    fs.egress("a", host_out.path()).unwrap();
    let round_tripped = std::fs::read(host_out.path()).unwrap();
    assert_eq!(round_tripped, bytes);
}

#[test]
fn copy_into_subdirectory_preserves_bytes() {
    let path = fresh_image_path();
    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
    let mut fs = VirtualFs::new(image);

    let bytes = vec![0xABu8; 600];
    let host_in = host_file_with(&bytes);
    fs.make_dir("sub").unwrap();
    fs.ingest(host_in.path(), "a").unwrap();
    fs.copy_file("a", "sub").unwrap();

    fs.change_dir("sub").unwrap();
    let mut out = Vec::new();
    fs.cat("a", &mut out).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn move_overwrite_frees_the_overwritten_chain_and_keeps_moved_bytes() {
    let path = fresh_image_path();
    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
    let mut fs = VirtualFs::new(image);

    let a_bytes = vec![1u8; 400];
    let b_bytes = vec![2u8; 400];
    fs.ingest(host_file_with(&a_bytes).path(), "a").unwrap();
    fs.ingest(host_file_with(&b_bytes).path(), "b").unwrap();

    let before = fs.image().superblock().free_count;
    fs.move_file("a", "b").unwrap();
    let after = fs.image().superblock().free_count;

    // b's original 2-block chain was freed; a's chain was relocated,
    // not duplicated, so only b's old blocks come back.
    assert_eq!(after - before, 2);

    let lines = fs.list();
    assert!(!lines.iter().any(|l| l.starts_with("a\t")));
    let mut out = Vec::new();
    fs.cat("b", &mut out).unwrap();
    assert_eq!(out, a_bytes);
}

#[test]
fn capacity_rejection_on_a_small_image_leaves_free_count_unchanged() {
    let path = fresh_image_path();
    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::C7).unwrap();
    let mut fs = VirtualFs::new(image);

    let before = fs.image().superblock().free_count;
    let too_big = vec![0u8; (before as usize + 5) * 256];
    let host_in = host_file_with(&too_big);

    let result = fs.ingest(host_in.path(), "big");
    assert!(result.is_err());
    assert_eq!(fs.image().superblock().free_count, before);
}

#[test]
fn reopening_an_existing_image_preserves_state() {
    let path = fresh_image_path();
    {
        let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
        let mut fs = VirtualFs::new(image);
        fs.make_dir("persisted").unwrap();
    }

    let image = Image::open_or_format(&path, BlockSize::DEFAULT, FatClass::DEFAULT).unwrap();
    let fs = VirtualFs::new(image);
    assert!(fs.list().iter().any(|l| l.starts_with("persisted")));
}

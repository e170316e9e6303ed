//! The container image: a single host file mapped into memory for the
//! process lifetime.
//!
//! The whole file is mapped once with `memmap2::MmapMut`; superblock,
//! FAT, and data-block reads and writes all go straight through that
//! mapping rather than through per-access `seek` + `read`/`write` calls.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use chrono::{Datelike, Local};
use log::{debug, info};
use memmap2::MmapMut;
use zerocopy::{FromBytes, IntoBytes};

use crate::error::ImageError;
use crate::params::{image_size, BlockSize, FatClass};
use crate::sys::dir_entry::RawDirEntry;
use crate::sys::superblock::RawSuperblock;

pub struct Image {
    mmap: MmapMut,
    block_size: BlockSize,
    fat_class: FatClass,
    _file: File,
}

impl Image {
    /// Opens `path` if it exists (validating it), otherwise creates and
    /// formats it with `requested_block_size`/`requested_fat_class`.
    pub fn open_or_format(
        path: &Path,
        requested_block_size: BlockSize,
        requested_fat_class: FatClass,
    ) -> Result<Image, ImageError> {
        let existed = path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        if existed {
            Self::open_existing(file, path)
        } else {
            Self::format_new(file, path, requested_block_size, requested_fat_class)
        }
    }

    fn open_existing(file: File, path: &Path) -> Result<Image, ImageError> {
        let len = file.metadata()?.len();
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        let (superblock, _) = RawSuperblock::ref_from_prefix(&mmap[..])
            .map_err(|_| ImageError::BadMagic(0))?;
        let (block_size, fat_class) = superblock.validate()?;

        let expected = image_size(block_size, fat_class);
        if expected != len {
            return Err(ImageError::SizeMismatch {
                expected,
                found: len,
            });
        }
        debug!("opened existing image {:?} ({} bytes)", path, len);
        mmap.flush()?;
        Ok(Image {
            mmap,
            block_size,
            fat_class,
            _file: file,
        })
    }

    fn format_new(
        file: File,
        path: &Path,
        block_size: BlockSize,
        fat_class: FatClass,
    ) -> Result<Image, ImageError> {
        let size = image_size(block_size, fat_class);
        info!("formatting {:?} ({} bytes)", path, size);
        file.set_len(size)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        let mut image = Image {
            mmap,
            block_size,
            fat_class,
            _file: file,
        };
        image.format()?;
        Ok(image)
    }

    fn format(&mut self) -> Result<(), ImageError> {
        let n = self.fat_class.block_count();

        *self.superblock_mut() = RawSuperblock::formatted(self.block_size, self.fat_class);

        self.fat_set(0, -1);
        for i in 1..n.saturating_sub(1) {
            self.fat_set(i, i as i32 + 1);
        }
        if n > 1 {
            self.fat_set(n - 1, -1);
        }

        let today = Local::now();
        let (day, month, year) = (today.day() as u8, today.month() as u8, (today.year() - 1900) as u8);

        let root_block = self.block_mut(0);
        root_block.fill(0);
        let mut dot = RawDirEntry::zeroed();
        dot.kind = crate::sys::dir_entry::KIND_DIR;
        dot.set_name(".");
        dot.day = day;
        dot.month = month;
        dot.year = year;
        dot.size = 2;
        dot.first_block = 0;

        let mut dotdot = RawDirEntry::zeroed();
        dotdot.kind = crate::sys::dir_entry::KIND_DIR;
        dotdot.set_name("..");
        dotdot.day = day;
        dotdot.month = month;
        dotdot.year = year;
        dotdot.size = 0;
        dotdot.first_block = 0;

        self.write_dir_entry(0, 0, &dot);
        self.write_dir_entry(0, 1, &dotdot);

        self.flush()?;
        Ok(())
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn fat_class(&self) -> FatClass {
        self.fat_class
    }

    pub fn block_count(&self) -> u32 {
        self.fat_class.block_count()
    }

    pub fn entries_per_block(&self) -> u32 {
        self.block_size.entries_per_block()
    }

    fn fat_offset(&self) -> usize {
        self.block_size.bytes() as usize
    }

    fn data_offset(&self) -> usize {
        self.fat_offset() + self.block_count() as usize * 4
    }

    pub fn superblock(&self) -> &RawSuperblock {
        RawSuperblock::ref_from_prefix(&self.mmap[..]).unwrap().0
    }

    pub fn superblock_mut(&mut self) -> &mut RawSuperblock {
        RawSuperblock::mut_from_prefix(&mut self.mmap[..]).unwrap().0
    }

    pub fn fat_get(&self, i: u32) -> i32 {
        let off = self.fat_offset() + i as usize * 4;
        i32::from_ne_bytes(self.mmap[off..off + 4].try_into().unwrap())
    }

    pub fn fat_set(&mut self, i: u32, value: i32) {
        let off = self.fat_offset() + i as usize * 4;
        self.mmap[off..off + 4].copy_from_slice(&value.to_ne_bytes());
    }

    pub fn block(&self, i: u32) -> &[u8] {
        let bs = self.block_size.bytes() as usize;
        let off = self.data_offset() + i as usize * bs;
        &self.mmap[off..off + bs]
    }

    pub fn block_mut(&mut self, i: u32) -> &mut [u8] {
        let bs = self.block_size.bytes() as usize;
        let off = self.data_offset() + i as usize * bs;
        &mut self.mmap[off..off + bs]
    }

    pub fn read_dir_entry(&self, block: u32, slot: u32) -> RawDirEntry {
        let size = crate::sys::dir_entry::RAW_DIR_ENTRY_SIZE;
        let off = slot as usize * size;
        let block = self.block(block);
        RawDirEntry::read_from_bytes(&block[off..off + size]).unwrap()
    }

    pub fn write_dir_entry(&mut self, block: u32, slot: u32, entry: &RawDirEntry) {
        let size = crate::sys::dir_entry::RAW_DIR_ENTRY_SIZE;
        let off = slot as usize * size;
        let block = self.block_mut(block);
        entry.write_to(&mut block[off..off + size]).unwrap();
    }

    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }
}

//! Namespace operations over a mounted image.
//!
//! `VirtualFs` owns the mapped `Image` and the current-directory head
//! block; every method here is a single command's worth of work,
//! following a reserve-then-commit discipline: compute total block
//! demand, reject on insufficient capacity, only then mutate.

use std::io;
use std::path::Path;

use chrono::{Datelike, Local};
use log::info;

use crate::alloc;
use crate::dir;
use crate::error::Error;
use crate::file;
use crate::image::Image;
use crate::sys::dir_entry::{RawDirEntry, KIND_DIR, KIND_FILE};

pub struct VirtualFs {
    image: Image,
    current_dir: u32,
}

fn today_stamp() -> (u8, u8, u8) {
    let now = Local::now();
    (now.day() as u8, now.month() as u8, (now.year() - 1900).max(0) as u8)
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn format_date(e: &RawDirEntry) -> String {
    let month = MONTHS
        .get((e.month as usize).saturating_sub(1))
        .copied()
        .unwrap_or("???");
    format!("{:02}-{}-{}", e.day, month, 1900 + e.year as i32)
}

fn render_entry(e: &RawDirEntry) -> String {
    let size_col = if e.is_dir() {
        "DIR".to_string()
    } else {
        e.size.to_string()
    };
    format!("{:<20}\t{}\t{}", e.name_str(), format_date(e), size_col)
}

fn init_empty_dir(image: &mut Image, head: u32, parent: u32) {
    let (day, month, year) = today_stamp();
    image.block_mut(head).fill(0);

    let mut dot = RawDirEntry::zeroed();
    dot.kind = KIND_DIR;
    dot.set_name(".");
    dot.day = day;
    dot.month = month;
    dot.year = year;
    dot.size = 2;
    dot.first_block = head as i32;
    image.write_dir_entry(head, 0, &dot);

    let mut dotdot = RawDirEntry::zeroed();
    dotdot.kind = KIND_DIR;
    dotdot.set_name("..");
    dotdot.day = day;
    dotdot.month = month;
    dotdot.year = year;
    dotdot.size = 0;
    dotdot.first_block = parent as i32;
    image.write_dir_entry(head, 1, &dotdot);
}

impl VirtualFs {
    pub fn new(image: Image) -> VirtualFs {
        let root = image.superblock().root_block as u32;
        VirtualFs {
            image,
            current_dir: root,
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    fn root(&self) -> u32 {
        self.image.superblock().root_block as u32
    }

    fn flush(&self) -> Result<(), Error> {
        self.image.flush().map_err(Error::HostIo)
    }

    /// Resolution rule shared by `cp` and `mv`: if `dst` names an
    /// existing directory, the target becomes that directory and the
    /// entry keeps `src_name`; if it names an existing file, that file
    /// is the overwrite target; otherwise `dst` is a plain name in the
    /// current directory.
    fn resolve_target(
        &self,
        src_name: &str,
        dst: &str,
    ) -> Result<(u32, String, Option<RawDirEntry>), Error> {
        match dir::find(&self.image, self.current_dir, dst) {
            Some((_, e)) if e.is_dir() => {
                let target_dir = e.first_block as u32;
                match dir::find(&self.image, target_dir, src_name) {
                    Some((_, existing)) if existing.is_file() => {
                        Ok((target_dir, src_name.to_string(), Some(existing)))
                    }
                    Some((_, existing)) if existing.is_dir() => {
                        Err(Error::AlreadyExists(src_name.to_string()))
                    }
                    _ => Ok((target_dir, src_name.to_string(), None)),
                }
            }
            Some((_, e)) if e.is_file() => Ok((self.current_dir, dst.to_string(), Some(e))),
            _ => Ok((self.current_dir, dst.to_string(), None)),
        }
    }

    pub fn list(&self) -> Vec<String> {
        let mut lines: Vec<String> = dir::entries(&self.image, self.current_dir)
            .iter()
            .map(render_entry)
            .collect();
        lines.sort();
        lines
    }

    pub fn make_dir(&mut self, name: &str) -> Result<(), Error> {
        dir::validate_name(name)?;
        if dir::find(&self.image, self.current_dir, name).is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        let tail_growth = dir::blocks_needed_for_append(&self.image, self.current_dir);
        let demand = 1 + tail_growth;
        if alloc::free_count(&self.image) < demand {
            return Err(Error::CapacityExhausted);
        }

        let head = alloc::acquire(&mut self.image)?;
        init_empty_dir(&mut self.image, head, self.current_dir);

        let (day, month, year) = today_stamp();
        let mut entry = RawDirEntry::zeroed();
        entry.kind = KIND_DIR;
        entry.set_name(name);
        entry.day = day;
        entry.month = month;
        entry.year = year;
        entry.size = 0;
        entry.first_block = head as i32;
        dir::append(&mut self.image, self.current_dir, entry)?;
        self.flush()
    }

    pub fn change_dir(&mut self, name: &str) -> Result<(), Error> {
        let (_, entry) =
            dir::find(&self.image, self.current_dir, name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.current_dir = entry.first_block as u32;
        Ok(())
    }

    pub fn print_working_dir(&self) -> String {
        let root = self.root();
        let mut components = Vec::new();
        let mut current = self.current_dir;
        while current != root {
            let parent = dir::entry_at(&self.image, current, 1).first_block as u32;
            let name = dir::entries(&self.image, parent)
                .into_iter()
                .find(|e| {
                    e.first_block as u32 == current && e.name_str() != "." && e.name_str() != ".."
                })
                .map(|e| e.name_str().to_string())
                .unwrap_or_default();
            components.push(name);
            current = parent;
        }
        components.reverse();
        format!("/{}", components.join("/"))
    }

    pub fn remove_dir(&mut self, name: &str) -> Result<(), Error> {
        let (_, entry) =
            dir::find(&self.image, self.current_dir, name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        if !entry.is_dir() {
            return Err(Error::TypeMismatch(name.to_string(), "directory"));
        }
        let target = entry.first_block as u32;
        if dir::live_count(&self.image, target) != 2 {
            return Err(Error::NotEmpty(name.to_string()));
        }
        alloc::release(&mut self.image, target);
        dir::remove_by_name(&mut self.image, self.current_dir, name)?;
        self.flush()
    }

    pub fn ingest(&mut self, host_path: &Path, name: &str) -> Result<(), Error> {
        dir::validate_name(name)?;
        if dir::find(&self.image, self.current_dir, name).is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        let meta = std::fs::metadata(host_path)?;
        if !meta.is_file() {
            return Err(Error::NotARegularFile {
                path: host_path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(host_path)?;
        let content_blocks = file::blocks_for_len(bytes.len() as u64, self.image.block_size().bytes());
        let tail_growth = dir::blocks_needed_for_append(&self.image, self.current_dir);
        let demand = content_blocks + tail_growth;
        if alloc::free_count(&self.image) < demand {
            return Err(Error::CapacityExhausted);
        }

        let head = file::create_from_bytes(&mut self.image, &bytes)?;
        let (day, month, year) = today_stamp();
        let mut entry = RawDirEntry::zeroed();
        entry.kind = KIND_FILE;
        entry.set_name(name);
        entry.day = day;
        entry.month = month;
        entry.year = year;
        entry.size = bytes.len() as i32;
        entry.first_block = head as i32;
        dir::append(&mut self.image, self.current_dir, entry)?;
        self.flush()
    }

    pub fn egress(&mut self, name: &str, host_path: &Path) -> Result<(), Error> {
        let (_, entry) =
            dir::find(&self.image, self.current_dir, name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        if !entry.is_file() {
            return Err(Error::TypeMismatch(name.to_string(), "file"));
        }
        let bytes = file::read_to_vec(&self.image, entry.first_block as u32, entry.size as u64);
        std::fs::write(host_path, bytes)?;
        Ok(())
    }

    pub fn cat(&self, name: &str, out: &mut impl io::Write) -> Result<(), Error> {
        let (_, entry) =
            dir::find(&self.image, self.current_dir, name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        if !entry.is_file() {
            return Err(Error::TypeMismatch(name.to_string(), "file"));
        }
        let bytes = file::read_to_vec(&self.image, entry.first_block as u32, entry.size as u64);
        out.write_all(&bytes)?;
        Ok(())
    }

    pub fn copy_file(&mut self, src: &str, dst: &str) -> Result<(), Error> {
        let (_, src_entry) =
            dir::find(&self.image, self.current_dir, src).ok_or_else(|| Error::NotFound(src.to_string()))?;
        if !src_entry.is_file() {
            return Err(Error::TypeMismatch(src.to_string(), "file"));
        }

        let (target_dir, dst_name, existing_file) = self.resolve_target(src, dst)?;

        let content_blocks = file::blocks_for_len(src_entry.size as u64, self.image.block_size().bytes());
        let tail_growth = if existing_file.is_some() {
            0
        } else {
            dir::blocks_needed_for_append(&self.image, target_dir)
        };
        let demand = content_blocks + tail_growth;
        // Capacity is checked before any existing destination is removed,
        // so a rejected copy never first deletes the file it would have
        // overwritten.
        if alloc::free_count(&self.image) < demand {
            return Err(Error::CapacityExhausted);
        }

        if let Some(existing) = &existing_file {
            info!("cp: overwriting existing file '{}'", dst_name);
            alloc::release_chain(&mut self.image, existing.first_block as u32);
            dir::remove_by_name(&mut self.image, target_dir, &dst_name)?;
        }

        let new_head =
            file::duplicate_chain(&mut self.image, src_entry.first_block as u32, src_entry.size as u64)?;
        let (day, month, year) = today_stamp();
        let mut entry = RawDirEntry::zeroed();
        entry.kind = KIND_FILE;
        entry.set_name(&dst_name);
        entry.day = day;
        entry.month = month;
        entry.year = year;
        entry.size = src_entry.size;
        entry.first_block = new_head as i32;
        dir::append(&mut self.image, target_dir, entry)?;
        self.flush()
    }

    pub fn move_file(&mut self, src: &str, dst: &str) -> Result<(), Error> {
        let (_, src_entry) =
            dir::find(&self.image, self.current_dir, src).ok_or_else(|| Error::NotFound(src.to_string()))?;
        if !src_entry.is_file() {
            return Err(Error::TypeMismatch(src.to_string(), "file"));
        }

        let (target_dir, dst_name, existing_file) = self.resolve_target(src, dst)?;

        // The chain is reused, not duplicated, so the only capacity that
        // can be missing is a directory-tail block in the target - and
        // only when the move is a net increase in that directory's
        // entry count (a plain in-place rename, or any overwrite, nets
        // zero and never needs a new block).
        let demand = if existing_file.is_some() || target_dir == self.current_dir {
            0
        } else {
            dir::blocks_needed_for_append(&self.image, target_dir)
        };
        if alloc::free_count(&self.image) < demand {
            return Err(Error::CapacityExhausted);
        }

        if let Some(existing) = &existing_file {
            let is_self_overwrite = target_dir == self.current_dir && dst_name == src;
            if !is_self_overwrite {
                info!("mv: overwriting existing file '{}'", dst_name);
                alloc::release_chain(&mut self.image, existing.first_block as u32);
                dir::remove_by_name(&mut self.image, target_dir, &dst_name)?;
            }
        }

        // Re-resolve `src` fresh, after any destination removal above: a
        // swap-with-last in the same directory can have moved `src`
        // into a different slot. `remove_by_name` captures the entry's
        // fields before its own swap touches that slot, so the chain
        // relocated below is always the one that was actually named.
        let removed = dir::remove_by_name(&mut self.image, self.current_dir, src)?;

        let (day, month, year) = today_stamp();
        let mut entry = RawDirEntry::zeroed();
        entry.kind = KIND_FILE;
        entry.set_name(&dst_name);
        entry.day = day;
        entry.month = month;
        entry.year = year;
        entry.size = removed.size;
        entry.first_block = removed.first_block;
        dir::append(&mut self.image, target_dir, entry)?;
        self.flush()
    }

    pub fn remove_file(&mut self, name: &str) -> Result<(), Error> {
        let (_, entry) =
            dir::find(&self.image, self.current_dir, name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        if !entry.is_file() {
            return Err(Error::TypeMismatch(name.to_string(), "file"));
        }
        alloc::release_chain(&mut self.image, entry.first_block as u32);
        dir::remove_by_name(&mut self.image, self.current_dir, name)?;
        self.flush()
    }
}

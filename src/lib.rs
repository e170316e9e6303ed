//! A single-file virtual filesystem: a FAT-style block allocator,
//! chained directory entries, and singly-linked file content chains,
//! operated through a small set of namespace commands.

pub mod alloc;
pub mod cli;
pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod image;
pub mod params;
pub mod repl;
pub mod sys;

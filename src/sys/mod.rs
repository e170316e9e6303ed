//! On-disk record layouts, read and written directly as byte ranges of
//! the mapped container image via `zerocopy`.

pub mod dir_entry;
pub mod superblock;

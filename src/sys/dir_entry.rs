use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Directory entry type tag.
pub const KIND_DIR: u8 = b'D';
pub const KIND_FILE: u8 = b'F';

/// Maximum visible characters in a name; the 20-byte field holds this
/// many bytes plus a NUL terminator/pad.
pub const MAX_NAME_LEN: usize = 19;

/// A fixed-size directory entry: 1 + 20 + 1 + 1 + 1 + 4 + 4 = 32 bytes,
/// every field already falling on a naturally aligned offset so no
/// `repr(packed)` is required.
#[repr(C)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct RawDirEntry {
    /// `KIND_DIR` or `KIND_FILE`.
    pub kind: u8,
    /// NUL-terminated, null-padded name; at most `MAX_NAME_LEN` visible bytes.
    pub name: [u8; 20],
    /// Day of month, 1..31.
    pub day: u8,
    /// Month, 1..12.
    pub month: u8,
    /// Years since 1900.
    pub year: u8,
    /// For files: byte length of the content chain. For `.`: the
    /// directory's live-entry count.
    pub size: i32,
    /// Head data block of the entry's payload chain (file content, or
    /// the subdirectory's own head block).
    pub first_block: i32,
}

pub const RAW_DIR_ENTRY_SIZE: usize = core::mem::size_of::<RawDirEntry>();

impl RawDirEntry {
    pub fn zeroed() -> RawDirEntry {
        RawDirEntry {
            kind: 0,
            name: [0; 20],
            day: 0,
            month: 0,
            year: 0,
            size: 0,
            first_block: 0,
        }
    }

    pub fn name_str(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(20);
        // Names are validated ASCII at creation time (see fs::validate_name).
        std::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = [0; 20];
        self.name[..name.len()].copy_from_slice(name.as_bytes());
    }

    pub fn is_dir(&self) -> bool {
        self.kind == KIND_DIR
    }

    pub fn is_file(&self) -> bool {
        self.kind == KIND_FILE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_32_bytes() {
        assert_eq!(RAW_DIR_ENTRY_SIZE, 32);
    }

    #[test]
    fn name_round_trip() {
        let mut e = RawDirEntry::zeroed();
        e.set_name("hello");
        assert_eq!(e.name_str(), "hello");
    }
}

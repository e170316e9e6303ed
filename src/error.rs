use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating or formatting a container image.
///
/// Fatal at startup: the process reports these and exits non-zero before
/// any command loop runs.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("bad magic: expected 9999, found {0}")]
    BadMagic(i32),
    #[error("image size mismatch: expected {expected} bytes, found {found}")]
    SizeMismatch { expected: u64, found: u64 },
    #[error("superblock block size {0} is not one of 128, 256, 512, 1024")]
    BadBlockSize(i32),
    #[error("superblock fat class {0} is not one of 7, 8, 9, 10")]
    BadFatClass(i32),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised by a single namespace operation (`ls`, `mkdir`, `cp`, ...).
///
/// Every variant here is non-fatal: the REPL reports one `ERROR(...)` line
/// and the command loop continues, the filesystem left unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("'{0}' already exists")]
    AlreadyExists(String),
    #[error("'{0}' is not a {1}")]
    TypeMismatch(String, &'static str),
    #[error("'{0}' is not empty")]
    NotEmpty(String),
    #[error("name '{0}' is too long (max 19 characters)")]
    NameTooLong(String),
    #[error("disk space is full")]
    CapacityExhausted,
    #[error("host path '{path:?}' is not a regular file")]
    NotARegularFile { path: PathBuf },
    #[error(transparent)]
    HostIo(#[from] io::Error),
}

/// Errors raised by the line reader / dispatcher before a command's
/// operation runs.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("'{command}' - too few arguments")]
    TooFewArguments { command: String },
    #[error("'{command}' - too many arguments")]
    TooManyArguments { command: String },
    #[error("command not found")]
    UnknownCommand,
}

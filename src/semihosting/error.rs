// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

use std::io;

use thiserror::Error;

use super::handles::Handle;

/// Errors surfaced by semihosting operations that propagate instead of
/// returning a sentinel.
#[derive(Debug, Error)]
pub enum SemihostError {
    /// Open mode code outside the 0..=11 table.
    #[error("wrong open mode {0}")]
    InvalidMode(i32),
    /// Handle is not present in the handle table.
    #[error("file {0} not open")]
    BadHandle(Handle),
    /// Every handle value has been handed out.
    #[error("no free semihosting handles")]
    HandlesExhausted,
    /// The backing resource could not be opened.
    #[error("cannot open {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Request number outside the supported call set.
    #[error("unknown semihosting call 0x{0:02x}")]
    UnknownSyscall(u32),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the semihosting handler.
pub type SemihostResult<T> = Result<T, SemihostError>;

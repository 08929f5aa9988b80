// CLASSIFICATION: COMMUNITY
// Filename: mode.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Translation of semihosting open-mode codes (0..=11) into host open modes.
//!
//! The code encodes an fopen string: `code / 4` picks read, write or append,
//! bit 1 selects update (`+`) and bit 0 selects binary.

use std::fs::OpenOptions;
use std::fmt;

use super::error::{SemihostError, SemihostResult};

/// Number of entries in the mode table.
pub const MODE_COUNT: usize = 12;

/// Primary access direction of an open mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Append,
}

/// Text or binary stream. The host treats both identically.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Text,
    Binary,
}

/// Symbolic open mode, equivalent to one fopen mode string.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub access: Access,
    pub encoding: Encoding,
    /// `+` modes: read and write on the same stream.
    pub update: bool,
}

impl OpenMode {
    const fn from_code(code: usize) -> Self {
        let access = match code / 4 {
            0 => Access::Read,
            1 => Access::Write,
            _ => Access::Append,
        };
        let encoding = if code & 1 == 1 {
            Encoding::Binary
        } else {
            Encoding::Text
        };
        Self {
            access,
            encoding,
            update: code & 2 == 2,
        }
    }

    /// fopen style mode string, e.g. `"r+b"`.
    pub fn as_str(&self) -> &'static str {
        match (self.access, self.update, self.encoding) {
            (Access::Read, false, Encoding::Text) => "r",
            (Access::Read, false, Encoding::Binary) => "rb",
            (Access::Read, true, Encoding::Text) => "r+",
            (Access::Read, true, Encoding::Binary) => "r+b",
            (Access::Write, false, Encoding::Text) => "w",
            (Access::Write, false, Encoding::Binary) => "wb",
            (Access::Write, true, Encoding::Text) => "w+",
            (Access::Write, true, Encoding::Binary) => "w+b",
            (Access::Append, false, Encoding::Text) => "a",
            (Access::Append, false, Encoding::Binary) => "ab",
            (Access::Append, true, Encoding::Text) => "a+",
            (Access::Append, true, Encoding::Binary) => "a+b",
        }
    }

    /// Host open options matching the fopen semantics of this mode.
    pub fn options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self.access {
            Access::Read => {
                opts.read(true).write(self.update);
            }
            Access::Write => {
                opts.write(true).create(true).truncate(true).read(self.update);
            }
            Access::Append => {
                opts.append(true).create(true).read(self.update);
            }
        }
        opts
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable mapping from mode code to [`OpenMode`].
#[derive(Clone, Debug)]
pub struct ModeTable {
    modes: [OpenMode; MODE_COUNT],
}

impl ModeTable {
    /// Build the table with all twelve modes.
    pub fn new() -> Self {
        let mut modes = [OpenMode::from_code(0); MODE_COUNT];
        for (code, slot) in modes.iter_mut().enumerate() {
            *slot = OpenMode::from_code(code);
        }
        Self { modes }
    }

    /// Look up a mode code, rejecting anything outside 0..=11.
    pub fn lookup(&self, code: i32) -> SemihostResult<OpenMode> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.modes.get(idx).copied())
            .ok_or(SemihostError::InvalidMode(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenMode> {
        self.modes.iter()
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::new()
    }
}

// CLASSIFICATION: COMMUNITY
// Filename: handles.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Handle table mapping semihosting handles to open resources.

use std::collections::BTreeMap;

use super::error::{SemihostError, SemihostResult};

/// Integer identifier handed to the target for an open resource.
pub type Handle = i32;

/// Console input handle.
pub const STDIN: Handle = 0;
/// Console output handle.
pub const STDOUT: Handle = 1;
/// Console error handle. Writes land on console output.
pub const STDERR: Handle = 2;
/// Lowest handle available for files.
pub const FIRST_FILE_HANDLE: Handle = 3;
/// Highest configurable first file handle.
pub const MAX_FIRST_HANDLE: Handle = 0x4000_0000;

/// True for the three reserved console handles.
pub fn is_console(handle: Handle) -> bool {
    (STDIN..=STDERR).contains(&handle)
}

/// Resource bound to a handle.
#[derive(Debug)]
pub enum Resource<F> {
    ConsoleIn,
    ConsoleOut,
    ConsoleErr,
    File(F),
}

impl<F> Resource<F> {
    pub fn is_console(&self) -> bool {
        !matches!(self, Resource::File(_))
    }
}

/// Table of open handles plus the monotonic allocation counter.
#[derive(Debug)]
pub struct HandleTable<F> {
    entries: BTreeMap<Handle, Resource<F>>,
    last: Handle,
}

impl<F> HandleTable<F> {
    /// Seed the console handles. The first file gets `first_handle`,
    /// clamped so it never collides with a console handle.
    pub fn new(first_handle: Handle) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(STDIN, Resource::ConsoleIn);
        entries.insert(STDOUT, Resource::ConsoleOut);
        entries.insert(STDERR, Resource::ConsoleErr);
        Self {
            entries,
            last: first_handle.max(FIRST_FILE_HANDLE) - 1,
        }
    }

    /// Bind a new file and return its handle.
    pub fn insert(&mut self, file: F) -> SemihostResult<Handle> {
        let handle = self
            .last
            .checked_add(1)
            .ok_or(SemihostError::HandlesExhausted)?;
        self.entries.insert(handle, Resource::File(file));
        self.last = handle;
        Ok(handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> SemihostResult<&mut Resource<F>> {
        self.entries
            .get_mut(&handle)
            .ok_or(SemihostError::BadHandle(handle))
    }

    /// Drop the entry for `handle` unless it is a console handle. Returns
    /// the removed resource, if any.
    pub fn release(&mut self, handle: Handle) -> SemihostResult<Option<Resource<F>>> {
        let entry = self
            .entries
            .get(&handle)
            .ok_or(SemihostError::BadHandle(handle))?;
        if entry.is_console() {
            return Ok(None);
        }
        Ok(self.entries.remove(&handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest handle handed out so far.
    pub fn last_assigned(&self) -> Handle {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_consoles() {
        let table: HandleTable<()> = HandleTable::new(FIRST_FILE_HANDLE);
        assert_eq!(table.len(), 3);
        assert!(table.contains(STDIN) && table.contains(STDOUT) && table.contains(STDERR));
        assert_eq!(table.last_assigned(), 2);
    }

    #[test]
    fn allocation_is_monotonic_across_release() {
        let mut table = HandleTable::new(FIRST_FILE_HANDLE);
        let a = table.insert("a").unwrap();
        let b = table.insert("b").unwrap();
        assert_eq!((a, b), (3, 4));
        assert!(table.release(b).unwrap().is_some());
        assert_eq!(table.insert("c").unwrap(), 5);
    }

    #[test]
    fn console_entries_survive_release() {
        let mut table: HandleTable<()> = HandleTable::new(FIRST_FILE_HANDLE);
        for h in [STDIN, STDOUT, STDERR] {
            assert!(table.release(h).unwrap().is_none());
            assert!(table.contains(h));
        }
        assert!(matches!(table.release(9), Err(SemihostError::BadHandle(9))));
    }

    #[test]
    fn first_handle_never_below_reserved_range() {
        let mut table = HandleTable::new(1);
        assert_eq!(table.insert(()).unwrap(), FIRST_FILE_HANDLE);
        let mut table = HandleTable::new(10);
        assert_eq!(table.insert(()).unwrap(), 10);
    }

    #[test]
    fn allocation_stops_at_handle_limit() {
        let mut table = HandleTable::new(Handle::MAX);
        assert_eq!(table.insert("last").unwrap(), Handle::MAX);
        assert!(matches!(
            table.insert("overflow"),
            Err(SemihostError::HandlesExhausted)
        ));
        assert_eq!(table.last_assigned(), Handle::MAX);
        assert_eq!(table.len(), 4);
    }
}

// CLASSIFICATION: COMMUNITY
// Filename: host.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Host collaborators consumed by the semihosting handler: a byte
//! addressable filesystem and the standing console streams.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use super::mode::OpenMode;

/// Open file as seen by the handler. `tell` is `stream_position`.
pub trait HostFile: Read + Write + Seek {}

impl<T: Read + Write + Seek> HostFile for T {}

/// Filesystem the handler opens, removes and renames files on.
pub trait HostFs {
    type File: HostFile;

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<Self::File>;
    fn exists(&self, name: &str) -> bool;
    fn remove(&self, name: &str) -> io::Result<()>;
    fn rename(&self, from: &str, to: &str) -> io::Result<()>;
}

/// Console streams. Input is read a byte at a time; `Ok(None)` is end of
/// input. Console error output shares the output stream.
pub trait Console {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
    fn write_out(&mut self, data: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Filesystem rooted at a host directory. Absolute names bypass the root.
#[derive(Clone, Debug)]
pub struct StdFs {
    root: PathBuf,
}

impl StdFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Host path for a target supplied name.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

impl Default for StdFs {
    fn default() -> Self {
        Self::new(".")
    }
}

impl HostFs for StdFs {
    type File = File;

    fn open(&self, name: &str, mode: OpenMode) -> io::Result<File> {
        mode.options().open(self.resolve(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_file()
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(name))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.resolve(from), self.resolve(to))
    }
}

/// Console bound to the process stdin and stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match io::stdin().lock().read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_out(&mut self, data: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(data)?;
        // echo must be visible before the next blocking read
        out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// In-memory console with scripted input and captured output.
#[derive(Clone, Debug, Default)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Vec::new(),
        }
    }

    /// Everything written to console output so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_out(&mut self, data: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// CLASSIFICATION: COMMUNITY
// Filename: handler.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Semihosting request handler.
//!
//! [`Semihost`] owns the handle table, the mode table, the host filesystem
//! and the console. Each operation runs to completion on the caller's thread.
//! Two failure policies coexist: seek, flen, remove, rename and bulk read
//! turn host I/O failures into sentinels (`-1` or an empty buffer), while
//! open, write, readc, bad mode codes and unknown handles propagate a
//! [`SemihostError`].

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use super::error::{SemihostError, SemihostResult};
use super::handles::{is_console, Handle, HandleTable, Resource};
use super::host::{Console, HostFs};
use super::mode::{Access, ModeTable};
use crate::config::SemihostConfig;

/// Pseudo-file routed onto the console handles.
pub const TT_NAME: &str = ":tt";
/// Pseudo-file redirected to the feature-bits backing file.
pub const FEATURES_NAME: &str = ":semihosting-features";
/// Contents written to a fresh feature-bits file.
pub const FEATURE_MARKER: [u8; 5] = *b"SHFB\x03";
/// Reported tick frequency in Hz.
pub const TICK_FREQ: i32 = 100;

const PROMPT: &[u8] = b"? ";
const MODE_WRITE_BINARY: i32 = 5;

/// One semihosting session.
pub struct Semihost<F: HostFs, C: Console> {
    fs: F,
    console: C,
    handles: HandleTable<F::File>,
    modes: ModeTable,
    config: SemihostConfig,
    clock_origin: Option<Instant>,
}

impl<F: HostFs, C: Console> Semihost<F, C> {
    /// Seed the console handles and the mode table. Nothing else needs to
    /// run before the first request.
    pub fn init(fs: F, console: C, config: SemihostConfig) -> Self {
        info!(
            "semihosting init: first handle {}, features at {}",
            config.first_handle, config.features_path
        );
        Self {
            fs,
            console,
            handles: HandleTable::new(config.first_handle),
            modes: ModeTable::new(),
            config,
            clock_origin: None,
        }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn handles(&self) -> &HandleTable<F::File> {
        &self.handles
    }

    /// Open `name` with mode code `mode` (0..=11).
    pub fn open(&mut self, name: &str, mode: i32) -> SemihostResult<Handle> {
        let open_mode = self.modes.lookup(mode)?;
        if name == TT_NAME {
            return Ok(mode / 4);
        }
        let (path, seeded) = if name == FEATURES_NAME {
            let created = self.ensure_features_file()?;
            (self.config.features_path.clone(), created)
        } else {
            (name.to_string(), false)
        };
        let mut file = self
            .fs
            .open(&path, open_mode)
            .map_err(|source| SemihostError::Unavailable {
                path: path.clone(),
                source,
            })?;
        if seeded && open_mode.access == Access::Write {
            // the truncating open just discarded the fresh marker
            file.write_all(&FEATURE_MARKER)?;
        }
        let handle = self.handles.insert(file)?;
        info!("open {} ({}) -> handle {}", path, open_mode, handle);
        Ok(handle)
    }

    /// Create the feature bits file if missing. Returns true if created.
    fn ensure_features_file(&mut self) -> SemihostResult<bool> {
        let path = self.config.features_path.clone();
        if self.fs.exists(&path) {
            return Ok(false);
        }
        let mode = self.modes.lookup(MODE_WRITE_BINARY)?;
        let mut file = self
            .fs
            .open(&path, mode)
            .map_err(|source| SemihostError::Unavailable {
                path: path.clone(),
                source,
            })?;
        file.write_all(&FEATURE_MARKER)?;
        file.flush()?;
        info!("created feature bits file {}", path);
        Ok(true)
    }

    /// Close `handle`. Console handles stay in the table.
    pub fn close(&mut self, handle: Handle) -> SemihostResult<i32> {
        let flushed = match self.handles.get_mut(handle)? {
            Resource::File(file) => file.flush(),
            Resource::ConsoleIn | Resource::ConsoleOut | Resource::ConsoleErr => {
                self.console.flush()
            }
        };
        if let Err(e) = flushed {
            warn!("flush on close of handle {} failed: {}", handle, e);
        }
        if self.handles.release(handle)?.is_some() {
            info!("closed handle {}", handle);
        }
        Ok(0)
    }

    /// Bulk read of up to `len` bytes. Console input reads an echoed line
    /// instead. I/O failures yield an empty buffer.
    pub fn read(&mut self, handle: Handle, len: usize) -> SemihostResult<Vec<u8>> {
        let result = match self.handles.get_mut(handle)? {
            Resource::ConsoleIn => read_console_line(&mut self.console, len),
            Resource::File(file) => read_file(file, len),
            Resource::ConsoleOut | Resource::ConsoleErr => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("handle {} is console output", handle),
            )),
        };
        Ok(result.unwrap_or_else(|e| {
            warn!("read on handle {} failed: {}", handle, e);
            Vec::new()
        }))
    }

    /// Read one byte from the console, echo it and return its value.
    pub fn readc(&mut self) -> SemihostResult<i32> {
        let ch = self.console.read_byte()?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "console input closed")
        })?;
        self.console.write_out(&[ch])?;
        Ok(i32::from(ch))
    }

    /// Write `data`; console output and console error share one stream.
    /// Returns `data.len()`.
    pub fn write(&mut self, handle: Handle, data: &[u8]) -> SemihostResult<usize> {
        match self.handles.get_mut(handle)? {
            Resource::ConsoleOut | Resource::ConsoleErr => self.console.write_out(data)?,
            Resource::File(file) => file.write_all(data)?,
            Resource::ConsoleIn => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "console input is read-only",
                )
                .into())
            }
        }
        Ok(data.len())
    }

    /// Absolute seek. `0` on success, `-1` on any failure.
    pub fn seek(&mut self, handle: Handle, offset: u64) -> i32 {
        let result = self
            .file_mut(handle)
            .and_then(|file| file.seek(SeekFrom::Start(offset)).map_err(SemihostError::from));
        match result {
            Ok(_) => 0,
            Err(e) => {
                warn!("seek on handle {} failed: {}", handle, e);
                -1
            }
        }
    }

    /// Length of the file behind `handle`, `-1` for consoles or on failure.
    pub fn flen(&mut self, handle: Handle) -> i64 {
        if is_console(handle) {
            return -1;
        }
        match self.measure(handle) {
            Ok(len) => i64::try_from(len).unwrap_or(-1),
            Err(e) => {
                warn!("flen on handle {} failed: {}", handle, e);
                -1
            }
        }
    }

    fn measure(&mut self, handle: Handle) -> SemihostResult<u64> {
        let file = self.file_mut(handle)?;
        let pos = file.stream_position()?;
        let end = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    fn file_mut(&mut self, handle: Handle) -> SemihostResult<&mut F::File> {
        match self.handles.get_mut(handle)? {
            Resource::File(file) => Ok(file),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("handle {} is a console stream", handle),
            )
            .into()),
        }
    }

    pub fn remove(&mut self, name: &str) -> i32 {
        match self.fs.remove(name) {
            Ok(()) => 0,
            Err(e) => {
                warn!("remove {} failed: {}", name, e);
                -1
            }
        }
    }

    pub fn rename(&mut self, from: &str, to: &str) -> i32 {
        match self.fs.rename(from, to) {
            Ok(()) => 0,
            Err(e) => {
                warn!("rename {} -> {} failed: {}", from, to, e);
                -1
            }
        }
    }

    /// No error code is retained between calls.
    pub fn errno(&self) -> i32 {
        0
    }

    /// Every value is classified as a non-error.
    pub fn iserror(&self, _code: i32) -> i32 {
        0
    }

    pub fn istty(&self, handle: Handle) -> i32 {
        i32::from(is_console(handle))
    }

    /// Elapsed ticks are not tracked.
    pub fn elapsed(&self) -> i64 {
        -1
    }

    pub fn tickfreq(&self) -> i32 {
        TICK_FREQ
    }

    /// Command execution is disabled; `command` is only logged.
    pub fn system(&mut self, command: &str) -> i32 {
        warn!("system call ignored: {:?}", command);
        0
    }

    /// Centiseconds since the first clock request of this session.
    pub fn clock(&mut self) -> i32 {
        let origin = *self.clock_origin.get_or_insert_with(Instant::now);
        i32::try_from(origin.elapsed().as_millis() / 10).unwrap_or(i32::MAX)
    }

    /// Seconds since the Unix epoch.
    pub fn time(&self) -> i32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(epoch_seconds)
            .unwrap_or(0)
    }

    /// NUL terminated temporary file name for `target_id`, if it is in
    /// 0..=255 and the name fits in `buf_size` bytes.
    pub fn tmpnam(&self, target_id: i32, buf_size: usize) -> Option<Vec<u8>> {
        let id = u8::try_from(target_id).ok()?;
        let mut name = b"tempXX.tmp\0".to_vec();
        name[4] = b'A' + (id >> 4 & 0xF);
        name[5] = b'A' + (id & 0xF);
        (name.len() <= buf_size).then_some(name)
    }

    pub fn writec(&mut self, ch: u8) -> SemihostResult<()> {
        self.console.write_out(&[ch])?;
        Ok(())
    }

    /// Write `text` to the console up to its first NUL.
    pub fn write0(&mut self, text: &[u8]) -> SemihostResult<()> {
        let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
        self.console.write_out(&text[..end])?;
        Ok(())
    }

    /// NUL terminated command line if it fits in `buf_len` bytes.
    pub fn cmdline(&self, buf_len: usize) -> Option<Vec<u8>> {
        let mut line = self.config.cmdline.as_bytes().to_vec();
        line.push(0);
        (line.len() <= buf_len).then_some(line)
    }

    /// Heap and stack bounds as four little-endian words.
    pub fn heap_info(&self) -> Vec<u8> {
        self.config
            .heap_info
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect()
    }

    /// Report target exit on the console.
    pub fn exit(&mut self, code: u64) -> SemihostResult<()> {
        info!("target exit 0x{:x}", code);
        self.console.write_out(format!("_exit(0x{:x})\n", code).as_bytes())?;
        self.console.flush()?;
        Ok(())
    }

    pub(crate) fn trace(&self, what: &str) {
        debug!("semihosting {} ({} handles open)", what, self.handles.len());
    }
}

fn read_console_line<C: Console>(console: &mut C, len: usize) -> io::Result<Vec<u8>> {
    console.write_out(PROMPT)?;
    let mut line = Vec::new();
    for _ in 1..len {
        let Some(mut ch) = console.read_byte()? else {
            break;
        };
        console.write_out(&[ch])?;
        if ch == b'\r' {
            ch = b'\n';
        }
        line.push(ch);
        if ch == b'\n' {
            break;
        }
    }
    Ok(line)
}

fn read_file<R: Read>(file: &mut R, len: usize) -> io::Result<Vec<u8>> {
    // `len` comes from the target; let the read size the buffer
    let mut buf = Vec::new();
    file.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

fn epoch_seconds(since_epoch: Duration) -> i32 {
    i32::try_from(since_epoch.as_secs()).unwrap_or(i32::MAX)
}

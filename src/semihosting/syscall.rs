// CLASSIFICATION: COMMUNITY
// Filename: syscall.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! ARM semihosting call numbers and request dispatch.
//!
//! Requests arrive with their arguments already decoded from target memory.
//! [`Semihost::dispatch`] turns every handler result into the register value
//! the target expects, plus any bytes to copy back into the target buffer.

use log::{debug, warn};

use super::error::{SemihostError, SemihostResult};
use super::handler::Semihost;
use super::handles::Handle;
use super::host::{Console, HostFs};

/// Semihosting operation numbers (Semihosting for AArch32 and AArch64, v3.0).
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SysCall {
    Open = 0x01,
    Close = 0x02,
    Writec = 0x03,
    Write0 = 0x04,
    Write = 0x05,
    Read = 0x06,
    Readc = 0x07,
    IsError = 0x08,
    IsTty = 0x09,
    Seek = 0x0A,
    Flen = 0x0C,
    Tmpnam = 0x0D,
    Remove = 0x0E,
    Rename = 0x0F,
    Clock = 0x10,
    Time = 0x11,
    System = 0x12,
    Errno = 0x13,
    GetCmdline = 0x15,
    HeapInfo = 0x16,
    Exit = 0x18,
    ExitExtended = 0x20,
    Elapsed = 0x30,
    TickFreq = 0x31,
}

impl SysCall {
    const ALL: [SysCall; 24] = [
        SysCall::Open,
        SysCall::Close,
        SysCall::Writec,
        SysCall::Write0,
        SysCall::Write,
        SysCall::Read,
        SysCall::Readc,
        SysCall::IsError,
        SysCall::IsTty,
        SysCall::Seek,
        SysCall::Flen,
        SysCall::Tmpnam,
        SysCall::Remove,
        SysCall::Rename,
        SysCall::Clock,
        SysCall::Time,
        SysCall::System,
        SysCall::Errno,
        SysCall::GetCmdline,
        SysCall::HeapInfo,
        SysCall::Exit,
        SysCall::ExitExtended,
        SysCall::Elapsed,
        SysCall::TickFreq,
    ];

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            SysCall::Open => "SYS_OPEN",
            SysCall::Close => "SYS_CLOSE",
            SysCall::Writec => "SYS_WRITEC",
            SysCall::Write0 => "SYS_WRITE0",
            SysCall::Write => "SYS_WRITE",
            SysCall::Read => "SYS_READ",
            SysCall::Readc => "SYS_READC",
            SysCall::IsError => "SYS_ISERROR",
            SysCall::IsTty => "SYS_ISTTY",
            SysCall::Seek => "SYS_SEEK",
            SysCall::Flen => "SYS_FLEN",
            SysCall::Tmpnam => "SYS_TMPNAM",
            SysCall::Remove => "SYS_REMOVE",
            SysCall::Rename => "SYS_RENAME",
            SysCall::Clock => "SYS_CLOCK",
            SysCall::Time => "SYS_TIME",
            SysCall::System => "SYS_SYSTEM",
            SysCall::Errno => "SYS_ERRNO",
            SysCall::GetCmdline => "SYS_GET_CMDLINE",
            SysCall::HeapInfo => "SYS_HEAPINFO",
            SysCall::Exit => "SYS_EXIT",
            SysCall::ExitExtended => "SYS_EXIT_EXTENDED",
            SysCall::Elapsed => "SYS_ELAPSED",
            SysCall::TickFreq => "SYS_TICKFREQ",
        }
    }
}

impl TryFrom<u32> for SysCall {
    type Error = SemihostError;

    fn try_from(number: u32) -> SemihostResult<Self> {
        SysCall::ALL
            .iter()
            .copied()
            .find(|call| call.number() == number)
            .ok_or(SemihostError::UnknownSyscall(number))
    }
}

/// A decoded semihosting request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Open { name: String, mode: i32 },
    Close { handle: Handle },
    Writec { ch: u8 },
    Write0 { text: Vec<u8> },
    Write { handle: Handle, data: Vec<u8> },
    Read { handle: Handle, len: usize },
    Readc,
    IsError { code: i32 },
    IsTty { handle: Handle },
    Seek { handle: Handle, offset: u64 },
    Flen { handle: Handle },
    Tmpnam { target_id: i32, buf_size: usize },
    Remove { name: String },
    Rename { from: String, to: String },
    Clock,
    Time,
    System { command: String },
    Errno,
    GetCmdline { buf_len: usize },
    HeapInfo,
    Exit { code: u32 },
    ExitExtended { code: u64 },
    Elapsed,
    TickFreq,
}

impl Request {
    pub fn syscall(&self) -> SysCall {
        match self {
            Request::Open { .. } => SysCall::Open,
            Request::Close { .. } => SysCall::Close,
            Request::Writec { .. } => SysCall::Writec,
            Request::Write0 { .. } => SysCall::Write0,
            Request::Write { .. } => SysCall::Write,
            Request::Read { .. } => SysCall::Read,
            Request::Readc => SysCall::Readc,
            Request::IsError { .. } => SysCall::IsError,
            Request::IsTty { .. } => SysCall::IsTty,
            Request::Seek { .. } => SysCall::Seek,
            Request::Flen { .. } => SysCall::Flen,
            Request::Tmpnam { .. } => SysCall::Tmpnam,
            Request::Remove { .. } => SysCall::Remove,
            Request::Rename { .. } => SysCall::Rename,
            Request::Clock => SysCall::Clock,
            Request::Time => SysCall::Time,
            Request::System { .. } => SysCall::System,
            Request::Errno => SysCall::Errno,
            Request::GetCmdline { .. } => SysCall::GetCmdline,
            Request::HeapInfo => SysCall::HeapInfo,
            Request::Exit { .. } => SysCall::Exit,
            Request::ExitExtended { .. } => SysCall::ExitExtended,
            Request::Elapsed => SysCall::Elapsed,
            Request::TickFreq => SysCall::TickFreq,
        }
    }
}

/// Result of a dispatched request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    /// Value for the target's result register.
    pub value: i32,
    /// Bytes to store into the target buffer, if any.
    pub data: Vec<u8>,
    /// The target asked to stop.
    pub halt: bool,
}

impl Reply {
    pub fn value(value: i32) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    fn with_data(value: i32, data: Vec<u8>) -> Self {
        Self {
            value,
            data,
            halt: false,
        }
    }
}

fn clamp(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(-1)
}

impl<F: HostFs, C: Console> Semihost<F, C> {
    /// Run one request. Propagated handler errors become `-1`.
    pub fn dispatch(&mut self, request: Request) -> Reply {
        let call = request.syscall();
        self.trace(call.name());
        match self.dispatch_inner(request) {
            Ok(reply) => {
                debug!("{} -> {}", call.name(), reply.value);
                reply
            }
            Err(e) => {
                warn!("{} failed: {}", call.name(), e);
                Reply::value(-1)
            }
        }
    }

    fn dispatch_inner(&mut self, request: Request) -> SemihostResult<Reply> {
        let reply = match request {
            Request::Open { name, mode } => Reply::value(self.open(&name, mode)?),
            Request::Close { handle } => Reply::value(self.close(handle)?),
            Request::Writec { ch } => {
                self.writec(ch)?;
                Reply::value(0)
            }
            Request::Write0 { text } => {
                self.write0(&text)?;
                Reply::value(0)
            }
            Request::Write { handle, data } => {
                let written = self.write(handle, &data)?;
                Reply::value(clamp(written as i64))
            }
            Request::Read { handle, len } => {
                let mut data = self.read(handle, len)?;
                data.truncate(len);
                let unread = len - data.len();
                Reply::with_data(i32::try_from(unread).unwrap_or(i32::MAX), data)
            }
            Request::Readc => Reply::value(self.readc()?),
            Request::IsError { code } => Reply::value(self.iserror(code)),
            Request::IsTty { handle } => Reply::value(self.istty(handle)),
            Request::Seek { handle, offset } => Reply::value(self.seek(handle, offset)),
            Request::Flen { handle } => Reply::value(clamp(self.flen(handle))),
            Request::Tmpnam {
                target_id,
                buf_size,
            } => match self.tmpnam(target_id, buf_size) {
                Some(name) => Reply::with_data(0, name),
                None => Reply::value(-1),
            },
            Request::Remove { name } => Reply::value(self.remove(&name)),
            Request::Rename { from, to } => Reply::value(self.rename(&from, &to)),
            Request::Clock => Reply::value(self.clock()),
            Request::Time => Reply::value(self.time()),
            Request::System { command } => Reply::value(self.system(&command)),
            Request::Errno => Reply::value(self.errno()),
            Request::GetCmdline { buf_len } => match self.cmdline(buf_len) {
                Some(line) => Reply::with_data(0, line),
                None => Reply::value(-1),
            },
            Request::HeapInfo => Reply::with_data(0, self.heap_info()),
            Request::Exit { code } => {
                self.exit(u64::from(code))?;
                Reply {
                    halt: true,
                    ..Reply::value(0)
                }
            }
            Request::ExitExtended { code } => {
                self.exit(code)?;
                Reply {
                    halt: true,
                    ..Reply::value(0)
                }
            }
            Request::Elapsed => Reply::value(clamp(self.elapsed())),
            Request::TickFreq => Reply::value(self.tickfreq()),
        };
        Ok(reply)
    }
}

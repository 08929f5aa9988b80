// CLASSIFICATION: COMMUNITY
// Filename: script.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Line oriented request scripts for driving a session from the host.
//!
//! ```text
//! # comment
//! open log.txt 4
//! write 3 hello\n
//! seek 3 0
//! read 3 16
//! ```

use std::str::FromStr;

use thiserror::Error;

use super::syscall::Request;

/// Errors raised while parsing a request line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown request '{0}'")]
    UnknownRequest(String),
    #[error("{request}: missing argument <{arg}>")]
    MissingArgument { request: String, arg: &'static str },
    #[error("{request}: invalid argument '{value}'")]
    InvalidArgument { request: String, value: String },
    #[error("bad escape sequence in '{0}'")]
    BadEscape(String),
}

struct Args<'a> {
    request: &'a str,
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn word(&mut self, arg: &'static str) -> Result<&'a str, ScriptError> {
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            return Err(self.missing(arg));
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.rest = &rest[end..];
        Ok(&rest[..end])
    }

    fn missing(&self, arg: &'static str) -> ScriptError {
        ScriptError::MissingArgument {
            request: self.request.to_string(),
            arg,
        }
    }

    fn invalid(&self, value: &[u8]) -> ScriptError {
        ScriptError::InvalidArgument {
            request: self.request.to_string(),
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }

    fn number<T: FromStr>(&mut self, arg: &'static str) -> Result<T, ScriptError> {
        let word = self.word(arg)?;
        parse_number(word).ok_or_else(|| self.invalid(word.as_bytes()))
    }

    /// Remainder of the line with escapes decoded.
    fn text(&mut self, arg: &'static str) -> Result<Vec<u8>, ScriptError> {
        let rest = self.rest.strip_prefix(' ').unwrap_or(self.rest);
        if rest.is_empty() {
            return Err(self.missing(arg));
        }
        self.rest = "";
        unescape(rest)
    }
}

fn parse_number<T: FromStr>(word: &str) -> Option<T> {
    if let Some(hex) = word.strip_prefix("0x") {
        let value = i128::from_str_radix(hex, 16).ok()?;
        return value.to_string().parse().ok();
    }
    word.parse().ok()
}

/// Decode `\n \r \t \\ \0 \xHH` escapes.
pub fn unescape(text: &str) -> Result<Vec<u8>, ScriptError> {
    let bad = || ScriptError::BadEscape(text.to_string());
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next().ok_or_else(bad)? {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'0' => out.push(0),
            b'\\' => out.push(b'\\'),
            b'x' => {
                let hi = bytes.next().ok_or_else(bad)?;
                let lo = bytes.next().ok_or_else(bad)?;
                let pair = [hi, lo];
                let hex = std::str::from_utf8(&pair).map_err(|_| bad())?;
                out.push(u8::from_str_radix(hex, 16).map_err(|_| bad())?);
            }
            _ => return Err(bad()),
        }
    }
    Ok(out)
}

fn text_string(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse one script line. Blank lines and `#` comments give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Request>, ScriptError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (verb, rest) = trimmed.split_at(end);
    let mut args = Args {
        request: verb,
        rest,
    };
    let request = match verb {
        "open" => Request::Open {
            name: args.word("name")?.to_string(),
            mode: args.number("mode")?,
        },
        "close" => Request::Close {
            handle: args.number("handle")?,
        },
        "write" => Request::Write {
            handle: args.number("handle")?,
            data: args.text("data")?,
        },
        "read" => Request::Read {
            handle: args.number("handle")?,
            len: args.number("len")?,
        },
        "readc" => Request::Readc,
        "seek" => Request::Seek {
            handle: args.number("handle")?,
            offset: args.number("offset")?,
        },
        "flen" => Request::Flen {
            handle: args.number("handle")?,
        },
        "remove" => Request::Remove {
            name: args.word("name")?.to_string(),
        },
        "rename" => Request::Rename {
            from: args.word("old")?.to_string(),
            to: args.word("new")?.to_string(),
        },
        "errno" => Request::Errno,
        "iserror" => Request::IsError {
            code: args.number("code")?,
        },
        "istty" => Request::IsTty {
            handle: args.number("handle")?,
        },
        "elapsed" => Request::Elapsed,
        "tickfreq" => Request::TickFreq,
        "system" => Request::System {
            command: text_string(args.text("command")?),
        },
        "clock" => Request::Clock,
        "time" => Request::Time,
        "tmpnam" => Request::Tmpnam {
            target_id: args.number("id")?,
            buf_size: args.number("size")?,
        },
        "writec" => {
            let text = args.text("ch")?;
            match text.as_slice() {
                [ch] => Request::Writec { ch: *ch },
                _ => return Err(args.invalid(&text)),
            }
        }
        "write0" => Request::Write0 {
            text: args.text("text")?,
        },
        "cmdline" => Request::GetCmdline {
            buf_len: args.number("len")?,
        },
        "heapinfo" => Request::HeapInfo,
        "exit" => Request::Exit {
            code: args.number("code")?,
        },
        "exit_extended" => Request::ExitExtended {
            code: args.number("code")?,
        },
        other => return Err(ScriptError::UnknownRequest(other.to_string())),
    };
    Ok(Some(request))
}

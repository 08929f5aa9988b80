// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! ARM semihosting file and console operations served from a host
//! filesystem and console.

pub mod error;
pub mod handler;
pub mod handles;
pub mod host;
pub mod mode;
pub mod script;
pub mod syscall;

pub use error::{SemihostError, SemihostResult};
pub use handler::{Semihost, FEATURES_NAME, FEATURE_MARKER, TICK_FREQ, TT_NAME};
pub use handles::{Handle, STDERR, STDIN, STDOUT};
pub use host::{BufferConsole, Console, HostFile, HostFs, StdConsole, StdFs};
pub use mode::{ModeTable, OpenMode};
pub use syscall::{Reply, Request, SysCall};

use crate::config::SemihostConfig;

/// Session on the real filesystem rooted at `config.root` with the process
/// stdin/stdout as console.
pub fn host_session(config: SemihostConfig) -> Semihost<StdFs, StdConsole> {
    let fs = StdFs::new(config.root.clone());
    Semihost::init(fs, StdConsole, config)
}

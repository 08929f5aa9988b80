// CLASSIFICATION: COMMUNITY
// Filename: semihost_dispatch.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

use cohesix_semihost::semihosting::{script, BufferConsole, Semihost, StdFs, SysCall};
use cohesix_semihost::{Reply, Request, SemihostConfig};
use serial_test::serial;
use tempfile::tempdir;

fn session(root: &std::path::Path, input: &str) -> Semihost<StdFs, BufferConsole> {
    let cfg = SemihostConfig {
        cmdline: "fw.elf --verbose".into(),
        heap_info: [0x2000_0000, 0x2001_0000, 0x2002_0000, 0x2001_8000],
        ..SemihostConfig::default()
    };
    Semihost::init(StdFs::new(root), BufferConsole::with_input(input), cfg)
}

fn run(sh: &mut Semihost<StdFs, BufferConsole>, lines: &str) -> Vec<Reply> {
    lines
        .lines()
        .filter_map(|l| script::parse_line(l).unwrap())
        .map(|req| sh.dispatch(req))
        .collect()
}

#[test]
fn script_round_trip() {
    let dir = tempdir().unwrap();
    let mut sh = session(dir.path(), "");
    let replies = run(
        &mut sh,
        "# write a file and read it back\n\
         open data.txt 6\n\
         write 3 hello\\n\n\
         flen 3\n\
         seek 3 0\n\
         read 3 32\n\
         close 3\n",
    );
    let values: Vec<i32> = replies.iter().map(|r| r.value).collect();
    // read reports the bytes it could not deliver
    assert_eq!(values, [3, 6, 6, 0, 26, 0]);
    assert_eq!(replies[4].data, b"hello\n");
}

#[test]
fn read_reply_counts_unread_bytes() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("ten.txt"), b"0123456789").unwrap();
    let mut sh = session(dir.path(), "");
    let h = sh.open("ten.txt", 0).unwrap();
    let full = sh.dispatch(Request::Read { handle: h, len: 4 });
    assert_eq!((full.value, full.data.as_slice()), (0, &b"0123"[..]));
    let rest = sh.dispatch(Request::Read { handle: h, len: 10 });
    assert_eq!((rest.value, rest.data.as_slice()), (4, &b"456789"[..]));
    let eof = sh.dispatch(Request::Read { handle: h, len: 10 });
    assert_eq!((eof.value, eof.data.len()), (10, 0));
}

#[test]
fn oversized_read_length_returns_file_contents() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("abc.txt"), b"abc").unwrap();
    let mut sh = session(dir.path(), "");
    let h = sh.open("abc.txt", 0).unwrap();
    let reply = sh.dispatch(Request::Read {
        handle: h,
        len: usize::MAX,
    });
    assert_eq!(reply.data, b"abc");
    assert_eq!(reply.value, i32::MAX);
}

#[test]
fn open_past_last_handle_fails() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
    let cfg = SemihostConfig {
        first_handle: i32::MAX,
        ..SemihostConfig::default()
    };
    let mut sh = Semihost::init(StdFs::new(dir.path()), BufferConsole::new(), cfg);
    let open = |name: &str| Request::Open {
        name: name.into(),
        mode: 0,
    };
    assert_eq!(sh.dispatch(open("a.txt")).value, i32::MAX);
    assert_eq!(sh.dispatch(open("a.txt")).value, -1);
    assert_eq!(sh.dispatch(Request::Close { handle: i32::MAX }).value, 0);
}

#[test]
fn propagated_errors_become_minus_one() {
    let dir = tempdir().unwrap();
    let mut sh = session(dir.path(), "");
    let bad = [
        Request::Open { name: "x".into(), mode: 12 },
        Request::Open { name: "missing".into(), mode: 0 },
        Request::Close { handle: 9 },
        Request::Write { handle: 9, data: b"x".to_vec() },
        Request::Read { handle: 9, len: 1 },
        Request::Readc,
    ];
    for req in bad {
        let call = req.syscall();
        assert_eq!(sh.dispatch(req), Reply::value(-1), "{}", call.name());
    }
}

#[test]
fn console_calls() {
    let dir = tempdir().unwrap();
    let mut sh = session(dir.path(), "k");
    assert_eq!(sh.dispatch(Request::Writec { ch: b'>' }).value, 0);
    assert_eq!(
        sh.dispatch(Request::Write0 { text: b"hi\0ignored".to_vec() }).value,
        0
    );
    assert_eq!(sh.dispatch(Request::Readc).value, i32::from(b'k'));
    assert_eq!(
        sh.dispatch(Request::Write { handle: 2, data: b"!".to_vec() }).value,
        1
    );
    assert_eq!(sh.console().output(), b">hik!");
}

#[test]
fn cmdline_and_heapinfo() {
    let dir = tempdir().unwrap();
    let mut sh = session(dir.path(), "");
    let reply = sh.dispatch(Request::GetCmdline { buf_len: 64 });
    assert_eq!(reply.value, 0);
    assert_eq!(reply.data, b"fw.elf --verbose\0");
    assert_eq!(sh.dispatch(Request::GetCmdline { buf_len: 16 }).value, -1);
    let heap = sh.dispatch(Request::HeapInfo);
    assert_eq!(heap.data.len(), 16);
    assert_eq!(&heap.data[..4], &0x2000_0000u32.to_le_bytes());
}

#[test]
fn stubs_and_timing() {
    let dir = tempdir().unwrap();
    let mut sh = session(dir.path(), "");
    assert_eq!(sh.dispatch(Request::Elapsed).value, -1);
    assert_eq!(sh.dispatch(Request::TickFreq).value, 100);
    assert_eq!(sh.dispatch(Request::Errno).value, 0);
    assert_eq!(sh.dispatch(Request::IsError { code: -1 }).value, 0);
    assert_eq!(
        sh.dispatch(Request::System { command: "touch pwned".into() }).value,
        0
    );
    assert!(!dir.path().join("pwned").exists());
    assert!(sh.dispatch(Request::Clock).value >= 0);
    assert!(sh.dispatch(Request::Time).value > 1_600_000_000);
    let tmp = sh.dispatch(Request::Tmpnam { target_id: 0x3a, buf_size: 32 });
    assert_eq!(tmp.data, b"tempDK.tmp\0");
}

#[test]
fn exit_halts_the_session() {
    let dir = tempdir().unwrap();
    let mut sh = session(dir.path(), "");
    let reply = sh.dispatch(Request::Exit { code: 0x20026 });
    assert!(reply.halt);
    assert_eq!(sh.console().output(), b"_exit(0x20026)\n");
    let reply = sh.dispatch(Request::ExitExtended { code: 0x1_0000_0002 });
    assert!(reply.halt);
    assert!(sh.console().output().ends_with(b"_exit(0x100000002)\n"));
}

#[test]
fn request_numbers_match_arm_table() {
    assert_eq!(Request::Open { name: String::new(), mode: 0 }.syscall().number(), 0x01);
    assert_eq!(Request::Read { handle: 0, len: 0 }.syscall().number(), 0x06);
    assert_eq!(Request::Elapsed.syscall(), SysCall::Elapsed);
    assert_eq!(SysCall::try_from(0x0C).unwrap(), SysCall::Flen);
}

#[test]
#[serial]
fn env_config_reaches_session() {
    let dir = tempdir().unwrap();
    std::env::set_var("COHESIX_SEMIHOST_FEATURES", "env_shfb.bin");
    let cfg = SemihostConfig {
        root: dir.path().to_path_buf(),
        ..SemihostConfig::default()
    }
    .with_env();
    std::env::remove_var("COHESIX_SEMIHOST_FEATURES");
    let mut sh = Semihost::init(StdFs::new(&cfg.root), BufferConsole::new(), cfg);
    let reply = sh.dispatch(Request::Open {
        name: ":semihosting-features".into(),
        mode: 0,
    });
    assert_eq!(reply.value, 3);
    assert!(dir.path().join("env_shfb.bin").exists());
}

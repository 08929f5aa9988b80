// CLASSIFICATION: COMMUNITY
// Filename: shrun.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Replay a semihosting request script against the host filesystem.
//!
//! The process stdin and stdout act as the target console, so replies are
//! reported on stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cohesix_semihost::semihosting::{host_session, script};
use cohesix_semihost::SemihostConfig;
use env_logger::Env;
use log::info;

#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "Semihosting request runner", long_about = None)]
struct Cli {
    /// Request script, one request per line.
    script: PathBuf,

    /// TOML session configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory relative file names resolve against.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Backing file for `:semihosting-features`.
    #[arg(long)]
    features: Option<String>,

    /// Keep going after a line fails to parse.
    #[arg(long)]
    keep_going: bool,
}

fn load_config(cli: &Cli) -> Result<SemihostConfig> {
    let mut cfg = match &cli.config {
        Some(path) => SemihostConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SemihostConfig::default(),
    }
    .with_env();
    if let Some(root) = &cli.root {
        cfg.root = root.clone();
    }
    if let Some(features) = &cli.features {
        cfg.features_path = features.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let text = fs::read_to_string(&cli.script)
        .with_context(|| format!("reading {}", cli.script.display()))?;

    let mut session = host_session(cfg);
    for (lineno, line) in text.lines().enumerate() {
        let request = match script::parse_line(line) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) if cli.keep_going => {
                eprintln!("{}:{}: {}", cli.script.display(), lineno + 1, e);
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("{}:{}", cli.script.display(), lineno + 1))
            }
        };
        let call = request.syscall();
        let reply = session.dispatch(request);
        if reply.data.is_empty() {
            eprintln!("{} -> {}", call.name(), reply.value);
        } else {
            eprintln!(
                "{} -> {} {:?}",
                call.name(),
                reply.value,
                String::from_utf8_lossy(&reply.data)
            );
        }
        if reply.halt {
            info!("target halted at line {}", lineno + 1);
            break;
        }
    }
    Ok(())
}

//! # CLI - Bitcask read-only shell
//!
//! A REPL-style command-line interface over a Bitcask directory. Loads the
//! keydir once at startup, then reads commands from stdin and prints results
//! to stdout. Works interactively or scripted (pipe commands via stdin).
//! Logs go to stderr.
//!
//! ## Commands
//!
//! ```text
//! GET key       Look up a key (prints value or "(nil)")
//! SCAN          Print every live key and its value
//! KEYS          Print every live key
//! SIZE          Number of live keys
//! FILES         Data files in generation order
//! RELOAD        Discard the keydir and load the directory again
//! STATS         Print bitcask debug info
//! EXIT / QUIT   Leave the shell
//! ```
//!
//! ## Configuration
//!
//! ```text
//! BITCASK_DIR        bitcask directory                  (default: "data")
//! BITCASK_STRICT     abort load on first corrupt record (default: "false")
//! BITCASK_USE_HINTS  load from .hint files when present (default: "true")
//! BITCASK_LOG        tracing filter, else RUST_LOG      (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ BITCASK_DIR=/var/lib/riak/bitcask/0 cargo run -p cli
//! Bitcask loaded (dir=/var/lib/riak/bitcask/0, generations=3, keys=2, skipped=0)
//! > GET name
//! Alice
//! > SCAN
//! city -> Paris
//! name -> Alice
//! (2 entries)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use bitcask::{Bitcask, BitcaskError, LoadReport};
use config::BitcaskConfig;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var holding the log filter; `RUST_LOG` is used when it is unset.
const ENV_LOG: &str = "BITCASK_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config = BitcaskConfig::from_env();
    let mut bc = Bitcask::with_config(config);
    let report = bc.load()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", banner(&bc, &report))?;
    writeln!(out, "Commands: GET key | SCAN | KEYS | SIZE | FILES | RELOAD | STATS | EXIT")?;

    let stdin = io::stdin();
    run(&mut bc, stdin.lock(), &mut out)?;

    bc.close();
    Ok(())
}

fn banner(bc: &Bitcask, report: &LoadReport) -> String {
    format!(
        "Bitcask loaded (dir={}, generations={}, keys={}, skipped={})",
        bc.dir().display(),
        report.generations,
        bc.size(),
        report.skipped.len()
    )
}

/// Runs the command loop until `EXIT`/`QUIT` or end of input.
fn run<R: BufRead, W: Write>(bc: &mut Bitcask, input: R, out: &mut W) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "GET" => {
                    if let Some(k) = parts.next() {
                        match bc.get_value(k.as_bytes()) {
                            Ok(v) => writeln!(out, "{}", String::from_utf8_lossy(&v))?,
                            Err(BitcaskError::KeyNotFound(_)) => writeln!(out, "(nil)")?,
                            Err(e) => writeln!(out, "ERR read failed: {}", e)?,
                        }
                    } else {
                        writeln!(out, "ERR usage: GET key")?;
                    }
                }
                "SCAN" => {
                    let mut count = 0;
                    for item in bc.scan() {
                        match item {
                            Ok(entry) => {
                                count += 1;
                                writeln!(
                                    out,
                                    "{} -> {}",
                                    String::from_utf8_lossy(&entry.key),
                                    String::from_utf8_lossy(&entry.value)
                                )?;
                            }
                            Err(e) => writeln!(out, "ERR scan failed: {}", e)?,
                        }
                    }
                    if count == 0 {
                        writeln!(out, "(empty)")?;
                    } else {
                        writeln!(out, "({} entries)", count)?;
                    }
                }
                "KEYS" => {
                    if bc.size() == 0 {
                        writeln!(out, "(empty)")?;
                    } else {
                        for k in bc.keys() {
                            writeln!(out, "{}", String::from_utf8_lossy(k))?;
                        }
                        writeln!(out, "({} keys)", bc.size())?;
                    }
                }
                "SIZE" => writeln!(out, "{}", bc.size())?,
                "FILES" => {
                    let files = bc.data_file_list();
                    if files.is_empty() {
                        writeln!(out, "(empty)")?;
                    } else {
                        for f in &files {
                            writeln!(out, "{}", f.display())?;
                        }
                        writeln!(out, "({} files)", files.len())?;
                    }
                }
                "RELOAD" => {
                    bc.reset();
                    match bc.load() {
                        Ok(report) => writeln!(
                            out,
                            "OK (generations={}, keys={}, skipped={})",
                            report.generations,
                            bc.size(),
                            report.skipped.len()
                        )?,
                        Err(e) => writeln!(out, "ERR reload failed: {}", e)?,
                    }
                }
                "STATS" => writeln!(out, "{:?}", bc)?,
                "EXIT" | "QUIT" => {
                    writeln!(out, "bye")?;
                    break;
                }
                other => writeln!(out, "unknown command: {}", other)?,
            }
        }

        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests;

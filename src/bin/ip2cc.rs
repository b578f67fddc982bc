// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Lookup CLI: `ip2cc [-u] <addr>...`.
//!
//! Mirrors `ip2cc.c`'s `main()` for
//! argument semantics (one line of output per address, `??` on miss) and on
//! the builder CLI's `init_tracing` for logging setup.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use ip4cc::lookup::{find_ip4_country, LookupOutcome};
use ip4cc::LookupError;

/// Default database path when `--db` is omitted.
const DEFAULT_DB_PATH: &str = "ip4.db";

#[derive(Parser)]
#[command(name = "ip2cc", about = "Look up the ISO-3166 country code for one or more IPv4 addresses")]
struct Args {
    /// Print country codes upper-case instead of the on-disk lower-case form.
    #[arg(short, long)]
    uppercase: bool,

    /// Database file built by `mk-ip4db` (default: ip4.db in the current directory).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Suppress all but error output.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Addresses to look up, in `d.d.d.d` form.
    #[arg(required = true)]
    addr: Vec<String>,
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_log::LogTracer::init().expect("failed to install the log-to-tracing bridge");

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("IP4CC_LOG")
        .from_env_lossy();

    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact());

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("internal error: tracing subscriber already set");
    }
}

/// Parses `d.d.d.d` (each octet `0..=255`) into a big-endian `u32`.
fn parse_ipv4(addr: &str) -> Option<u32> {
    let mut octets = addr.split('.');
    let mut value: u32 = 0;
    for _ in 0..4 {
        let octet: u8 = octets.next()?.parse().ok()?;
        value = (value << 8) | u32::from(octet);
    }
    if octets.next().is_some() {
        return None;
    }
    Some(value)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose);

    let db_path = args.db.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
    let mut db = match File::open(&db_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open database {}: {e}", db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut had_error = false;

    for raw in &args.addr {
        let Some(ip) = parse_ipv4(raw) else {
            eprintln!("'{raw}' is not a valid IPv4 address");
            had_error = true;
            println!("??");
            continue;
        };

        match find_ip4_country(ip, &mut db) {
            Ok(LookupOutcome::Hit(country)) => {
                let code = if args.uppercase {
                    ip4cc::country::code_for_uppercase(country)
                } else {
                    ip4cc::country::code_for(country).map(str::to_string)
                };
                match code {
                    Some(code) => println!("{code}"),
                    None => println!("??"),
                }
            }
            Ok(LookupOutcome::Miss) => println!("??"),
            Err(e) => {
                match &e {
                    LookupError::Io(_) => eprintln!("I/O error looking up {raw}: {e}"),
                    LookupError::Corrupt(_) => eprintln!("corrupt database looking up {raw}: {e}"),
                }
                had_error = true;
                println!("??");
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

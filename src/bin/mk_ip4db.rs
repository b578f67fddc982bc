// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Builder CLI: `mk-ip4db [-N] <csv-in> [<db-out>]`.
//!
//! Mirrors `mk-ip4db.c`'s `main()` for
//! argument semantics, and on lsm-tree's `tool.rs::init_tracing`
//! for the logging setup (trimmed to this crate's dependency set: no
//! `rustyline`/`tracing_panic` bridge, since there is no REPL or custom
//! panic hook here).

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use ip4cc::csv_source::SourceFormat;
use ip4cc::Config;

/// Default destination path when `<db-out>` is omitted.
const DEFAULT_DB_OUT: &str = "ip4.db";

#[derive(Parser)]
#[command(name = "mk-ip4db", about = "Build a clustered IPv4-to-country database from a CSV source file")]
struct Args {
    /// Source file column ordering: 1 through 4.
    ///
    /// 1  "ip-start","ip-end","iso-country","...","..."  (default)
    /// 2  "ip-start","ip-end","iso-country","..."
    /// 3  "...","...","ip-start","ip-end","iso-country","...","..."
    /// 4  "...","...","ip-start","ip-end","iso-country","..."
    #[arg(short, long, value_parser = parse_format, default_value = "1")]
    format: SourceFormat,

    /// Source IP-to-country data file.
    csv_in: PathBuf,

    /// Destination database file (default: ip4.db in the current directory).
    db_out: Option<PathBuf>,

    /// Suppress all but error output.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_format(s: &str) -> Result<SourceFormat, String> {
    SourceFormat::from_flag(&format!("-{s}"))
        .ok_or_else(|| format!("'{s}' is not a valid format specifier (expected 1..4)"))
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

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose);

    let db_out = args.db_out.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_OUT));

    let source_file = match File::open(&args.csv_in) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open source data file {}: {e}", args.csv_in.display());
            return ExitCode::FAILURE;
        }
    };

    let config = Config::default();
    let report = ip4cc::build_database(BufReader::new(source_file), args.format, &db_out, &config);

    match report {
        Ok(report) => {
            log::info!(
                "read {} lines ({} bad range, {} bad country, {} reordered, {} overlapped, {} deleted, {} coalesced)",
                report.lines_read,
                report.lines_skipped_bad_range,
                report.lines_skipped_bad_country,
                report.lines_reordered,
                report.lines_overlapped,
                report.lines_overlap_deleted,
                report.lines_coalesced,
            );
            log::info!(
                "wrote {} entries ({} fragments added) into {} clusters ({} full, tail starts at {})",
                report.total_entries,
                report.fragments_added,
                report.total_clusters,
                report.first_tail_cluster,
                report.first_tail_cluster,
            );
            println!("Wrote {} to {}", report.total_clusters, db_out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error building database: {e}");
            ExitCode::FAILURE
        }
    }
}

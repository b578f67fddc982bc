// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! `ip4cc`: a clustered binary-search-tree on-disk database mapping IPv4
//! address ranges to ISO-3166 alpha-2 country codes.
//!
//! A database is built once, offline, by [`ingest::ingest`] +
//! [`tree::build`] + [`pack::pack`] + [`writer::build_clusters`], and
//! queried many times by [`lookup::find_ip4_country`] against a
//! memory-mapped or seekable file -- no index is held in memory at query
//! time beyond whatever the OS page cache keeps warm.
//!
//! The on-disk format is a forward-only linked list of fixed-size clusters,
//! each a complete `NODES_PER_CLUSTER`-node balanced sub-tree plus its child
//! cluster indices; see [`config`] for the exact geometry and [`cluster`]
//! for the byte layout.

mod binary_search;
pub mod cluster;
pub mod coding;
pub mod config;
pub mod country;
pub mod csv_source;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod pack;
pub mod range_code;
pub mod tree;
pub mod writer;

pub use config::{Config, CountryRewrites};
pub use country::CountryId;
pub use error::{BuildError, BuildResult, CorruptReason, IngestError, LookupError, LookupResult};
pub use ingest::BuildReport;
pub use lookup::LookupOutcome;

use std::io::BufRead;
use std::path::Path;

use csv_source::{SourceFormat, TupleReader};

/// Runs the full build pipeline -- read, ingest, tree, pack, write -- over a
/// source data file already opened for buffered reading, writing the
/// resulting database atomically to `destination`.
///
/// This is the one-call entry point both `mk-ip4db` and any embedding
/// application should use; the individual stages remain public for callers
/// that need to inspect or customize an intermediate step (e.g. tests that
/// build a database in memory, as this crate's own test suites do).
///
/// # Errors
///
/// Returns [`BuildError`] if any stage fails: a malformed source line, a
/// post-ingest verification failure, an unbalanced tree, an incomplete
/// cluster, or an I/O failure writing the destination.
pub fn build_database<R: BufRead>(
    source: R,
    format: SourceFormat,
    destination: &Path,
    config: &Config,
) -> BuildResult<BuildReport> {
    let tuples: Vec<(u32, u32, String)> = TupleReader::new(source, format).collect::<Result<_, _>>()?;

    let (entries, mut report) = ingest::ingest(tuples, config)?;
    let built_tree = tree::build(&entries)?;
    let packed = pack::pack(&built_tree)?;
    let clusters = writer::build_clusters(&entries, &built_tree, &packed)?;
    writer::write_database_atomic(destination, &clusters)?;

    report.total_clusters = packed.total_clusters;
    report.first_tail_cluster = packed.first_tail;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_log::test;

    #[test]
    fn build_database_end_to_end_then_looks_up() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("test.ip4db");

        // 194.65.14.75, a long-standing smoke-test address for this lookup.
        let smoke_test_ip: u32 = 3_259_043_403;
        let source = format!("\"{smoke_test_ip}\",\"{smoke_test_ip}\",\"pt\",\"x\",\"x\"\n");
        let report = build_database(
            Cursor::new(source),
            SourceFormat::Format1,
            &destination,
            &Config::default(),
        )
        .unwrap();

        assert_eq!(report.lines_read, 1);
        assert!(report.total_clusters >= 1);

        let mut file = std::fs::File::open(&destination).unwrap();
        let pt = country::find_cc("pt").unwrap();
        let outcome = lookup::find_ip4_country(smoke_test_ip, &mut file).unwrap();
        assert_eq!(outcome, LookupOutcome::Hit(pt));
    }
}

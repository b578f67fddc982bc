// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Error taxonomy for the ip4cc crate.
//
// Each pipeline stage gets its own error enum so callers can match on exactly
// what went wrong without unwrapping a single do-everything variant. Input
// errors that should be reported and skipped (malformed rows, unknown
// countries) are never represented here; they live in `BuildReport` instead.

use std::fmt;

use crate::csv_source::SourceError;
use crate::pack::PackError;
use crate::tree::TreeError;
use crate::writer::WriterError;

/// Errors that can occur while building a database.
#[derive(Debug)]
pub enum BuildError {
    /// I/O failure reading the source or writing the destination.
    Io(std::io::Error),
    /// A source data line could not be parsed in the selected column format.
    Source(SourceError),
    /// The normalized range list failed a post-ingest verification pass.
    Ingest(IngestError),
    /// The balanced tree failed to satisfy its level invariant.
    Tree(TreeError),
    /// Cluster packing or renumbering violated an invariant.
    Pack(PackError),
    /// Writing the cluster stream to disk failed an assertion.
    Writer(WriterError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Source(e) => write!(f, "source data error: {e}"),
            Self::Ingest(e) => write!(f, "ingest error: {e}"),
            Self::Tree(e) => write!(f, "tree build error: {e}"),
            Self::Pack(e) => write!(f, "cluster pack error: {e}"),
            Self::Writer(e) => write!(f, "writer error: {e}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::Ingest(e) => Some(e),
            Self::Tree(e) => Some(e),
            Self::Pack(e) => Some(e),
            Self::Writer(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SourceError> for BuildError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<IngestError> for BuildError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<TreeError> for BuildError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<PackError> for BuildError {
    fn from(value: PackError) -> Self {
        Self::Pack(value)
    }
}

impl From<WriterError> for BuildError {
    fn from(value: WriterError) -> Self {
        Self::Writer(value)
    }
}

/// Errors raised while verifying the normalized, fragmented range list.
///
/// These are all "should be unreachable on well-formed input" invariant
/// violations; malformed CSV lines are filtered earlier and never reach here.
#[derive(Debug)]
pub enum IngestError {
    /// Forward and backward traversal counts of the normalized list disagree.
    TraversalCountMismatch { forward: usize, backward: usize },
    /// Two adjacent normalized ranges overlap.
    AdjacentOverlap { at_index: usize },
    /// A range survived normalization but could not be fragmented into any
    /// representable piece (only possible for a zero-length range, which
    /// should have been filtered already).
    Unencodable { start: u32, length: u64 },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TraversalCountMismatch { forward, backward } => write!(
                f,
                "forward traversal ({forward} entries) disagrees with backward traversal ({backward} entries)"
            ),
            Self::AdjacentOverlap { at_index } => {
                write!(f, "ranges at index {at_index} and {} overlap after normalization", at_index + 1)
            }
            Self::Unencodable { start, length } => {
                write!(f, "range starting at {start} with length {length} has no representable encoding")
            }
        }
    }
}

impl std::error::Error for IngestError {}

/// Result type returned by library-level build operations.
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Errors raised by the lookup engine.
///
/// A miss is deliberately not part of this enum; see [`crate::lookup::LookupOutcome`].
#[derive(Debug)]
pub enum LookupError {
    /// Seek or read against the database file failed.
    Io(std::io::Error),
    /// The database is internally inconsistent.
    Corrupt(CorruptReason),
}

/// Specific reason a database was rejected as corrupt.
#[derive(Debug, Clone, Copy)]
pub enum CorruptReason {
    /// A `next[]` entry pointed at a cluster index that does not strictly
    /// increase, which the safety-stop in the descent loop catches.
    BackEdge { from_cluster: u32, to_cluster: u32 },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error reading database: {e}"),
            Self::Corrupt(CorruptReason::BackEdge {
                from_cluster,
                to_cluster,
            }) => write!(
                f,
                "corrupt database: cluster {from_cluster} points back to cluster {to_cluster}"
            ),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(_) => None,
        }
    }
}

impl From<std::io::Error> for LookupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Result type returned by the lookup engine.
pub type LookupResult<T> = std::result::Result<T, LookupError>;

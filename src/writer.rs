// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Writer: emits one block per cluster, via an atomic rewrite of the
// destination path.
//
// Mirrors `mk-ip4db.c`'s final write loop
// (sentinel-fill every cluster, place each node at its slot, fill `next[]`
// for even slots, assert forward-only references) and on lsm-tree
// crate's `file::rewrite_atomic` for the write-to-temp-then-persist pattern
// (using `tempfile::NamedTempFile`, the same crate `lsm-tree` depends on).

use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::cluster::{Cluster, Node};
use crate::coding::Encode;
use crate::config::NODES_PER_CLUSTER;
use crate::ingest::EncodedEntry;
use crate::pack::{bucket_by_cluster, child_clusters, PackedTree};
use crate::tree::Tree;

/// Errors raised while assembling or writing the cluster stream.
#[derive(Debug)]
pub enum WriterError {
    /// I/O failure writing the destination (or its temp file).
    Io(std::io::Error),
    /// The database would need more clusters than the on-disk `u16` cluster
    /// index can address.
    TooManyClusters { total_clusters: u32 },
    /// A `next[]` entry would point at a cluster index that does not
    /// strictly increase -- a back-edge, which would break the lookup
    /// engine's safety stop.
    BackEdge { cluster: u32, points_to: u32 },
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::TooManyClusters { total_clusters } => {
                write!(f, "{total_clusters} clusters exceeds the on-disk u16 cluster index range")
            }
            Self::BackEdge { cluster, points_to } => {
                write!(f, "cluster {cluster} has a next[] pointer ({points_to}) that does not strictly increase")
            }
        }
    }
}

impl std::error::Error for WriterError {}

impl From<std::io::Error> for WriterError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<crate::coding::EncodeError> for WriterError {
    fn from(value: crate::coding::EncodeError) -> Self {
        match value {
            crate::coding::EncodeError::Io(e) => Self::Io(e),
        }
    }
}

/// Builds the full in-memory cluster stream (one [`Cluster`] per final
/// cluster id) from the packed, renumbered tree.
///
/// # Errors
///
/// Returns [`WriterError::TooManyClusters`] if the database needs more
/// clusters than fit in the on-disk `u16` index, or
/// [`WriterError::BackEdge`] if any `next[]` entry would violate the
/// forward-reference invariant (an internal bug, since [`crate::pack::pack`]
/// should already guarantee this).
pub fn build_clusters(
    entries: &[EncodedEntry],
    tree: &Tree,
    packed: &PackedTree,
) -> Result<Vec<Cluster>, WriterError> {
    if packed.total_clusters > u32::from(u16::MAX) {
        return Err(WriterError::TooManyClusters { total_clusters: packed.total_clusters });
    }

    let buckets = bucket_by_cluster(packed);
    let children = child_clusters(tree, packed);
    let mut clusters = vec![Cluster::empty(); packed.total_clusters as usize];

    for (cluster_id, bucket) in buckets.iter().enumerate() {
        let cluster = &mut clusters[cluster_id];
        for &idx in bucket {
            let slot = packed.assignments[idx].slot;
            cluster.nodes[slot] = Node { ip: entries[idx].ip, ccsz: entries[idx].ccsz };

            if slot % 2 == 0 {
                let (left, right) = children[&idx];
                cluster.next[slot] = left.unwrap_or(0);
                cluster.next[slot + 1] = right.unwrap_or(0);
            }
        }

        for &points_to in &cluster.next {
            if points_to != 0 && points_to <= cluster_id as u32 {
                return Err(WriterError::BackEdge { cluster: cluster_id as u32, points_to });
            }
        }
    }

    Ok(clusters)
}

/// Serializes `clusters` into `writer`, one `BLOCK_SIZE`-byte block each, in
/// ascending cluster order.
///
/// # Errors
///
/// Returns [`WriterError::Io`] on any underlying write failure.
pub fn write_clusters<W: Write>(writer: &mut W, clusters: &[Cluster]) -> Result<(), WriterError> {
    for cluster in clusters {
        debug_assert_eq!(cluster.nodes.len(), NODES_PER_CLUSTER);
        cluster.encode_into(writer)?;
    }
    Ok(())
}

/// Writes the full database to `path`, atomically: clusters are serialized
/// into a temp file in the same directory as `path`, flushed and synced,
/// then persisted over `path`. A reader can never observe a partially
/// written database.
///
/// # Errors
///
/// Returns [`WriterError::Io`] if the temp file cannot be created, written,
/// or persisted.
pub fn write_database_atomic(path: &Path, clusters: &[Cluster]) -> Result<(), WriterError> {
    let folder = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut temp_file = tempfile::NamedTempFile::new_in(folder)?;

    write_clusters(&mut temp_file, clusters)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| WriterError::Io(e.error))?;

    Ok(())
}

// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Lookup engine: block-at-a-time descent through the clustered tree.
//
// Mirrors, bit-for-bit, `ip2cc.c`'s
// `find_ip4_country()`: same `i`/`step` implicit-BST walk, same safety stop
// against back-edges, same "even slot after the intra-cluster descent" fact
// used to pick which `next[]` entry to follow.

use std::io::{Read, Seek, SeekFrom};

use crate::cluster::Cluster;
use crate::coding::Decode;
use crate::config::{BLOCK_SIZE, NODES_PER_CLUSTER, NO_CHILD};
use crate::country::CountryId;
use crate::error::{CorruptReason, LookupError, LookupResult};
use crate::range_code::RangeSize;

/// Result of a single lookup: either a matching country, or a clean miss
/// (not an error -- see [`LookupError`] for failure outcomes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit(CountryId),
    Miss,
}

/// Looks up `ip` in the database reachable through `reader`, descending
/// cluster by cluster.
///
/// # Errors
///
/// Returns [`LookupError::Io`] on a seek or read failure, or
/// [`LookupError::Corrupt`] if a `next[]` entry does not strictly increase
/// the cluster index (the descent's safety stop).
pub fn find_ip4_country<R: Read + Seek>(ip: u32, reader: &mut R) -> LookupResult<LookupOutcome> {
    let mut prev_cluster: i64 = -1;
    let mut cluster: u32 = 0;

    loop {
        if i64::from(cluster) <= prev_cluster {
            #[allow(clippy::cast_sign_loss)]
            return Err(LookupError::Corrupt(CorruptReason::BackEdge {
                from_cluster: prev_cluster as u32,
                to_cluster: cluster,
            }));
        }

        reader.seek(SeekFrom::Start(u64::from(cluster) * BLOCK_SIZE as u64))?;
        let block = Cluster::decode_from(reader)?;

        let mut i = NODES_PER_CLUSTER / 2;
        let mut step = NODES_PER_CLUSTER / 4 + 1;
        let mut went_left = false;

        loop {
            let node = block.nodes[i];
            if node.is_sentinel() {
                return Ok(LookupOutcome::Miss);
            }

            let (country, size) = RangeSize::unpack(node.ccsz);
            if ip < node.ip {
                i -= step;
                went_left = true;
            } else if u64::from(ip) >= u64::from(node.ip) + size.length() {
                i += step;
                went_left = false;
            } else {
                return Ok(LookupOutcome::Hit(country));
            }

            if step == 0 {
                break;
            }
            step >>= 1;
        }

        // `i` is guaranteed even here: every odd slot was visited earlier
        // in the descent, never as the final comparison.
        let next_slot = if went_left { i } else { i | 1 };
        let next_cluster = block.next[next_slot];
        if next_cluster == NO_CHILD {
            return Ok(LookupOutcome::Miss);
        }

        prev_cluster = i64::from(cluster);
        cluster = next_cluster;
    }
}

impl From<crate::coding::DecodeError> for LookupError {
    fn from(value: crate::coding::DecodeError) -> Self {
        match value {
            crate::coding::DecodeError::Io(e) => Self::Io(e),
            crate::coding::DecodeError::ShortRead { .. } => {
                Self::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short cluster read"))
            }
        }
    }
}

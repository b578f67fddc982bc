// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Cluster pack & number.
//
// Mirrors `mk-ip4db.c`'s `treecluster()`
// (slot assignment via the implicit-BST walk, temporary negative cluster
// ids) and the renumbering loop in `main()` (level-band, descending-`ip`
// walk that gives the root cluster 0 and keeps forward references).

use std::collections::HashMap;
use std::fmt;

use crate::config::{LEVELS_PER_CLUSTER, NODES_PER_CLUSTER};
use crate::tree::Tree;

/// Where one entry lands on disk: its final cluster id and slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub cluster: u32,
    pub slot: usize,
}

/// Result of packing and renumbering a tree: one assignment per entry
/// (indexed identically to the tree/entries slices), the total cluster
/// count, and the first cluster that is not completely full (the tail).
#[derive(Debug, Clone)]
pub struct PackedTree {
    pub assignments: Vec<ClusterAssignment>,
    pub total_clusters: u32,
    pub first_tail: u32,
}

/// Errors raised while packing nodes into clusters or renumbering them.
#[derive(Debug)]
pub enum PackError {
    /// A cluster above the deepest level range was not completely full.
    IncompleteCluster { cluster: u32, count: usize },
    /// The descending-`ip` renumber walk visited a temporary cluster id
    /// smaller than one already finalized -- an internal re-visit bug.
    OutOfOrder { at_index: usize },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteCluster { cluster, count } => write!(
                f,
                "cluster {cluster} has only {count} of {NODES_PER_CLUSTER} nodes but is not the tail"
            ),
            Self::OutOfOrder { at_index } => {
                write!(f, "entry {at_index} was assigned to a cluster out of renumbering order")
            }
        }
    }
}

impl std::error::Error for PackError {}

/// Assigns a temporary (negative) cluster id and a slot to every node, via
/// the implicit-BST walk: the root of each `LEVELS_PER_CLUSTER`-deep
/// sub-tree starts a new cluster at slot `K/2` with `step = K/4 + 1`; each
/// recursive step toward a child halves `step`.
fn assign_slots(tree: &Tree) -> (Vec<i64>, Vec<usize>) {
    let mut temp_cluster = vec![0i64; tree.nodes.len()];
    let mut slot = vec![0usize; tree.nodes.len()];
    let mut next_temp_id: i64 = -2;

    walk(
        tree,
        Some(tree.root),
        0,
        NODES_PER_CLUSTER / 2,
        NODES_PER_CLUSTER / 4 + 1,
        &mut next_temp_id,
        &mut temp_cluster,
        &mut slot,
    );

    (temp_cluster, slot)
}

#[allow(clippy::too_many_arguments)]
fn walk(
    tree: &Tree,
    idx: Option<usize>,
    cluster: i64,
    i: usize,
    step: usize,
    next_temp_id: &mut i64,
    temp_cluster: &mut [i64],
    slot: &mut [usize],
) {
    let Some(idx) = idx else { return };
    let node = tree.nodes[idx];

    let (cluster, i, step) = if node.level % LEVELS_PER_CLUSTER == 0 {
        let c = *next_temp_id;
        *next_temp_id -= 1;
        (c, NODES_PER_CLUSTER / 2, NODES_PER_CLUSTER / 4 + 1)
    } else {
        (cluster, i, step)
    };

    temp_cluster[idx] = cluster;
    slot[idx] = i;

    walk(tree, node.left, cluster, i - step, step / 2, next_temp_id, temp_cluster, slot);
    walk(tree, node.right, cluster, i + step, step / 2, next_temp_id, temp_cluster, slot);
}

/// Renumbers temporary cluster ids into their final, forward-referencing
/// form: walking level bands `[k*L, (k+1)*L - 1]` from the root downward,
/// and within each band visiting entries in descending `ip` order so that
/// the rightmost sub-trees at a given depth get the lowest numbers.
fn renumber(tree: &Tree, temp_cluster: &[i64]) -> Result<(Vec<u32>, u32, u32), PackError> {
    let n = tree.nodes.len();
    let mut final_cluster = vec![0u32; n];

    let mut cluster: i64 = -1;
    let mut first_tail: i64 = -1;
    let mut levelmin: u32 = 0;

    while levelmin <= tree.max_level {
        let levelmax = levelmin + LEVELS_PER_CLUSTER - 1;
        let mut cluster_old: i64 = 0;
        let mut count = 0usize;

        for idx in (0..n).rev() {
            let level = tree.nodes[idx].level;
            if level < levelmin || level > levelmax {
                continue;
            }
            let tmp = temp_cluster[idx];

            if cluster_old == 0 || tmp > cluster_old {
                if cluster_old != 0 && count != NODES_PER_CLUSTER {
                    if levelmax + 1 < tree.max_level || count > NODES_PER_CLUSTER {
                        return Err(PackError::IncompleteCluster { cluster: cluster as u32, count });
                    }
                    if first_tail < 0 {
                        first_tail = cluster;
                    }
                }
                cluster_old = tmp;
                cluster += 1;
                count = 0;
            }

            if tmp < cluster_old {
                return Err(PackError::OutOfOrder { at_index: idx });
            }

            #[allow(clippy::cast_sign_loss)]
            {
                final_cluster[idx] = cluster as u32;
            }
            count += 1;
        }

        levelmin += LEVELS_PER_CLUSTER;
    }

    #[allow(clippy::cast_sign_loss)]
    let total_clusters = (cluster + 1) as u32;
    let first_tail = if first_tail < 0 { total_clusters } else { first_tail as u32 };

    Ok((final_cluster, total_clusters, first_tail))
}

/// Packs and renumbers a tree into its clustered, on-disk form.
///
/// # Errors
///
/// Returns [`PackError`] if a non-tail cluster is incomplete, or if the
/// renumbering walk finds entries out of the expected monotonic order --
/// both indicate an internal bug in the tree build, not malformed input.
pub fn pack(tree: &Tree) -> Result<PackedTree, PackError> {
    let (temp_cluster, slot) = assign_slots(tree);
    let (final_cluster, total_clusters, first_tail) = renumber(tree, &temp_cluster)?;

    let assignments = final_cluster
        .into_iter()
        .zip(slot)
        .map(|(cluster, slot)| ClusterAssignment { cluster, slot })
        .collect();

    Ok(PackedTree { assignments, total_clusters, first_tail })
}

/// Groups entry indices by their assigned cluster, for the writer to
/// consume one cluster at a time without an O(n * clusters) scan.
#[must_use]
pub fn bucket_by_cluster(packed: &PackedTree) -> Vec<Vec<usize>> {
    let mut buckets = vec![Vec::new(); packed.total_clusters as usize];
    for (idx, assignment) in packed.assignments.iter().enumerate() {
        buckets[assignment.cluster as usize].push(idx);
    }
    buckets
}

/// Resolves each entry's left/right child cluster id, keyed by entry index,
/// used to fill the `next[]` array during writing.
#[must_use]
pub fn child_clusters(tree: &Tree, packed: &PackedTree) -> HashMap<usize, (Option<u32>, Option<u32>)> {
    tree.nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let left = node.left.map(|c| packed.assignments[c].cluster);
            let right = node.right.map(|c| packed.assignments[c].cluster);
            (idx, (left, right))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::EncodedEntry;
    use test_log::test;

    fn entries(n: usize) -> Vec<EncodedEntry> {
        (0..n).map(|i| EncodedEntry { ip: i as u32, ccsz: 0 }).collect()
    }

    #[test]
    fn root_lands_in_cluster_zero() {
        let e = entries(10);
        let tree = crate::tree::build(&e).unwrap();
        let packed = pack(&tree).unwrap();
        assert_eq!(packed.assignments[tree.root].cluster, 0);
    }

    #[test]
    fn all_next_pointers_are_forward_references() {
        for n in [1, 10, 63, 64, 65, 200, 1000, 5000] {
            let e = entries(n);
            let tree = crate::tree::build(&e).unwrap();
            let packed = pack(&tree).unwrap();
            let children = child_clusters(&tree, &packed);

            for (idx, assignment) in packed.assignments.iter().enumerate() {
                let (left, right) = children[&idx];
                for child in [left, right].into_iter().flatten() {
                    assert!(child > assignment.cluster, "n={n} idx={idx}");
                }
            }
        }
    }

    #[test]
    fn clusters_above_tail_are_full() {
        for n in [63, 127, 200, 1000] {
            let e = entries(n);
            let tree = crate::tree::build(&e).unwrap();
            let packed = pack(&tree).unwrap();
            let buckets = bucket_by_cluster(&packed);

            for (cluster, bucket) in buckets.iter().enumerate() {
                if (cluster as u32) < packed.first_tail {
                    assert_eq!(bucket.len(), NODES_PER_CLUSTER, "n={n} cluster={cluster}");
                }
            }
        }
    }

    #[test]
    fn slots_within_a_cluster_are_unique() {
        for n in [63, 127, 1000] {
            let e = entries(n);
            let tree = crate::tree::build(&e).unwrap();
            let packed = pack(&tree).unwrap();
            let buckets = bucket_by_cluster(&packed);

            for bucket in &buckets {
                let mut slots: Vec<usize> = bucket.iter().map(|&idx| packed.assignments[idx].slot).collect();
                slots.sort_unstable();
                let before = slots.len();
                slots.dedup();
                assert_eq!(slots.len(), before, "n={n}: duplicate slot in a cluster");
            }
        }
    }
}

// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Balanced BST build over the normalized, fragmented entry list.
//
// Mirrors `mk-ip4db.c`'s `treenode()`: the
// same left-biased median split and per-node level tracking, but expressed
// over slice index ranges instead of walking a doubly linked list to count
// "eleft"/"eright" by hand -- an index range makes the median trivial to
// compute directly without the linked-list bookkeeping.

use std::fmt;

use crate::ingest::EncodedEntry;

/// One node's position in the balanced tree: its level (root = 0) and the
/// indices (into the same entries slice) of its children, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    pub level: u32,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// The balanced tree built over a slice of [`EncodedEntry`]: one [`TreeNode`]
/// per entry, indexed identically to the entries slice it was built from.
#[derive(Debug, Clone)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
    pub root: usize,
    pub max_level: u32,
}

/// Errors raised while building the balanced tree.
#[derive(Debug)]
pub enum TreeError {
    /// No entries were supplied; there is no tree to build.
    Empty,
    /// The deepest and shallowest leaf levels differ by more than one,
    /// meaning the tree is not balanced to the degree the format requires.
    Unbalanced { min_level: u32, max_level: u32 },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no entries to build a tree from"),
            Self::Unbalanced { min_level, max_level } => write!(
                f,
                "tree leaves are more than one level apart (min {min_level}, max {max_level})"
            ),
        }
    }
}

impl std::error::Error for TreeError {}

/// Builds a balanced binary search tree over `entries`, already sorted
/// ascending by `ip`. In-order traversal of the result reproduces `entries`
/// exactly.
///
/// # Errors
///
/// Returns [`TreeError::Empty`] if `entries` is empty, or
/// [`TreeError::Unbalanced`] if the resulting tree's leaf levels differ by
/// more than one (should be unreachable for any non-empty input, since the
/// median split below always halves evenly).
pub fn build(entries: &[EncodedEntry]) -> Result<Tree, TreeError> {
    if entries.is_empty() {
        return Err(TreeError::Empty);
    }

    let mut nodes = vec![TreeNode { level: 0, left: None, right: None }; entries.len()];
    let mut min_level = u32::MAX;
    let mut max_level = 0u32;

    let root = build_range(0, entries.len(), 0, &mut nodes, &mut min_level, &mut max_level)
        .expect("non-empty range always produces a root");

    if max_level < min_level || max_level - min_level > 1 {
        return Err(TreeError::Unbalanced { min_level, max_level });
    }

    Ok(Tree { nodes, root, max_level })
}

/// Recursively splits `[lo, hi)` around its left-biased median, attaching it
/// as the sub-tree root at `level` and recursing on both halves. Mirrors
/// `treenode()`'s `i = (entries >> 1) - ((entries & 1) ^ 1)` median formula,
/// which rounds down so nodes cluster toward the middle of the index range.
fn build_range(
    lo: usize,
    hi: usize,
    level: u32,
    nodes: &mut [TreeNode],
    min_level: &mut u32,
    max_level: &mut u32,
) -> Option<usize> {
    let entries = hi - lo;
    if entries == 0 {
        *min_level = (*min_level).min(level);
        *max_level = (*max_level).max(level);
        return None;
    }

    let offset = (entries >> 1).saturating_sub(if entries & 1 == 1 { 0 } else { 1 });
    let mid = lo + offset;

    let left = build_range(lo, mid, level + 1, nodes, min_level, max_level);
    let right = build_range(mid + 1, hi, level + 1, nodes, min_level, max_level);
    nodes[mid] = TreeNode { level, left, right };
    Some(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn entries(n: usize) -> Vec<EncodedEntry> {
        (0..n).map(|i| EncodedEntry { ip: i as u32, ccsz: 0 }).collect()
    }

    fn in_order(tree: &Tree, idx: Option<usize>, out: &mut Vec<usize>) {
        let Some(idx) = idx else { return };
        in_order(tree, tree.nodes[idx].left, out);
        out.push(idx);
        in_order(tree, tree.nodes[idx].right, out);
    }

    #[test]
    fn in_order_traversal_matches_input_order() {
        for n in [1, 2, 3, 7, 8, 15, 16, 63, 100, 1000] {
            let e = entries(n);
            let tree = build(&e).unwrap();
            let mut order = Vec::new();
            in_order(&tree, Some(tree.root), &mut order);
            assert_eq!(order, (0..n).collect::<Vec<_>>(), "n={n}");
        }
    }

    #[test]
    fn tree_stays_balanced_within_one_level() {
        for n in 1..300usize {
            let e = entries(n);
            let tree = build(&e).unwrap();
            let mut min_level = u32::MAX;
            let mut max_level = 0;
            for (idx, node) in tree.nodes.iter().enumerate() {
                if node.left.is_none() {
                    min_level = min_level.min(node.level + 1);
                    max_level = max_level.max(node.level + 1);
                }
                if node.right.is_none() {
                    min_level = min_level.min(node.level + 1);
                    max_level = max_level.max(node.level + 1);
                }
                let _ = idx;
            }
            assert!(max_level - min_level <= 1, "n={n} min={min_level} max={max_level}");
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(build(&[]), Err(TreeError::Empty)));
    }

    #[test]
    fn root_level_is_zero() {
        let e = entries(10);
        let tree = build(&e).unwrap();
        assert_eq!(tree.nodes[tree.root].level, 0);
    }
}

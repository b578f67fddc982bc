// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// On-disk geometry and build/runtime knobs, centralized the way lsm-tree's
// `config::Config` centralizes block sizes and level counts.
//
// `BLOCK_SIZE`, `NODES_PER_CLUSTER` and `LEVELS_PER_CLUSTER` are compile-time
// constants, not `Config` fields: the builder and lookup engine must
// agree on geometry bit-for-bit, and a runtime-configurable geometry would
// make that agreement a runtime contract instead of a type-level one. A
// database built with one geometry is simply a different file format from
// one built with another; there is no story for reading both with the same
// binary, so there is nothing to negotiate at open time.

/// Disk block size in bytes. The original source calls this `SECTOR_SIZE`.
pub const BLOCK_SIZE: usize = 512;

/// Size in bytes of one on-disk IPv4 node: `u32` ip + `u16` ccsz.
pub const NODE_SIZE: usize = 6;

/// Size in bytes of one `next[]` entry.
pub const NEXT_SIZE: usize = 2;

/// Number of node slots per cluster: the largest `K = 2^L - 1` such that
/// `K * NODE_SIZE + (K + 1) * NEXT_SIZE <= BLOCK_SIZE`.
pub const NODES_PER_CLUSTER: usize = (BLOCK_SIZE >> 3) - 1;

/// Tree levels spanned by one cluster (`L` such that `K = 2^L - 1`).
pub const LEVELS_PER_CLUSTER: u32 = {
    // BLOCK_SIZE is a power of two (checked below), so this is exact.
    BLOCK_SIZE.trailing_zeros() - 3
};

/// Sentinel IP value marking an unused node slot.
pub const SENTINEL_IP: u32 = 0xFFFF_FFFF;

/// Sentinel ccsz value paired with [`SENTINEL_IP`].
pub const SENTINEL_CCSZ: u16 = 0xFFFF;

/// Cluster index `0` is always the root and can never appear as a `next[]`
/// target (forward-reference invariant), so it doubles as "no child".
pub const NO_CHILD: u32 = 0;

const _: () = {
    assert!(
        NODES_PER_CLUSTER * NODE_SIZE + (NODES_PER_CLUSTER + 1) * NEXT_SIZE <= BLOCK_SIZE,
        "cluster geometry does not fit within BLOCK_SIZE"
    );
    assert!(
        NODES_PER_CLUSTER + 1 == 1usize << LEVELS_PER_CLUSTER,
        "NODES_PER_CLUSTER must be 2^LEVELS_PER_CLUSTER - 1"
    );
};

/// Bytes of padding after the node and `next[]` areas, within one cluster.
#[must_use]
pub const fn padding_bytes() -> usize {
    BLOCK_SIZE - NODES_PER_CLUSTER * NODE_SIZE - (NODES_PER_CLUSTER + 1) * NEXT_SIZE
}

/// How deprecated ISO-3166 codes are rewritten before country lookup.
///
/// The original source hard-codes `CS`->`cz`, `TP`->`tl`, `UK`->`gb` as an
/// `if`/`else if` chain in the builder. `CS` (Czechoslovakia, historically, or
/// later Serbia-and-Montenegro) rewritten to `cz` (Czech Republic) is almost
/// certainly a bug, but the rewrite table is kept as data and exposed on
/// [`Config`] so an operator can disable or edit it, rather than frozen into
/// the ingest code path.
#[derive(Debug, Clone)]
pub struct CountryRewrites {
    pairs: Vec<(String, String)>,
}

impl CountryRewrites {
    /// The original source's rewrite table, reproduced bit-for-bit:
    /// `CS` (Czechoslovakia / Serbia-and-Montenegro, historically) is
    /// rewritten to `cz` (Czech Republic) -- almost certainly a bug, kept
    /// for compatibility -- `TP` to `tl`, and `UK` to `gb`.
    #[must_use]
    pub fn historical_default() -> Self {
        Self {
            pairs: vec![
                ("cs".into(), "cz".into()),
                ("tp".into(), "tl".into()),
                ("uk".into(), "gb".into()),
            ],
        }
    }

    /// No rewrites at all: codes are passed to [`crate::country::find_cc`] as given.
    #[must_use]
    pub fn none() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Rewrites `code` (already lowercased) if it has an entry in the table.
    #[must_use]
    pub fn rewrite<'a>(&'a self, code: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(from, _)| from == code)
            .map_or(code, |(_, to)| to.as_str())
    }
}

impl Default for CountryRewrites {
    fn default() -> Self {
        Self::historical_default()
    }
}

/// Build-time configuration: database destination and country-code handling.
/// Mirrors the shape of lsm-tree's `Config` (a plain struct with
/// sensible defaults, not a builder pattern -- this crate has too few knobs
/// to justify one).
#[derive(Debug, Clone)]
pub struct Config {
    /// Rewrite table applied to ISO2 codes before country lookup.
    pub country_rewrites: CountryRewrites,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country_rewrites: CountryRewrites::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn geometry_matches_original_for_512_byte_blocks() {
        assert_eq!(NODES_PER_CLUSTER, 63);
        assert_eq!(LEVELS_PER_CLUSTER, 6);
        assert_eq!(padding_bytes(), 6);
    }

    #[test]
    fn rewrite_table_matches_original_source() {
        let table = CountryRewrites::historical_default();
        assert_eq!(table.rewrite("cs"), "cz");
        assert_eq!(table.rewrite("tp"), "tl");
        assert_eq!(table.rewrite("uk"), "gb");
        assert_eq!(table.rewrite("pt"), "pt");
    }
}

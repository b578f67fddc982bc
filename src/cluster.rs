// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// On-disk cluster format: a complete balanced sub-tree of `K` nodes plus the
// `K+1` child-cluster indices, packed into exactly one `BLOCK_SIZE` block.
//
// Mirrors `ip2cc.h`'s `s_node4`/`s_cluster4`
// structs (here: `(u32 ip, u16 ccsz)` nodes, no padding between fields,
// followed by the `next[]` array) and on lsm-tree's
// `key.rs`/`coding.rs` pair for how to express a fixed byte-exact layout as
// `Encode`/`Decode` impls over `byteorder`. The original commits to host
// byte order, a known portability footgun; this format commits to
// little-endian explicitly instead.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use crate::config::{NODES_PER_CLUSTER, NO_CHILD, SENTINEL_CCSZ, SENTINEL_IP};

/// One on-disk node: a start IP and its packed `ccsz` word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub ip: u32,
    pub ccsz: u16,
}

impl Node {
    pub const SENTINEL: Self = Self { ip: SENTINEL_IP, ccsz: SENTINEL_CCSZ };

    #[must_use]
    pub fn is_sentinel(self) -> bool {
        self.ip == SENTINEL_IP
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::SENTINEL
    }
}

/// One disk block: `NODES_PER_CLUSTER` nodes in implicit-BST order plus
/// `NODES_PER_CLUSTER + 1` child-cluster indices, one per leaf slot.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub nodes: Vec<Node>,
    pub next: Vec<u32>,
}

impl Cluster {
    /// An empty cluster: every node slot is the sentinel, every `next[]`
    /// entry is [`NO_CHILD`]. The writer starts from this and fills in real
    /// nodes at their assigned slots.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node::SENTINEL; NODES_PER_CLUSTER],
            next: vec![NO_CHILD; NODES_PER_CLUSTER + 1],
        }
    }
}

impl Encode for Cluster {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        debug_assert_eq!(self.nodes.len(), NODES_PER_CLUSTER);
        debug_assert_eq!(self.next.len(), NODES_PER_CLUSTER + 1);

        for node in &self.nodes {
            writer.write_u32::<LittleEndian>(node.ip)?;
            writer.write_u16::<LittleEndian>(node.ccsz)?;
        }
        for &cluster in &self.next {
            // NOTE: the on-disk format stores cluster indices as u16;
            // a database with more than 65535 clusters does not fit this
            // format and is rejected earlier, in the writer.
            #[allow(clippy::cast_possible_truncation)]
            writer.write_u16::<LittleEndian>(cluster as u16)?;
        }
        writer.write_all(&vec![0u8; crate::config::padding_bytes()])?;

        Ok(())
    }
}

impl Decode for Cluster {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut nodes = Vec::with_capacity(NODES_PER_CLUSTER);
        for _ in 0..NODES_PER_CLUSTER {
            let ip = reader.read_u32::<LittleEndian>()?;
            let ccsz = reader.read_u16::<LittleEndian>()?;
            nodes.push(Node { ip, ccsz });
        }

        let mut next = Vec::with_capacity(NODES_PER_CLUSTER + 1);
        for _ in 0..=NODES_PER_CLUSTER {
            next.push(u32::from(reader.read_u16::<LittleEndian>()?));
        }

        let mut padding = vec![0u8; crate::config::padding_bytes()];
        reader.read_exact(&mut padding).map_err(|_| DecodeError::ShortRead {
            expected: crate::config::padding_bytes(),
            got: 0,
        })?;

        Ok(Self { nodes, next })
    }
}

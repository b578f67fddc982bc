// A hand-corrupted database containing a `next[]` back-edge (here, a
// cluster pointing at itself) must make the lookup return the corrupt-
// database error, never loop forever.

use std::fs::File;
use std::io::{Cursor, Write};

use ip4cc::cluster::{Cluster, Node};
use ip4cc::coding::Encode;
use ip4cc::error::{CorruptReason, LookupError};
use ip4cc::lookup::find_ip4_country;
use ip4cc::range_code::RangeSize;

/// A cluster where every node on the implicit-BST "always go right" path
/// (slots 31, 47, 55, 59, 61, 62 for `K=63`) holds the degenerate range
/// `[0, 0]`, so any query `ip > 0` walks that path to its end deterministically.
fn rightmost_path_cluster(next_63: u32) -> Cluster {
    let mut cluster = Cluster::empty();
    let ccsz = RangeSize { shift_unit: 0, size_minus_one: 0 }.pack(0);
    for slot in [31, 47, 55, 59, 61, 62] {
        cluster.nodes[slot] = Node { ip: 0, ccsz };
    }
    cluster.next[63] = next_63;
    cluster
}

#[test]
fn self_referencing_cluster_is_reported_corrupt_not_an_infinite_loop() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("corrupt.ip4db");

    let cluster0 = rightmost_path_cluster(1);
    let cluster1 = rightmost_path_cluster(1); // self-loop

    let mut buf = Vec::new();
    cluster0.encode_into(&mut buf).unwrap();
    cluster1.encode_into(&mut buf).unwrap();

    let mut file = File::create(&db_path).unwrap();
    file.write_all(&buf).unwrap();
    drop(file);

    let mut db = File::open(&db_path).unwrap();
    let err = find_ip4_country(5, &mut db).unwrap_err();
    assert!(matches!(
        err,
        LookupError::Corrupt(CorruptReason::BackEdge { from_cluster: 1, to_cluster: 1 })
    ));

    // Same file content read from an in-memory cursor behaves identically.
    let mut cursor = Cursor::new(buf);
    let err = find_ip4_country(5, &mut cursor).unwrap_err();
    assert!(matches!(
        err,
        LookupError::Corrupt(CorruptReason::BackEdge { from_cluster: 1, to_cluster: 1 })
    ));
}

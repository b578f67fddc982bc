// A length-12 range (not a power of two, nor any other directly
// encodable shape without fragmentation) is split into representable
// pieces whose union is exactly those 12 addresses.

use std::fs::File;
use std::io::Cursor;

use ip4cc::csv_source::SourceFormat;
use ip4cc::lookup::{find_ip4_country, LookupOutcome};
use ip4cc::{build_database, country, Config};

#[test]
fn length_twelve_range_fragments_and_resolves_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("s5.ip4db");

    let base: u32 = (192u32 << 24) | (0 << 16) | (2 << 8);
    let csv = format!("\"{}\",\"{}\",\"US\",\"x\",\"x\"\n", base, base + 11);
    let report =
        build_database(Cursor::new(csv), SourceFormat::Format1, &db_path, &Config::default()).unwrap();
    assert!(report.fragments_added >= 1, "length 12 cannot be a single fragment");

    let mut db = File::open(&db_path).unwrap();
    let us = country::find_cc("us").unwrap();

    for offset in 0..=11u32 {
        assert_eq!(find_ip4_country(base + offset, &mut db).unwrap(), LookupOutcome::Hit(us));
    }
    assert_eq!(find_ip4_country(base + 12, &mut db).unwrap(), LookupOutcome::Miss);
}

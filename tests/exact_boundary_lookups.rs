// A single range, looked up at and around its exact boundaries, through
// the full build-then-lookup pipeline (CSV text in, temp database file out,
// `find_ip4_country` back in) rather than the in-crate unit tests'
// in-memory shortcuts.

use std::fs::File;
use std::io::Cursor;

use ip4cc::csv_source::SourceFormat;
use ip4cc::lookup::{find_ip4_country, LookupOutcome};
use ip4cc::{build_database, country, Config};

fn ipv4(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(b) << 16) | (u32::from(c) << 8) | u32::from(d)
}

#[test]
fn single_range_exact_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("s1.ip4db");

    let csv = format!(
        "\"{}\",\"{}\",\"au\",\"x\",\"x\"\n",
        ipv4(1, 0, 0, 0),
        ipv4(1, 0, 0, 255)
    );
    build_database(Cursor::new(csv), SourceFormat::Format1, &db_path, &Config::default()).unwrap();

    let mut db = File::open(&db_path).unwrap();
    let au = country::find_cc("au").unwrap();

    assert_eq!(find_ip4_country(ipv4(0, 255, 255, 255), &mut db).unwrap(), LookupOutcome::Miss);
    assert_eq!(find_ip4_country(ipv4(1, 0, 0, 0), &mut db).unwrap(), LookupOutcome::Hit(au));
    assert_eq!(find_ip4_country(ipv4(1, 0, 0, 128), &mut db).unwrap(), LookupOutcome::Hit(au));
    assert_eq!(find_ip4_country(ipv4(1, 0, 0, 255), &mut db).unwrap(), LookupOutcome::Hit(au));
    assert_eq!(find_ip4_country(ipv4(1, 0, 1, 0), &mut db).unwrap(), LookupOutcome::Miss);
}

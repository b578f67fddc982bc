// Two overlapping input ranges (FR then DE) heal into disjoint ranges
// at build time, with the overlap reflected in the build report.

use std::fs::File;
use std::io::Cursor;

use ip4cc::csv_source::SourceFormat;
use ip4cc::lookup::{find_ip4_country, LookupOutcome};
use ip4cc::{build_database, country, Config};

#[test]
fn overlapping_ranges_heal_with_fr_trimmed_before_de() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("s4.ip4db");

    let base: u32 = 10 * 256u32.pow(3);
    let csv = format!(
        "\"{}\",\"{}\",\"FR\",\"x\",\"x\"\n\"{}\",\"{}\",\"DE\",\"x\",\"x\"\n",
        base,
        base + 100,
        base + 50,
        base + 200,
    );
    let report =
        build_database(Cursor::new(csv), SourceFormat::Format1, &db_path, &Config::default()).unwrap();
    assert_eq!(report.lines_overlapped, 1);

    let mut db = File::open(&db_path).unwrap();
    let fr = country::find_cc("fr").unwrap();
    let de = country::find_cc("de").unwrap();

    for offset in 0..50u32 {
        assert_eq!(find_ip4_country(base + offset, &mut db).unwrap(), LookupOutcome::Hit(fr));
    }
    for offset in 50..=200u32 {
        assert_eq!(find_ip4_country(base + offset, &mut db).unwrap(), LookupOutcome::Hit(de));
    }
}

// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Fixed, sorted ISO-3166 alpha-2 country table with integer-index lookup.
//
// Mirrors `ip2cc-countries.h`: the table
// itself (240 codes, already lexicographically sorted) and the `find_cc`
// bisection are reproduced bit-for-bit, just expressed as a slice binary
// search instead of the original's hand-rolled "counting by the fingers"
// loop (lsm-tree's `binary_search::partition_point` is the idiom
// this borrows -- a plain `left`/`right` narrowing loop over a slice).

/// Number of entries in the country table.
pub const COUNTRY_COUNT: usize = CNAME_LOWER.len();

/// Lower-case ISO-3166 alpha-2 codes, sorted ascending. Index into this
/// table is the country ID used throughout the on-disk format.
pub static CNAME_LOWER: &[&str] = &[
    "ad", "ae", "af", "ag", "ai", "al", "am", "an", "ao", "aq", "ar", "as", "at", "au", "aw",
    "az", "ba", "bb", "bd", "be", "bf", "bg", "bh", "bi", "bj", "bm", "bn", "bo", "br", "bs",
    "bt", "bv", "bw", "by", "bz", "ca", "cc", "cd", "cf", "cg", "ch", "ci", "ck", "cl", "cm",
    "cn", "co", "cr", "cu", "cv", "cx", "cy", "cz", "de", "dj", "dk", "dm", "do", "dz", "ec",
    "ee", "eg", "eh", "er", "es", "et", "fi", "fj", "fk", "fm", "fo", "fr", "ga", "gb", "gd",
    "ge", "gf", "gh", "gi", "gl", "gm", "gn", "gp", "gq", "gr", "gs", "gt", "gu", "gw", "gy",
    "hk", "hm", "hn", "hr", "ht", "hu", "id", "ie", "il", "in", "io", "iq", "ir", "is", "it",
    "jm", "jo", "jp", "ke", "kg", "kh", "ki", "km", "kn", "kp", "kr", "kw", "ky", "kz", "la",
    "lb", "lc", "li", "lk", "lr", "ls", "lt", "lu", "lv", "ly", "ma", "mc", "md", "mg", "mh",
    "mk", "ml", "mm", "mn", "mo", "mp", "mq", "mr", "ms", "mt", "mu", "mv", "mw", "mx", "my",
    "mz", "na", "nc", "ne", "nf", "ng", "ni", "nl", "no", "np", "nr", "nu", "nz", "om", "pa",
    "pe", "pf", "pg", "ph", "pk", "pl", "pm", "pn", "pr", "ps", "pt", "pw", "py", "qa", "re",
    "ro", "ru", "rw", "sa", "sb", "sc", "sd", "se", "sg", "sh", "si", "sj", "sk", "sl", "sm",
    "sn", "so", "sr", "st", "sv", "sy", "sz", "tc", "td", "tf", "tg", "th", "tj", "tk", "tl",
    "tm", "tn", "to", "tr", "tt", "tv", "tw", "tz", "ua", "ug", "um", "us", "uy", "uz", "va",
    "vc", "ve", "vg", "vi", "vn", "vu", "wf", "ws", "ye", "yt", "yu", "za", "zm", "zw",
];

/// The country ID type stored in `ccsz` (9 bits, so `0..512`; the table is
/// far smaller than that, but the type models the encoding's real capacity).
pub type CountryId = u16;

/// Looks up the country ID for a 2-letter ISO-3166 code, case-insensitively.
///
/// Returns `None` if `code` is not exactly two ASCII letters or is not
/// present in the table. Mirrors the original's `find_cc`.
#[must_use]
pub fn find_cc(code: &str) -> Option<CountryId> {
    let mut chars = code.chars();
    let (Some(c1), Some(c2), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };
    if !c1.is_ascii_alphabetic() || !c2.is_ascii_alphabetic() {
        return None;
    }

    let lower = [c1.to_ascii_lowercase() as u8, c2.to_ascii_lowercase() as u8];
    let needle = std::str::from_utf8(&lower).expect("two ASCII bytes are valid UTF-8");

    CNAME_LOWER
        .binary_search(&needle)
        .ok()
        .map(|idx| idx as CountryId)
}

/// Returns the lower-case ISO2 code for a country ID, or `None` if out of range.
#[must_use]
pub fn code_for(id: CountryId) -> Option<&'static str> {
    CNAME_LOWER.get(id as usize).copied()
}

/// Returns the upper-case ISO2 code for a country ID, or `None` if out of range.
#[must_use]
pub fn code_for_uppercase(id: CountryId) -> Option<String> {
    code_for(id).map(str::to_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn table_is_sorted() {
        let mut sorted = CNAME_LOWER.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, CNAME_LOWER);
    }

    #[test]
    fn find_cc_round_trips_every_entry() {
        for (i, code) in CNAME_LOWER.iter().enumerate() {
            assert_eq!(find_cc(code), Some(i as CountryId));
            assert_eq!(find_cc(&code.to_ascii_uppercase()), Some(i as CountryId));
        }
    }

    #[test]
    fn find_cc_is_case_insensitive() {
        assert_eq!(find_cc("Pt"), find_cc("pt"));
        assert_eq!(find_cc("PT"), find_cc("pt"));
    }

    #[test]
    fn find_cc_rejects_unknown_codes() {
        assert_eq!(find_cc("cs"), None);
        assert_eq!(find_cc("uk"), None);
        assert_eq!(find_cc("xx"), None);
        assert_eq!(find_cc("a"), None);
        assert_eq!(find_cc("abc"), None);
    }

    #[test]
    fn code_for_round_trips() {
        assert_eq!(code_for(0), Some("ad"));
        assert_eq!(code_for_uppercase(0), Some("AD".to_string()));
        assert_eq!(code_for(COUNTRY_COUNT as CountryId), None);
    }
}

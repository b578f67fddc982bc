// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Source data file reader: turns quoted, comma-separated lines into the
// `(ip_start, ip_end, country)` tuples `ingest::ingest` consumes.
//
// Mirrors `mk-ip4db.c`'s `dfformats[]` and
// its one `fscanf` call per line: four fixed column layouts, selected with
// a `-1`..`-4` flag, each picking out the IP-start/IP-end/country columns
// and ignoring the rest. This format never needs escaped quotes or embedded
// commas within a field, so a small hand-rolled quoted-field splitter
// covers it without pulling in a full CSV parser.

use std::fmt;
use std::io::BufRead;

/// One of the four fixed column layouts `mk-ip4db` has always accepted.
/// Columns not named here exist in the source file but are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `"ip-start","ip-end","iso-country","...","..."` (the default).
    Format1,
    /// `"ip-start","ip-end","iso-country","..."`.
    Format2,
    /// `"...","...","ip-start","ip-end","iso-country","...","..."`.
    Format3,
    /// `"...","...","ip-start","ip-end","iso-country","..."`.
    Format4,
}

impl SourceFormat {
    /// Parses a `-1`..`-4` command-line flag into a format, mirroring the
    /// original's `-#` argument.
    #[must_use]
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-1" => Some(Self::Format1),
            "-2" => Some(Self::Format2),
            "-3" => Some(Self::Format3),
            "-4" => Some(Self::Format4),
            _ => None,
        }
    }

    /// `(ip_start column, ip_end column, country column, minimum column count)`.
    fn columns(self) -> (usize, usize, usize, usize) {
        match self {
            Self::Format1 => (0, 1, 2, 3),
            Self::Format2 => (0, 1, 2, 3),
            Self::Format3 => (2, 3, 4, 5),
            Self::Format4 => (2, 3, 4, 5),
        }
    }
}

impl Default for SourceFormat {
    fn default() -> Self {
        Self::Format1
    }
}

/// Errors raised while reading a source data file.
#[derive(Debug)]
pub enum SourceError {
    /// I/O failure reading the underlying file.
    Io(std::io::Error),
    /// A line did not contain the columns its [`SourceFormat`] requires, or
    /// its IP columns were not unsigned integers.
    Malformed { line: usize },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Malformed { line } => write!(f, "line {line} does not match the selected column format"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Splits a line on top-level commas, stripping one layer of double quotes
/// from each field. Quotes toggle a "protected" state rather than being
/// matched pairwise, which is sufficient for this format: fields never
/// contain embedded commas or escaped quotes.
fn split_quoted_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' | '\n' => {}
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_line(line: &str, format: SourceFormat) -> Option<(u32, u32, String)> {
    let fields = split_quoted_fields(line);
    let (start_col, end_col, country_col, min_columns) = format.columns();
    if fields.len() < min_columns {
        return None;
    }

    let ip_start: u32 = fields[start_col].trim().parse().ok()?;
    let ip_end: u32 = fields[end_col].trim().parse().ok()?;
    let country = fields[country_col].trim();
    if country.chars().count() != 2 {
        return None;
    }

    Some((ip_start, ip_end, country.to_string()))
}

/// Iterator over `(ip_start, ip_end, country)` tuples read line-by-line from
/// a source data file. Blank lines are skipped silently (the common
/// trailing-newline-at-EOF case); any other line that does not match
/// `format` yields a [`SourceError::Malformed`], matching the original's
/// hard stop on the first unparsable line rather than skipping it (unlike a
/// merely out-of-range IP or unknown country, which `ingest` skips and
/// counts instead).
pub struct TupleReader<R> {
    lines: std::io::Lines<R>,
    format: SourceFormat,
    line_no: usize,
}

impl<R: BufRead> TupleReader<R> {
    #[must_use]
    pub fn new(reader: R, format: SourceFormat) -> Self {
        Self { lines: reader.lines(), format, line_no: 0 }
    }
}

impl<R: BufRead> Iterator for TupleReader<R> {
    type Item = Result<(u32, u32, String), SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(SourceError::Io(e))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_line(&line, self.format).ok_or(SourceError::Malformed { line: self.line_no }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_log::test;

    #[test]
    fn format1_reads_ip_start_ip_end_country() {
        let line = r#""3232235521","3232235530","pt","ignored","ignored""#;
        let (start, end, country) = parse_line(line, SourceFormat::Format1).unwrap();
        assert_eq!(start, 3_232_235_521);
        assert_eq!(end, 3_232_235_530);
        assert_eq!(country, "pt");
    }

    #[test]
    fn format2_has_one_fewer_trailing_column() {
        let line = r#""1","2","fr","ignored""#;
        let (start, end, country) = parse_line(line, SourceFormat::Format2).unwrap();
        assert_eq!((start, end, country.as_str()), (1, 2, "fr"));
    }

    #[test]
    fn format3_skips_two_leading_columns() {
        let line = r#""x","y","1","2","de","ignored","ignored""#;
        let (start, end, country) = parse_line(line, SourceFormat::Format3).unwrap();
        assert_eq!((start, end, country.as_str()), (1, 2, "de"));
    }

    #[test]
    fn format4_skips_two_leading_columns_no_trailing() {
        let line = r#""x","y","1","2","es","ignored""#;
        let (start, end, country) = parse_line(line, SourceFormat::Format4).unwrap();
        assert_eq!((start, end, country.as_str()), (1, 2, "es"));
    }

    #[test]
    fn short_line_is_malformed() {
        let line = r#""1","2""#;
        assert_eq!(parse_line(line, SourceFormat::Format1), None);
    }

    #[test]
    fn non_numeric_ip_is_malformed() {
        let line = r#""not-a-number","2","pt""#;
        assert_eq!(parse_line(line, SourceFormat::Format1), None);
    }

    #[test]
    fn reader_skips_blank_lines_and_stops_at_eof() {
        let data = "\"1\",\"2\",\"pt\"\n\n\"3\",\"4\",\"fr\"\n";
        let reader = TupleReader::new(Cursor::new(data), SourceFormat::Format2);
        let tuples: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(tuples, vec![(1, 2, "pt".to_string()), (3, 4, "fr".to_string())]);
    }

    #[test]
    fn reader_reports_malformed_line_number() {
        let data = "\"1\",\"2\",\"pt\"\nnot,valid\n";
        let reader = TupleReader::new(Cursor::new(data), SourceFormat::Format2);
        let results: Vec<_> = reader.collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SourceError::Malformed { line: 2 })));
    }

    #[test]
    fn from_flag_accepts_all_four_formats() {
        assert_eq!(SourceFormat::from_flag("-1"), Some(SourceFormat::Format1));
        assert_eq!(SourceFormat::from_flag("-2"), Some(SourceFormat::Format2));
        assert_eq!(SourceFormat::from_flag("-3"), Some(SourceFormat::Format3));
        assert_eq!(SourceFormat::from_flag("-4"), Some(SourceFormat::Format4));
        assert_eq!(SourceFormat::from_flag("-5"), None);
    }
}

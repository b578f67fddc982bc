// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

// Ingest & normalize: turn raw `(start, end, iso2)` tuples into a sorted,
// disjoint, fully-encodable list of ranges.
//
// Mirrors `mk-ip4db.c`'s main loop (the
// sorted-insert-with-overlap-trim, adjacent-coalesce and fragment passes).
// `mk-ip4db.c`'s doubly linked list is replaced here with a sorted `Vec` with
// binary-search insertion instead of a linked list: the original's
// backward-walking overlap scan always collapses to trimming the
// immediate predecessor and successor of the inserted node only (any
// cascading past those two is a side effect of the list being shared,
// not a change in the final disjoint range set), so this is the same
// normalization expressed over contiguous memory. A later-arriving tuple
// always wins the region it shares with an earlier one (spec.md S4): the
// existing predecessor/successor are trimmed or removed, never the
// candidate being inserted.

use crate::binary_search::partition_point;
use crate::config::{Config, CountryRewrites};
use crate::country::{find_cc, CountryId};
use crate::error::IngestError;
use crate::range_code::{fragment, Fragment};

/// One disjoint, normalized logical range, prior to `ccsz` fragmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRange {
    pub start: u32,
    pub end: u32,
    pub country: CountryId,
}

impl RawRange {
    #[must_use]
    pub fn length(self) -> u64 {
        u64::from(self.end) - u64::from(self.start) + 1
    }
}

/// One fragment ready to become a tree node: an IP and its packed `ccsz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedEntry {
    pub ip: u32,
    pub ccsz: u16,
}

/// Counters accumulated while ingesting and normalizing input tuples,
/// mirroring the `printf` trail of the original `mk-ip4db.c` (its
/// `lines`, `lines_reorder`, `lines_overlap`, `lines_overlap_del`,
/// `lines_saved`, `lines_added` variables). These are diagnostics for the
/// CLI to print, not part of the algorithmic contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildReport {
    pub lines_read: usize,
    pub lines_skipped_bad_range: usize,
    pub lines_skipped_bad_country: usize,
    pub lines_reordered: usize,
    pub lines_overlapped: usize,
    pub lines_overlap_deleted: usize,
    pub lines_coalesced: usize,
    pub fragments_added: usize,
    pub total_entries: usize,
    pub total_clusters: u32,
    pub first_tail_cluster: u32,
}

/// Resolves an ISO2 code through the rewrite table and the country table,
/// applying the historical `CS`/`TP`/`UK` rewrites before lookup.
#[must_use]
pub fn resolve_country(code: &str, rewrites: &CountryRewrites) -> Option<CountryId> {
    let mut lower = [0u8; 2];
    let mut chars = code.chars();
    let (Some(c1), Some(c2), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };
    lower[0] = c1.to_ascii_lowercase() as u8;
    lower[1] = c2.to_ascii_lowercase() as u8;
    let lower = std::str::from_utf8(&lower).ok()?;
    let rewritten = rewrites.rewrite(lower);
    find_cc(rewritten)
}

/// Inserts `candidate` into `ranges` (kept sorted ascending, disjoint). The
/// candidate always wins the region it shares with an existing range: the
/// existing predecessor and/or successor are trimmed, split, or (if fully
/// covered) removed outright -- per spec.md S4, a later tuple supersedes an
/// earlier one over their shared region, so it is never the candidate that
/// gets cut down.
fn insert_trimmed(ranges: &mut Vec<RawRange>, candidate: RawRange, report: &mut BuildReport) {
    let RawRange { start, end, country } = candidate;
    let mut pos = partition_point(ranges, |r| r.start <= start);

    // The predecessor (if any) is the existing range with the largest
    // `start <= candidate.start`; it may keep a sliver before the
    // candidate, a sliver after it, both, or neither.
    let mut pred_tail = None;
    if pos > 0 && ranges[pos - 1].end >= start {
        report.lines_overlapped += 1;
        let pred = ranges[pos - 1];
        let keeps_front = pred.start < start;
        if pred.end > end {
            pred_tail = Some(RawRange { start: end + 1, end: pred.end, country: pred.country });
        }
        if keeps_front {
            ranges[pos - 1].end = start - 1;
        } else {
            ranges.remove(pos - 1);
            pos -= 1;
            if pred_tail.is_none() {
                report.lines_overlap_deleted += 1;
            }
        }
    }

    // Any successor(s) starting within the candidate are consumed from
    // their front; the first one that extends past the candidate's end is
    // trimmed instead of removed, and nothing past it can overlap.
    while pos < ranges.len() && ranges[pos].start <= end {
        report.lines_overlapped += 1;
        if ranges[pos].end > end {
            ranges[pos].start = end + 1;
            break;
        }
        ranges.remove(pos);
        report.lines_overlap_deleted += 1;
    }

    if pos != ranges.len() {
        report.lines_reordered += 1;
    }
    ranges.insert(pos, RawRange { start, end, country });
    if let Some(tail) = pred_tail {
        ranges.insert(pos + 1, tail);
    }
}

/// Runs the full ingest pipeline: filter, sorted-insert-with-trim,
/// coalesce, fragment, verify. Returns the encoded, tree-ready entries in
/// ascending `ip` order plus a diagnostic report.
///
/// # Errors
///
/// Returns [`IngestError`] if the normalized list fails its post-ingest
/// verification (an internal-bug condition that should be unreachable on
/// well-formed input).
pub fn ingest<I>(tuples: I, config: &Config) -> Result<(Vec<EncodedEntry>, BuildReport), IngestError>
where
    I: IntoIterator<Item = (u32, u32, String)>,
{
    let mut report = BuildReport::default();
    let mut ranges: Vec<RawRange> = Vec::new();

    for (start, end, code) in tuples {
        report.lines_read += 1;

        if end < start {
            report.lines_skipped_bad_range += 1;
            log::warn!("skipping range {start}-{end}: end precedes start");
            continue;
        }
        let Some(country) = resolve_country(&code, &config.country_rewrites) else {
            report.lines_skipped_bad_country += 1;
            log::warn!("skipping range {start}-{end}: unknown country code {code:?}");
            continue;
        };

        insert_trimmed(&mut ranges, RawRange { start, end, country }, &mut report);
    }

    if ranges.is_empty() {
        return Ok((Vec::new(), report));
    }

    // Coalesce adjacent ranges of the same country.
    let mut coalesced: Vec<RawRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        if let Some(last) = coalesced.last_mut() {
            if last.country == r.country && last.end + 1 == r.start {
                last.end = r.end;
                report.lines_coalesced += 1;
                continue;
            }
        }
        coalesced.push(r);
    }

    // Fragment each range into encodable pieces.
    let mut entries = Vec::with_capacity(coalesced.len());
    for r in &coalesced {
        let frags: Vec<Fragment> = fragment(r.length());
        report.fragments_added += frags.len().saturating_sub(1);
        for frag in frags {
            let ip = r.start
                .checked_add(u32::try_from(frag.offset).map_err(|_| IngestError::Unencodable {
                    start: r.start,
                    length: r.length(),
                })?)
                .ok_or(IngestError::Unencodable { start: r.start, length: r.length() })?;
            entries.push(EncodedEntry { ip, ccsz: frag.size.pack(r.country) });
        }
    }

    verify(&entries)?;
    report.total_entries = entries.len();
    Ok((entries, report))
}

/// Checks the invariants the original source verifies by forward and
/// backward traversal: the forward and backward entry counts agree, the
/// entries are sorted ascending, and they are pairwise disjoint once their
/// encoded lengths are taken into account.
fn verify(entries: &[EncodedEntry]) -> Result<(), IngestError> {
    let forward = entries.iter().count();
    let backward = entries.iter().rev().count();
    if forward != backward {
        return Err(IngestError::TraversalCountMismatch { forward, backward });
    }

    for (idx, pair) in entries.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        let (_, size) = crate::range_code::RangeSize::unpack(a.ccsz);
        let a_end = u64::from(a.ip) + size.length() - 1;
        if u64::from(b.ip) <= a_end {
            return Err(IngestError::AdjacentOverlap { at_index: idx });
        }
    }
    Ok(())
}

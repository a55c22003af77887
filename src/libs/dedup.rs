use std::collections::BTreeMap;
use std::fmt;

use fxhash::FxHashSet;

use crate::libs::digest::DigestedGenome;
use crate::libs::error::U4cError;

/// Contacts farther than this from the viewpoint are discarded.
pub const DEFAULT_MAX_DIST: u64 = 10_000_000;

//----------------------------
// SiteRow
//----------------------------

/// One aligned read: mapped coordinate and molecule tag.
///
/// `chr` of `*` marks an unmapped read, SAM convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRow {
    pub chr: String,
    pub pos: u64,
    pub umi: String,
}

impl SiteRow {
    /// ```
    /// use umi4c::libs::dedup::SiteRow;
    /// let row = SiteRow::parse("chr2\t1200\tACGTACGT").unwrap();
    /// assert_eq!(row.pos, 1200);
    /// ```
    pub fn parse(line: &str) -> Result<Self, U4cError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 3 {
            return Err(U4cError::Integrity(format!(
                "site row needs 3 fields, got {}: `{}`",
                fields.len(),
                line
            )));
        }
        let pos: u64 = if fields[0] == "*" {
            0
        } else {
            fields[1]
                .parse()
                .map_err(|_| U4cError::Integrity(format!("bad site position `{}`", fields[1])))?
        };

        Ok(Self {
            chr: fields[0].to_string(),
            pos,
            umi: fields[2].to_string(),
        })
    }

    pub fn is_unmapped(&self) -> bool {
        self.chr == "*"
    }
}

impl fmt::Display for SiteRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}\t{}\t{}", self.chr, self.pos, self.umi)
    }
}

//----------------------------
// ContactRow
//----------------------------

/// Persisted per-sample contact: one fragment interval and its deduplicated
/// UMI count. Zero-count fragments are never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    pub count: u64,
}

impl ContactRow {
    /// ```
    /// use umi4c::libs::dedup::ContactRow;
    /// let row = ContactRow::parse("chr2\t100\t250\t7").unwrap();
    /// assert_eq!(row.count, 7);
    /// assert!(ContactRow::parse("chr2\t100\t250\t-7").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self, U4cError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(U4cError::Integrity(format!(
                "contact row needs 4 fields, got {}: `{}`",
                fields.len(),
                line
            )));
        }
        let start: u64 = fields[1]
            .parse()
            .map_err(|_| U4cError::Integrity(format!("bad contact start `{}`", fields[1])))?;
        let end: u64 = fields[2]
            .parse()
            .map_err(|_| U4cError::Integrity(format!("bad contact end `{}`", fields[2])))?;
        let count: u64 = fields[3].parse().map_err(|_| {
            U4cError::Integrity(format!("contact count must be a non-negative integer, got `{}`", fields[3]))
        })?;
        if start >= end {
            return Err(U4cError::Integrity(format!(
                "contact {}:{}-{} is empty or reversed",
                fields[0], start, end
            )));
        }

        Ok(Self {
            chr: fields[0].to_string(),
            start,
            end,
            count,
        })
    }

    pub fn midpoint(&self) -> u64 {
        (self.start + self.end) / 2
    }
}

impl fmt::Display for ContactRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}\t{}\t{}\t{}", self.chr, self.start, self.end, self.count)
    }
}

//----------------------------
// StageCounters
//----------------------------

/// Queryable per-stage read counts for QC reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounters {
    /// Bait-specific reads reaching the counter
    pub specific: u64,
    pub mapped: u64,
    pub unmapped: u64,
    /// Mapped reads dropped by chromosome, distance bound or fragment lookup
    pub filtered: u64,
    /// Distinct (fragment, UMI) pairs retained
    pub umis: u64,
}

impl fmt::Display for StageCounters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "specific\t{}", self.specific)?;
        writeln!(f, "mapped\t{}", self.mapped)?;
        writeln!(f, "unmapped\t{}", self.unmapped)?;
        writeln!(f, "filtered\t{}", self.filtered)?;
        writeln!(f, "umis\t{}", self.umis)
    }
}

//----------------------------
// Counting
//----------------------------

/// Collapse aligned sites into deduplicated per-fragment contact counts.
///
/// Each distinct (fragment, UMI) pair contributes exactly one count no
/// matter how many read pairs produced it, so the result is invariant under
/// input reordering and duplication. Fragments with no retained UMI are
/// absent from the map, not present with 0.
pub fn count_contacts(
    digest: &DigestedGenome,
    vp_chr: &str,
    vp_pos: u64,
    max_dist: u64,
    rows: impl IntoIterator<Item = SiteRow>,
) -> (BTreeMap<usize, u64>, StageCounters) {
    let mut seen: FxHashSet<(usize, String)> = FxHashSet::default();
    let mut counts: BTreeMap<usize, u64> = BTreeMap::new();
    let mut counters = StageCounters::default();

    for row in rows {
        counters.specific += 1;
        if row.is_unmapped() {
            counters.unmapped += 1;
            continue;
        }
        counters.mapped += 1;

        if row.chr != vp_chr {
            counters.filtered += 1;
            continue;
        }
        let Some(frag) = digest.find_fragment(&row.chr, row.pos) else {
            counters.filtered += 1;
            continue;
        };
        let mid = frag.midpoint();
        let dist = if mid >= vp_pos { mid - vp_pos } else { vp_pos - mid };
        if dist > max_dist {
            counters.filtered += 1;
            continue;
        }

        if seen.insert((frag.index, row.umi)) {
            *counts.entry(frag.index).or_insert(0) += 1;
        }
    }

    counters.umis = seen.len() as u64;
    (counts, counters)
}

/// Turn fragment-indexed counts into persistable contact rows, sorted by
/// coordinate.
pub fn contact_rows(
    digest: &DigestedGenome,
    chr: &str,
    counts: &BTreeMap<usize, u64>,
) -> Vec<ContactRow> {
    let Some(frags) = digest.fragments(chr) else {
        return vec![];
    };

    counts
        .iter()
        .filter_map(|(&index, &count)| {
            frags.get(index).map(|frag| ContactRow {
                chr: chr.to_string(),
                start: frag.start,
                end: frag.end,
                count,
            })
        })
        .collect()
}

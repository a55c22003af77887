use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::libs::dedup::ContactRow;
use crate::libs::diff::DifferentialResult;
use crate::libs::domainogram::Domainogram;
use crate::libs::error::U4cError;
use crate::libs::sample::SampleSheet;
use crate::libs::trend::TrendCurve;

pub const DEFAULT_EXCLUSION: u64 = 3_000;
pub const DEFAULT_HALF_WIDTH: u64 = 1_000_000;
pub const DEFAULT_GROUP_BY: &str = "condition";

//----------------------------
// Viewpoint
//----------------------------

/// The bait interval all contacts are anchored to. 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewpoint {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

impl Viewpoint {
    pub fn new(chr: &str, start: u64, end: u64) -> Result<Self, U4cError> {
        if start >= end {
            return Err(U4cError::Config(format!(
                "viewpoint {}:{}-{} is empty or reversed",
                chr, start, end
            )));
        }
        Ok(Self {
            chr: chr.to_string(),
            start,
            end,
        })
    }

    /// The anchor coordinate distances are measured from.
    pub fn pos(&self) -> u64 {
        (self.start + self.end) / 2
    }
}

//----------------------------
// Build parameters
//----------------------------

#[derive(Debug, Clone)]
pub struct BuildParams {
    /// Fragments closer than this to the viewpoint are excluded
    pub exclusion: u64,
    /// Analysis region half-width on each side of the viewpoint
    pub half_width: u64,
    /// Sample sheet column whose values define the groups
    pub group_by: String,
    /// Explicit reference group; min-total group when absent
    pub reference: Option<String>,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            exclusion: DEFAULT_EXCLUSION,
            half_width: DEFAULT_HALF_WIDTH,
            group_by: DEFAULT_GROUP_BY.to_string(),
            reference: None,
        }
    }
}

//----------------------------
// Rows and group columns
//----------------------------

/// One retained fragment interval on the viewpoint chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRow {
    pub start: u64,
    pub end: u64,
}

impl FragmentRow {
    pub fn midpoint(&self) -> u64 {
        (self.start + self.end) / 2
    }

    pub fn width(&self) -> u64 {
        self.end - self.start
    }
}

/// One aggregated group column over the fragment grid.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub samples: Vec<String>,
    /// Raw UMI counts, one per fragment row
    pub raw: Vec<u64>,
    /// Raw counts scaled by the normalization factor
    pub norm: Vec<f64>,
    pub factor: f64,
}

impl Group {
    pub fn raw_total(&self) -> u64 {
        self.raw.iter().sum()
    }

    pub fn norm_total(&self) -> f64 {
        self.norm.iter().sum()
    }
}

//----------------------------
// Experiment
//----------------------------

/// The assembled, grouped, normalized contact profile around one viewpoint.
///
/// Immutable after construction except for the derived artifacts, which are
/// appended once and never mutated in place. Artifacts are owned forward-only;
/// they never point back into the container.
#[derive(Debug, Clone)]
pub struct Experiment {
    viewpoint: Viewpoint,
    exclusion: u64,
    region_start: u64,
    region_end: u64,
    group_by: String,
    rows: Vec<FragmentRow>,
    groups: Vec<Group>,
    reference: usize,

    domainogram: Option<Vec<Domainogram>>,
    trend: Option<Vec<TrendCurve>>,
    differential: Option<DifferentialResult>,
}

impl Experiment {
    /// Assemble the union grid, aggregate sample columns into groups and
    /// normalize every group to the reference total.
    pub fn build(
        sheet: &SampleSheet,
        counts: &[(String, Vec<ContactRow>)],
        viewpoint: &Viewpoint,
        params: &BuildParams,
    ) -> Result<Self, U4cError> {
        let vp = viewpoint.pos();
        let region_start = vp.saturating_sub(params.half_width);
        let region_end = vp + params.half_width;

        let known: Vec<&str> = sheet.samples();
        for (sample, _) in counts {
            if !known.contains(&sample.as_str()) {
                return Err(U4cError::Integrity(format!(
                    "contact counts supplied for unknown sample `{}`",
                    sample
                )));
            }
        }

        let retained = |row: &ContactRow| {
            if row.chr != viewpoint.chr {
                return false;
            }
            let mid = row.midpoint();
            if mid < region_start || mid > region_end {
                return false;
            }
            let dist = if mid >= vp { mid - vp } else { vp - mid };
            dist >= params.exclusion
        };

        // 1. union coordinate grid over all samples
        let mut grid: BTreeSet<(u64, u64)> = BTreeSet::new();
        for (_, rows) in counts {
            for row in rows.iter().filter(|r| retained(r)) {
                grid.insert((row.start, row.end));
            }
        }
        if grid.is_empty() {
            return Err(U4cError::Empty(format!(
                "no fragments retained around {}:{} (half-width {}, exclusion {})",
                viewpoint.chr, vp, params.half_width, params.exclusion
            )));
        }

        let rows_vec: Vec<FragmentRow> = grid
            .iter()
            .map(|&(start, end)| FragmentRow { start, end })
            .collect();
        // overlaps mean the samples were counted against different digests
        for w in rows_vec.windows(2) {
            if w[1].start < w[0].end {
                return Err(U4cError::Integrity(format!(
                    "overlapping fragments {}:{}-{} and {}:{}-{}; \
                     contact tables disagree on the restriction map",
                    viewpoint.chr, w[0].start, w[0].end, viewpoint.chr, w[1].start, w[1].end
                )));
            }
        }
        let index_of: IndexMap<(u64, u64), usize> = grid
            .iter()
            .enumerate()
            .map(|(i, &key)| (key, i))
            .collect();

        // 2. per-sample vectors; absent fragments stay 0
        let mut columns: IndexMap<&str, Vec<u64>> = known
            .iter()
            .map(|&s| (s, vec![0u64; rows_vec.len()]))
            .collect();
        for (sample, rows) in counts {
            let column = columns
                .get_mut(sample.as_str())
                .expect("sample membership checked above");
            for row in rows.iter().filter(|r| retained(r)) {
                let i = index_of[&(row.start, row.end)];
                column[i] += row.count;
            }
        }

        // 3. aggregate columns sharing a grouping value
        let membership = sheet.groups(&params.group_by)?;
        let mut groups: Vec<Group> = membership
            .into_iter()
            .map(|(name, samples)| {
                let mut raw = vec![0u64; rows_vec.len()];
                for sample in &samples {
                    for (i, &c) in columns[sample.as_str()].iter().enumerate() {
                        raw[i] += c;
                    }
                }
                Group {
                    name,
                    samples,
                    raw,
                    norm: vec![],
                    factor: 1.0,
                }
            })
            .collect();

        // 4. reference group: explicit override or minimum total
        let reference = match &params.reference {
            Some(name) => groups.iter().position(|g| &g.name == name).ok_or_else(|| {
                U4cError::Config(format!(
                    "reference group `{}` not among group labels ({})",
                    name,
                    groups.iter().map(|g| g.name.as_str()).collect::<Vec<_>>().join(", ")
                ))
            })?,
            None => groups
                .iter()
                .enumerate()
                .min_by_key(|(_, g)| g.raw_total())
                .map(|(i, _)| i)
                .expect("at least one group exists"),
        };

        // 5. normalization factors, applied unrounded
        let ref_total = groups[reference].raw_total();
        for group in &mut groups {
            let total = group.raw_total();
            group.factor = if total == 0 {
                log::warn!(
                    "group `{}` has no counts in the retained region",
                    group.name
                );
                0.0
            } else {
                ref_total as f64 / total as f64
            };
            group.norm = group.raw.iter().map(|&c| c as f64 * group.factor).collect();
        }

        Ok(Self {
            viewpoint: viewpoint.clone(),
            exclusion: params.exclusion,
            region_start,
            region_end,
            group_by: params.group_by.clone(),
            rows: rows_vec,
            groups,
            reference,
            domainogram: None,
            trend: None,
            differential: None,
        })
    }

    //----------------------------
    // Accessors
    //----------------------------

    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    /// Analysis region `[start, end]` on the viewpoint chromosome.
    pub fn region(&self) -> (u64, u64) {
        (self.region_start, self.region_end)
    }

    /// Bait exclusion interval around the viewpoint anchor.
    pub fn exclusion_region(&self) -> (u64, u64) {
        let vp = self.viewpoint.pos();
        (vp.saturating_sub(self.exclusion), vp + self.exclusion)
    }

    pub fn group_by(&self) -> &str {
        &self.group_by
    }

    pub fn rows(&self) -> &[FragmentRow] {
        &self.rows
    }

    pub fn midpoints(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.midpoint()).collect()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Index of the reference group within `groups()`.
    pub fn reference(&self) -> usize {
        self.reference
    }

    pub fn reference_group(&self) -> &Group {
        &self.groups[self.reference]
    }

    //----------------------------
    // Derived artifacts
    //----------------------------

    pub fn attach_domainogram(&mut self, grids: Vec<Domainogram>) {
        self.domainogram = Some(grids);
    }

    pub fn domainogram(&self) -> Option<&[Domainogram]> {
        self.domainogram.as_deref()
    }

    pub fn attach_trend(&mut self, curves: Vec<TrendCurve>) {
        self.trend = Some(curves);
    }

    pub fn trend(&self) -> Option<&[TrendCurve]> {
        self.trend.as_deref()
    }

    pub fn attach_differential(&mut self, result: DifferentialResult) {
        self.differential = Some(result);
    }

    pub fn differential(&self) -> Option<&DifferentialResult> {
        self.differential.as_ref()
    }
}

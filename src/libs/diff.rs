use std::fmt;

use crate::libs::error::U4cError;
use crate::libs::experiment::Experiment;
use crate::libs::stat;

pub const DEFAULT_BIN_SIZE: u64 = 5_000;
pub const DEFAULT_MIN_COUNT: u64 = 30;
pub const DEFAULT_ALPHA: f64 = 0.05;

//----------------------------
// Query regions
//----------------------------

/// A genomic interval to test, 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRegion {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

impl QueryRegion {
    pub fn new(chr: &str, start: u64, end: u64) -> Self {
        Self {
            chr: chr.to_string(),
            start,
            end,
        }
    }

    /// Resize to `width` bases centered on the current midpoint.
    pub fn resized(&self, width: u64) -> Self {
        let mid = (self.start + self.end) / 2;
        let start = mid.saturating_sub(width / 2);
        Self {
            chr: self.chr.clone(),
            start,
            end: start + width,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiffParams {
    /// Bin width when no explicit regions are supplied
    pub bin_size: u64,
    /// Explicit query regions instead of binning
    pub regions: Option<Vec<QueryRegion>>,
    /// Resize explicit regions to this fixed width around their midpoints
    pub fixed_width: Option<u64>,
    /// Regions with fewer combined raw counts are dropped before testing
    pub min_count: u64,
    /// Adjusted p-value threshold for significance
    pub alpha: f64,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            bin_size: DEFAULT_BIN_SIZE,
            regions: None,
            fixed_width: None,
            min_count: DEFAULT_MIN_COUNT,
            alpha: DEFAULT_ALPHA,
        }
    }
}

//----------------------------
// Results
//----------------------------

/// One tested region with its contingency counts and p-values.
#[derive(Debug, Clone)]
pub struct RegionTest {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    /// Reference-group count in the region
    pub n1: u64,
    /// Reference-group total over the analysis region
    pub total1: u64,
    pub n2: u64,
    pub total2: u64,
    pub p_value: f64,
    pub p_adj: f64,
}

impl RegionTest {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_adj < alpha
    }
}

impl fmt::Display for RegionTest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.6e}\t{:.6e}",
            self.chr,
            self.start,
            self.end,
            self.n1,
            self.total1,
            self.n2,
            self.total2,
            self.p_value,
            self.p_adj
        )
    }
}

/// The differential-contact result of one Fisher/FDR call over two groups.
#[derive(Debug, Clone)]
pub struct DifferentialResult {
    pub reference: String,
    pub other: String,
    pub alpha: f64,
    pub tests: Vec<RegionTest>,
}

impl DifferentialResult {
    pub fn sort_by_position(&mut self) {
        self.tests
            .sort_by(|a, b| (a.chr.as_str(), a.start).cmp(&(b.chr.as_str(), b.start)));
    }

    pub fn sort_by_p_value(&mut self) {
        self.tests.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
    }

    pub fn significant(&self) -> impl Iterator<Item = &RegionTest> {
        self.tests.iter().filter(|t| t.is_significant(self.alpha))
    }
}

//----------------------------
// Testing
//----------------------------

/// Fisher-exact/FDR differential test between the two groups of `exp`.
///
/// Regions come from `params.regions` (resized when a fixed width is set,
/// silently dropped when entirely outside the analysis window) or from
/// binning the analysis region. Raw group counts feed the contingency
/// tables; BH correction runs across all raw p-values of this call.
pub fn fisher_test(exp: &Experiment, params: &DiffParams) -> Result<DifferentialResult, U4cError> {
    let groups = exp.groups();
    if groups.len() != 2 {
        let labels: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        return Err(U4cError::Config(format!(
            "differential testing needs exactly 2 groups, key `{}` yields {} ({})",
            exp.group_by(),
            groups.len(),
            labels.join(", ")
        )));
    }

    let ref_idx = exp.reference();
    let other_idx = 1 - ref_idx;
    let reference = &groups[ref_idx];
    let other = &groups[other_idx];

    let (region_start, region_end) = exp.region();
    let chr = &exp.viewpoint().chr;

    let regions: Vec<QueryRegion> = match &params.regions {
        Some(list) => list
            .iter()
            .map(|r| match params.fixed_width {
                Some(width) => r.resized(width),
                None => r.clone(),
            })
            .filter(|r| r.chr == *chr && r.end > region_start && r.start < region_end)
            .collect(),
        None => {
            let mut bins = vec![];
            let mut start = region_start;
            while start < region_end {
                let end = (start + params.bin_size).min(region_end);
                bins.push(QueryRegion::new(chr, start, end));
                start = end;
            }
            bins
        }
    };

    let mids = exp.midpoints();
    let total1 = reference.raw_total();
    let total2 = other.raw_total();

    // per-region counts; low-support regions take no part in the FDR family
    let mut kept: Vec<(QueryRegion, u64, u64)> = vec![];
    for region in regions {
        let lo = mids.partition_point(|&m| m < region.start);
        let hi = mids.partition_point(|&m| m < region.end);
        let n1: u64 = reference.raw[lo..hi].iter().sum();
        let n2: u64 = other.raw[lo..hi].iter().sum();
        if n1 + n2 < params.min_count {
            continue;
        }
        kept.push((region, n1, n2));
    }
    if kept.is_empty() {
        return Err(U4cError::Empty(
            "no regions passed the low-count filter".to_string(),
        ));
    }

    let p_values: Vec<f64> = kept
        .iter()
        .map(|&(_, n1, n2)| stat::fisher_exact(n1, total1 - n1, n2, total2 - n2))
        .collect();
    let p_adj = stat::benjamini_hochberg(&p_values);

    let tests = kept
        .into_iter()
        .zip(p_values)
        .zip(p_adj)
        .map(|(((region, n1, n2), p_value), p_adj)| RegionTest {
            chr: region.chr,
            start: region.start,
            end: region.end,
            n1,
            total1,
            n2,
            total2,
            p_value,
            p_adj,
        })
        .collect();

    Ok(DifferentialResult {
        reference: reference.name.clone(),
        other: other.name.clone(),
        alpha: params.alpha,
        tests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::dedup::ContactRow;
    use crate::libs::experiment::{BuildParams, Viewpoint};
    use crate::libs::sample::SampleSheet;

    fn sheet(conditions: &[(&str, &str)]) -> SampleSheet {
        let mut text = String::from("sample\treplicate\tcondition\tfile\n");
        for (sample, condition) in conditions {
            text.push_str(&format!("{}\t1\t{}\t{}.tsv\n", sample, condition, sample));
        }
        SampleSheet::parse(&text).unwrap()
    }

    fn contact(start: u64, end: u64, count: u64) -> ContactRow {
        ContactRow {
            chr: "chr1".to_string(),
            start,
            end,
            count,
        }
    }

    fn two_group_experiment() -> Experiment {
        let sheet = sheet(&[("wt_1", "wt"), ("ko_1", "ko")]);
        let counts = vec![
            (
                "wt_1".to_string(),
                vec![contact(110_000, 111_000, 500), contact(150_000, 151_000, 500)],
            ),
            (
                "ko_1".to_string(),
                vec![contact(110_000, 111_000, 500), contact(150_000, 151_000, 500)],
            ),
        ];
        let viewpoint = Viewpoint::new("chr1", 100_000, 100_500).unwrap();
        Experiment::build(&sheet, &counts, &viewpoint, &BuildParams::default()).unwrap()
    }

    #[test]
    fn matched_proportions_p_near_one() {
        let exp = two_group_experiment();
        let result = fisher_test(&exp, &DiffParams::default()).unwrap();

        assert_eq!(result.tests.len(), 2);
        for test in &result.tests {
            assert!(test.p_value > 0.99);
            assert!(!test.is_significant(0.05));
        }
    }

    #[test]
    fn extreme_disjoint_counts_significant() {
        let sheet = sheet(&[("wt_1", "wt"), ("ko_1", "ko")]);
        let counts = vec![
            (
                "wt_1".to_string(),
                vec![contact(110_000, 111_000, 1_000)],
            ),
            (
                "ko_1".to_string(),
                vec![contact(150_000, 151_000, 1_000)],
            ),
        ];
        let viewpoint = Viewpoint::new("chr1", 100_000, 100_500).unwrap();
        let exp =
            Experiment::build(&sheet, &counts, &viewpoint, &BuildParams::default()).unwrap();
        let result = fisher_test(&exp, &DiffParams::default()).unwrap();

        assert_eq!(result.tests.len(), 2);
        for test in &result.tests {
            assert!(test.p_value < 1e-100);
            assert!(test.is_significant(0.05));
        }
    }

    #[test]
    fn three_groups_fail_with_config_error() {
        let sheet = sheet(&[("a_1", "a"), ("b_1", "b"), ("c_1", "c")]);
        let counts = vec![
            ("a_1".to_string(), vec![contact(110_000, 111_000, 100)]),
            ("b_1".to_string(), vec![contact(110_000, 111_000, 100)]),
            ("c_1".to_string(), vec![contact(110_000, 111_000, 100)]),
        ];
        let viewpoint = Viewpoint::new("chr1", 100_000, 100_500).unwrap();
        let exp =
            Experiment::build(&sheet, &counts, &viewpoint, &BuildParams::default()).unwrap();

        // the container stays fine for profiles; only the test refuses
        assert_eq!(exp.groups().len(), 3);
        let err = fisher_test(&exp, &DiffParams::default()).unwrap_err();
        match err {
            U4cError::Config(msg) => {
                assert!(msg.contains("a, b, c"));
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn out_of_window_region_dropped_silently() {
        let exp = two_group_experiment();
        let params = DiffParams {
            regions: Some(vec![
                QueryRegion::new("chr1", 110_000, 112_000),
                QueryRegion::new("chr1", 90_000_000, 90_001_000),
                QueryRegion::new("chr9", 110_000, 112_000),
            ]),
            ..Default::default()
        };
        let result = fisher_test(&exp, &params).unwrap();
        assert_eq!(result.tests.len(), 1);
        assert_eq!(result.tests[0].start, 110_000);
    }

    #[test]
    fn fixed_width_recenters_regions() {
        let exp = two_group_experiment();
        let params = DiffParams {
            regions: Some(vec![QueryRegion::new("chr1", 110_000, 111_000)]),
            fixed_width: Some(10_000),
            ..Default::default()
        };
        let result = fisher_test(&exp, &params).unwrap();
        assert_eq!(result.tests[0].start, 105_500);
        assert_eq!(result.tests[0].end, 115_500);
    }

    #[test]
    fn low_count_filter_drops_regions() {
        let exp = two_group_experiment();
        let params = DiffParams {
            min_count: 1_200,
            ..Default::default()
        };
        // each populated bin holds 1000 combined counts, below the filter
        let err = fisher_test(&exp, &params).unwrap_err();
        assert!(matches!(err, U4cError::Empty(_)));
    }

    #[test]
    fn result_ordering() {
        let exp = two_group_experiment();
        let mut result = fisher_test(&exp, &DiffParams::default()).unwrap();

        result.sort_by_p_value();
        for w in result.tests.windows(2) {
            assert!(w[0].p_value <= w[1].p_value);
        }
        result.sort_by_position();
        for w in result.tests.windows(2) {
            assert!(w[0].start <= w[1].start);
        }
    }
}
